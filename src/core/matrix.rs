// matrix.rs - Combined-index addressing and the distance matrix query layer

use std::collections::HashMap;
use std::path::Path;

use crate::core::metric::Metric;
use crate::output::codec;

/// Raw triangular storage: row `j` holds columns `0..=j`; `None` marks an
/// undefined distance. The diagonal cell of each row is a placeholder, never
/// a self-distance.
pub type RawMatrix = Vec<Vec<Option<f64>>>;

/// Identifier of a tree in the combined index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeId<'a> {
    /// A sampled inference replicate, 0-based in sampling order.
    Sampled(usize),
    /// A named reference tree from the configured reference set.
    Reference(&'a str),
}

/// Ordered, validated set of reference tree names.
///
/// The i-th name (configured order) occupies signed slot `i - N`, which
/// places the references on the last `N` rows of the combined index space
/// once the sampled count is known. Names are validated here, at
/// configuration load, so an unknown name cannot silently address a wrong
/// cell at query time.
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    names: Vec<String>,
}

impl ReferenceSet {
    pub fn new(names: Vec<String>) -> Result<Self, String> {
        if names.is_empty() {
            return Err("Reference set must contain at least one tree name".to_string());
        }
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(format!("Reference tree name at position {} is empty", i));
            }
            if names[..i].contains(name) {
                return Err(format!("Duplicate reference tree name '{}'", name));
            }
        }
        Ok(Self { names })
    }

    /// The reference roles of the synonym-sampling experiment.
    pub fn default_roles() -> Self {
        Self {
            names: ["glottolog", "bin", "catg_bin", "catg_multi", "consensus"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Position of a name in configured order.
    pub fn rank(&self, name: &str) -> Result<usize, String> {
        self.names.iter().position(|n| n == name).ok_or_else(|| {
            format!(
                "Unknown reference tree '{}'. Configured: {}",
                name,
                self.names.join(", ")
            )
        })
    }

    /// Signed slot of a name: `rank - N`, always negative.
    pub fn slot(&self, name: &str) -> Result<i64, String> {
        Ok(self.rank(name)? as i64 - self.names.len() as i64)
    }
}

/// Read-only query layer over the per-metric triangular matrices of one
/// dataset.
///
/// The sampled count is inferred from the matrix shape (`rows - N`), so a
/// matrix persisted under a different reference configuration surfaces as a
/// structural error instead of silently wrong lookups.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    matrices: HashMap<Metric, RawMatrix>,
    ref_set: ReferenceSet,
    num_sampled: usize,
}

impl DistanceMatrix {
    /// Load every requested metric from a distance directory.
    pub fn from_dir(
        dist_dir: &Path,
        metrics: &[Metric],
        ref_set: ReferenceSet,
    ) -> Result<Self, String> {
        let mut matrices = HashMap::new();
        for metric in metrics {
            matrices.insert(*metric, codec::read_matrix(dist_dir, *metric)?);
        }
        Self::from_raw(matrices, ref_set)
    }

    /// Wrap already decoded raw matrices.
    pub fn from_raw(
        matrices: HashMap<Metric, RawMatrix>,
        ref_set: ReferenceSet,
    ) -> Result<Self, String> {
        let mut row_counts = matrices.iter().map(|(m, matrix)| (*m, matrix.len()));
        let (_, rows) = row_counts
            .next()
            .ok_or("At least one distance matrix is required")?;
        if let Some((metric, other)) = row_counts.find(|(_, r)| *r != rows) {
            return Err(format!(
                "Distance matrices disagree on row count: metric '{}' has {} rows, expected {}",
                metric, other, rows
            ));
        }
        for (metric, matrix) in &matrices {
            for (j, row) in matrix.iter().enumerate() {
                if row.len() != j + 1 {
                    return Err(format!(
                        "Matrix for metric '{}' is not lower-triangular: row {} has {} cells, expected {}",
                        metric,
                        j,
                        row.len(),
                        j + 1
                    ));
                }
            }
        }
        if rows < ref_set.len() {
            return Err(format!(
                "Distance matrix has {} rows but the reference set alone needs {}",
                rows,
                ref_set.len()
            ));
        }
        Ok(Self {
            num_sampled: rows - ref_set.len(),
            matrices,
            ref_set,
        })
    }

    pub fn num_sampled(&self) -> usize {
        self.num_sampled
    }

    pub fn reference_set(&self) -> &ReferenceSet {
        &self.ref_set
    }

    fn raw(&self, metric: Metric) -> Result<&RawMatrix, String> {
        self.matrices
            .get(&metric)
            .ok_or_else(|| format!("Metric '{}' is not loaded", metric))
    }

    /// Absolute row index of an identifier: sampled trees occupy rows
    /// `0..S-1`, reference trees the final `N` rows via their negative
    /// slots.
    fn absolute_index(&self, id: TreeId) -> Result<usize, String> {
        match id {
            TreeId::Sampled(i) if i < self.num_sampled => Ok(i),
            TreeId::Sampled(i) => Err(format!(
                "Sampled tree index {} out of range ({} sampled trees)",
                i, self.num_sampled
            )),
            TreeId::Reference(name) => {
                let slot = self.ref_set.slot(name)?;
                let rows = (self.num_sampled + self.ref_set.len()) as i64;
                Ok((rows + slot) as usize)
            }
        }
    }

    /// Distance between two distinct trees; `(max, min)` of the absolute
    /// indices addresses the single stored cell.
    pub fn pair_distance(
        &self,
        metric: Metric,
        id1: TreeId,
        id2: TreeId,
    ) -> Result<Option<f64>, String> {
        let a = self.absolute_index(id1)?;
        let b = self.absolute_index(id2)?;
        if a == b {
            return Err("Self-distances are not stored in the matrix".to_string());
        }
        Ok(self.raw(metric)?[a.max(b)][a.min(b)])
    }

    pub fn reference_distance(
        &self,
        ref_a: &str,
        ref_b: &str,
        metric: Metric,
    ) -> Result<Option<f64>, String> {
        self.pair_distance(metric, TreeId::Reference(ref_a), TreeId::Reference(ref_b))
    }

    /// Distances from a named reference tree to every sampled tree, in
    /// sampling order. The vector length must match the sampled count; a
    /// mismatch means the persisted matrix was built under a different
    /// configuration and processing of this dataset must stop.
    pub fn reference_vector(&self, name: &str, metric: Metric) -> Result<Vec<Option<f64>>, String> {
        let rank = self.ref_set.rank(name)?;
        let row_idx = self.absolute_index(TreeId::Reference(name))?;
        let row = &self.raw(metric)?[row_idx];
        let keep = row.len().saturating_sub(rank + 1);
        let vector = row[..keep].to_vec();
        if vector.len() != self.num_sampled {
            return Err(format!(
                "Reference vector for '{}' has {} entries but {} sampled trees are expected: cached matrix does not match the current configuration",
                name,
                vector.len(),
                self.num_sampled
            ));
        }
        Ok(vector)
    }

    pub fn avg_reference_distance(&self, name: &str, metric: Metric) -> Result<Option<f64>, String> {
        Ok(mean_defined(&self.reference_vector(name, metric)?))
    }

    pub fn max_reference_distance(&self, name: &str, metric: Metric) -> Result<Option<f64>, String> {
        Ok(max_defined(&self.reference_vector(name, metric)?))
    }

    /// For each sampled tree, the average distance to every *other* sampled
    /// tree; `None` where no other sampled tree has a defined distance.
    pub fn sampled_pairwise_averages(&self, metric: Metric) -> Result<Vec<Option<f64>>, String> {
        let raw = self.raw(metric)?;
        let mut averages = Vec::with_capacity(self.num_sampled);
        for i in 0..self.num_sampled {
            let dists: Vec<f64> = (0..self.num_sampled)
                .filter(|&j| j != i)
                .filter_map(|j| raw[i.max(j)][i.min(j)])
                .collect();
            averages.push(if dists.is_empty() {
                None
            } else {
                Some(dists.iter().sum::<f64>() / dists.len() as f64)
            });
        }
        Ok(averages)
    }

    pub fn sampled_avg_of_averages(&self, metric: Metric) -> Result<Option<f64>, String> {
        Ok(mean_defined(&self.sampled_pairwise_averages(metric)?))
    }

    pub fn sampled_max_of_averages(&self, metric: Metric) -> Result<Option<f64>, String> {
        Ok(max_defined(&self.sampled_pairwise_averages(metric)?))
    }
}

/// Mean of the defined entries, `None` when every entry is undefined.
fn mean_defined(values: &[Option<f64>]) -> Option<f64> {
    let defined: Vec<f64> = values.iter().flatten().copied().collect();
    if defined.is_empty() {
        None
    } else {
        Some(defined.iter().sum::<f64>() / defined.len() as f64)
    }
}

/// Maximum of the defined entries, `None` when every entry is undefined.
fn max_defined(values: &[Option<f64>]) -> Option<f64> {
    values
        .iter()
        .flatten()
        .copied()
        .fold(None, |acc: Option<f64>, v| match acc {
            Some(a) => Some(a.max(v)),
            None => Some(v),
        })
}
