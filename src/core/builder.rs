// builder.rs - Triangular distance matrix construction

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use rayon::prelude::*;

use crate::core::comparator::TreeComparator;
use crate::core::matrix::{DistanceMatrix, RawMatrix, ReferenceSet};
use crate::core::metric::Metric;
use crate::core::tree::TreeSnapshot;
use crate::output::codec;

fn parse_snapshot(path: Option<&Path>) -> Option<TreeSnapshot> {
    let path = path?;
    match TreeSnapshot::from_file(path) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

/// Build the strict lower-triangular matrix for one metric over the
/// combined tree list (sampled trees first, reference trees last).
///
/// For RF every tree is parsed exactly once up front; a failed parse yields
/// an undefined snapshot that is reused for all of that tree's pairs rather
/// than re-attempted. For GQ each pair invokes the external tool directly by
/// path. Cells are independent and computed in parallel; diagonal cells stay
/// zero placeholders and are never computed.
pub fn build_matrix(
    metric: Metric,
    tree_paths: &[Option<PathBuf>],
    comparator: &TreeComparator,
) -> RawMatrix {
    let n = tree_paths.len();
    let mut matrix: RawMatrix = (0..n).map(|j| vec![Some(0.0); j + 1]).collect();
    if n < 2 {
        return matrix;
    }

    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|j| (0..j).map(move |i| (j, i)))
        .collect();
    let pb = ProgressBar::new(pairs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {per_sec} ETA: {eta}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let cells: Vec<((usize, usize), Option<f64>)> = match metric {
        Metric::Rf => {
            let snapshots: Vec<Option<TreeSnapshot>> = tree_paths
                .par_iter()
                .map(|path| parse_snapshot(path.as_deref()))
                .collect();
            pairs
                .par_iter()
                .map(|&(j, i)| {
                    let d = comparator.rf(snapshots[i].as_ref(), snapshots[j].as_ref());
                    pb.inc(1);
                    ((j, i), d)
                })
                .collect()
        }
        Metric::Gq => pairs
            .par_iter()
            .map(|&(j, i)| {
                let d = comparator.gq(tree_paths[i].as_deref(), tree_paths[j].as_deref());
                pb.inc(1);
                ((j, i), d)
            })
            .collect(),
    };
    pb.finish_and_clear();

    for ((j, i), d) in cells {
        matrix[j][i] = d;
    }
    matrix
}

fn write_all(
    dist_dir: &Path,
    tree_paths: &[Option<PathBuf>],
    metrics: &[Metric],
    comparator: &TreeComparator,
) -> Result<(), String> {
    for metric in metrics {
        let matrix = build_matrix(*metric, tree_paths, comparator);
        codec::write_matrix(dist_dir, *metric, &matrix)?;
    }
    Ok(())
}

/// Build and persist every requested metric for one dataset, then re-read
/// the persisted form so the returned view is exactly what later runs will
/// load from the cache.
///
/// Any unexpected failure removes the whole distance directory before the
/// error is returned: a half-written cache must never pass the next run's
/// cache-hit test.
pub fn generate_distances(
    dist_dir: &Path,
    sampled_tree_paths: &[Option<PathBuf>],
    ref_tree_paths: &[Option<PathBuf>],
    ref_set: &ReferenceSet,
    metrics: &[Metric],
    comparator: &TreeComparator,
) -> Result<DistanceMatrix, String> {
    if ref_tree_paths.len() != ref_set.len() {
        return Err(format!(
            "{} reference tree paths given for {} configured reference trees",
            ref_tree_paths.len(),
            ref_set.len()
        ));
    }
    let mut tree_paths: Vec<Option<PathBuf>> = sampled_tree_paths.to_vec();
    tree_paths.extend(ref_tree_paths.iter().cloned());

    if let Err(e) = write_all(dist_dir, &tree_paths, metrics, comparator) {
        if dist_dir.is_dir() {
            let _ = fs::remove_dir_all(dist_dir);
        }
        return Err(e);
    }
    DistanceMatrix::from_dir(dist_dir, metrics, ref_set.clone())
}

/// Cache-hit test for one dataset: every requested metric's matrix file is
/// present. Partial presence counts as a miss and triggers a full rebuild.
pub fn cache_complete(dist_dir: &Path, metrics: &[Metric]) -> bool {
    !metrics.is_empty()
        && metrics
            .iter()
            .all(|metric| codec::matrix_path(dist_dir, *metric).is_file())
}
