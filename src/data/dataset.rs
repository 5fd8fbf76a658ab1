// dataset.rs - Dataset table loading and filtering

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Deserializer};

/// One dataset of the experiment: identity columns plus the file paths the
/// pipeline consumes. Path columns may be empty in the table; an absent
/// path simply yields undefined distances downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetRow {
    pub ds_id: String,
    pub source: String,
    pub ling_type: String,
    pub family: String,
    /// Gold-standard taxonomy tree, when one exists for this family.
    #[serde(default)]
    pub glottolog_tree_path: Option<PathBuf>,
    /// Binary-coded alignment.
    #[serde(default)]
    pub msa_bin: Option<PathBuf>,
    /// Categorical alignment over the binary coding.
    #[serde(default)]
    pub msa_catg_bin: Option<PathBuf>,
    /// Categorical alignment over the multi-state coding.
    #[serde(default)]
    pub msa_catg_multi: Option<PathBuf>,
    /// Substitution model for the multi-state coding (e.g. `MULTI8_MK`).
    #[serde(default)]
    pub multi_model: Option<String>,
    /// Resampled synonym-subset alignments, `;`-separated in the table;
    /// list order defines the sampled tree indices.
    #[serde(default, deserialize_with = "semicolon_paths")]
    pub sampled_msa_paths: Vec<PathBuf>,
}

fn semicolon_paths<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Row filter: regex include/exclude on `ds_id` plus an optional exact
/// `ling_type` restriction.
#[derive(Debug, Default)]
pub struct DatasetFilter {
    pub include: Option<Regex>,
    pub exclude: Option<Regex>,
    pub ling_type: Option<String>,
}

impl DatasetFilter {
    pub fn matches(&self, row: &DatasetRow) -> bool {
        if let Some(re) = &self.include {
            if !re.is_match(&row.ds_id) {
                return false;
            }
        }
        if let Some(re) = &self.exclude {
            if re.is_match(&row.ds_id) {
                return false;
            }
        }
        if let Some(ling_type) = &self.ling_type {
            if &row.ling_type != ling_type {
                return false;
            }
        }
        true
    }
}

/// The full dataset table, loaded from CSV.
#[derive(Debug, Clone)]
pub struct DatasetTable {
    pub rows: Vec<DatasetRow>,
}

impl DatasetTable {
    pub fn from_csv(path: &Path) -> Result<Self, String> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| format!("Failed to open dataset table '{}': {}", path.display(), e))?;
        let mut rows = Vec::new();
        for (i, record) in reader.deserialize().enumerate() {
            let row: DatasetRow = record.map_err(|e| {
                format!(
                    "Invalid dataset row {} in '{}': {}",
                    i + 2,
                    path.display(),
                    e
                )
            })?;
            rows.push(row);
        }
        Ok(Self { rows })
    }

    pub fn filtered(self, filter: &DatasetFilter) -> Self {
        Self {
            rows: self
                .rows
                .into_iter()
                .filter(|row| filter.matches(row))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const TABLE: &str = "\
ds_id,source,ling_type,family,glottolog_tree_path,msa_bin,msa_catg_bin,msa_catg_multi,multi_model,sampled_msa_paths
bodtkhobwa,lexibank,cognate,sinotibetan,trees/bodtkhobwa.tre,msa/bin.phy,msa/catg_bin.phy,msa/catg_multi.phy,MULTI8_MK,msa/s0.phy;msa/s1.phy;msa/s2.phy
iecor,other,cognate,indoeuropean,,msa/ie_bin.phy,,,MULTI64_MK,msa/ie_s0.phy
walworth,lexibank,sound,austronesian,trees/walworth.tre,msa/w_bin.phy,,,,
";

    fn table() -> DatasetTable {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, TABLE).unwrap();
        DatasetTable::from_csv(&path).unwrap()
    }

    #[test]
    fn test_load_rows_and_paths() {
        let table = table();
        assert_eq!(table.len(), 3);
        let row = &table.rows[0];
        assert_eq!(row.ds_id, "bodtkhobwa");
        assert_eq!(
            row.glottolog_tree_path,
            Some(PathBuf::from("trees/bodtkhobwa.tre"))
        );
        assert_eq!(row.multi_model.as_deref(), Some("MULTI8_MK"));
        assert_eq!(row.sampled_msa_paths.len(), 3);
        assert_eq!(row.sampled_msa_paths[1], PathBuf::from("msa/s1.phy"));
    }

    #[test]
    fn test_empty_fields_are_absent() {
        let table = table();
        let row = &table.rows[1];
        assert_eq!(row.glottolog_tree_path, None);
        assert_eq!(row.msa_catg_bin, None);
        assert_eq!(row.sampled_msa_paths.len(), 1);
        assert!(table.rows[2].sampled_msa_paths.is_empty());
    }

    #[test]
    fn test_filtering() {
        let filter = DatasetFilter {
            include: None,
            exclude: Some(Regex::new("^iecor$").unwrap()),
            ling_type: Some("cognate".to_string()),
        };
        let table = table().filtered(&filter);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].ds_id, "bodtkhobwa");
    }

    #[test]
    fn test_missing_table_is_an_error() {
        assert!(DatasetTable::from_csv(Path::new("/nonexistent/data.csv")).is_err());
    }
}
