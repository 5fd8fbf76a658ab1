// layout.rs - Results directory conventions

use std::path::{Path, PathBuf};

use crate::data::dataset::DatasetRow;

/// Directory key of one dataset: `<ds_id>_<source>_<ling_type>_<family>`.
pub fn dataset_key(row: &DatasetRow) -> String {
    format!(
        "{}_{}_{}_{}",
        row.ds_id, row.source, row.ling_type, row.family
    )
}

/// Prefix of one external-tool run: `<results>/<experiment>/<key>/<run>`.
/// The run component may contain subdirectories (e.g. `sampled/sampled3`).
pub fn run_prefix(results_dir: &Path, row: &DatasetRow, experiment: &str, run: &str) -> PathBuf {
    results_dir.join(experiment).join(dataset_key(row)).join(run)
}

/// Distance matrix directory of one dataset.
pub fn dist_dir(results_dir: &Path, row: &DatasetRow) -> PathBuf {
    results_dir.join("distances").join(dataset_key(row))
}

/// Distance matrix directory of one dataset in the partitioning-model
/// variant of the experiment; structurally identical to `dist_dir`.
pub fn dist_dir_partitioning(results_dir: &Path, row: &DatasetRow) -> PathBuf {
    results_dir.join("distances_partitioning").join(dataset_key(row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> DatasetRow {
        DatasetRow {
            ds_id: "bodtkhobwa".into(),
            source: "lexibank".into(),
            ling_type: "cognate".into(),
            family: "sinotibetan".into(),
            glottolog_tree_path: None,
            msa_bin: None,
            msa_catg_bin: None,
            msa_catg_multi: None,
            multi_model: None,
            sampled_msa_paths: Vec::new(),
        }
    }

    #[test]
    fn test_dataset_key() {
        assert_eq!(dataset_key(&row()), "bodtkhobwa_lexibank_cognate_sinotibetan");
    }

    #[test]
    fn test_directory_layout() {
        let results = Path::new("data/results");
        let row = row();
        assert_eq!(
            run_prefix(results, &row, "raxmlng", "sampled/sampled3"),
            PathBuf::from("data/results/raxmlng/bodtkhobwa_lexibank_cognate_sinotibetan/sampled/sampled3")
        );
        assert_eq!(
            dist_dir(results, &row),
            PathBuf::from("data/results/distances/bodtkhobwa_lexibank_cognate_sinotibetan")
        );
        assert_eq!(
            dist_dir_partitioning(results, &row),
            PathBuf::from("data/results/distances_partitioning/bodtkhobwa_lexibank_cognate_sinotibetan")
        );
    }
}
