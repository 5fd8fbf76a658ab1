// validation.rs - Input validation utilities

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use regex::Regex;

use crate::cli::args::Args;
use crate::core::matrix::ReferenceSet;
use crate::core::metric::Metric;
use crate::data::dataset::DatasetFilter;
use crate::tools::{QdistRunner, RaxmlRunner};

const DEFAULT_QDIST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug)]
pub struct ValidationResult {
    pub data_path: PathBuf,
    pub results_dir: PathBuf,
    pub report_path: PathBuf,
    pub metrics: Vec<Metric>,
    pub ref_set: ReferenceSet,
    pub filter: DatasetFilter,
    pub qdist: Option<QdistRunner>,
    pub raxml: Option<RaxmlRunner>,
}

/// Validate all command line arguments.
///
/// Everything that can fail late is checked here instead: metric names,
/// reference set shape, filter regexes and the presence of the external
/// executables the requested stages need.
pub fn validate_args(args: &Args) -> Result<ValidationResult, String> {
    let data_path = PathBuf::from(args.data.as_ref().ok_or("--data is required")?);
    if !data_path.is_file() {
        return Err(format!(
            "Dataset table '{}' does not exist",
            data_path.display()
        ));
    }
    let results_dir = PathBuf::from(
        args.results_dir
            .as_ref()
            .ok_or("--results-dir is required")?,
    );

    // Metrics: closed set, duplicates rejected
    let metrics = match &args.metrics {
        Some(list) => {
            let mut metrics = Vec::new();
            for part in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let metric = Metric::from_str(part)?;
                if metrics.contains(&metric) {
                    return Err(format!("Metric '{}' requested twice", metric));
                }
                metrics.push(metric);
            }
            if metrics.is_empty() {
                return Err("At least one metric is required".to_string());
            }
            metrics
        }
        None => Metric::ALL.to_vec(),
    };

    let ref_set = match &args.ref_trees {
        Some(list) => ReferenceSet::new(
            list.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )?,
        None => ReferenceSet::default_roles(),
    };

    // Compile regex patterns
    let include = match &args.include_datasets {
        Some(pattern) => Some(
            Regex::new(pattern).map_err(|e| format!("Invalid include_datasets regex: {}", e))?,
        ),
        None => None,
    };
    let exclude = match &args.exclude_datasets {
        Some(pattern) => Some(
            Regex::new(pattern).map_err(|e| format!("Invalid exclude_datasets regex: {}", e))?,
        ),
        None => None,
    };
    let filter = DatasetFilter {
        include,
        exclude,
        ling_type: args.ling_type.clone(),
    };

    // The gq metric needs the external quartet tool (a dry run does not
    // invoke it and may omit it).
    let timeout = Duration::from_secs(args.qdist_timeout.unwrap_or(DEFAULT_QDIST_TIMEOUT_SECS));
    let qdist = match &args.qdist_exe {
        Some(exe) => {
            let exe = PathBuf::from(exe);
            if !exe.is_file() {
                return Err(format!(
                    "Quartet-distance executable '{}' does not exist",
                    exe.display()
                ));
            }
            Some(QdistRunner::new(exe, timeout))
        }
        None => {
            if metrics.contains(&Metric::Gq) && !args.dry_run {
                return Err("--qdist-exe is required for the gq metric".to_string());
            }
            None
        }
    };

    let raxml = match &args.raxml_exe {
        Some(exe) => {
            let exe = PathBuf::from(exe);
            if !exe.is_file() {
                return Err(format!(
                    "Tree-inference executable '{}' does not exist",
                    exe.display()
                ));
            }
            Some(RaxmlRunner::new(exe))
        }
        None => {
            if args.run_inference {
                return Err("--raxml-exe is required for the inference stage".to_string());
            }
            None
        }
    };

    let report_path = match &args.report {
        Some(path) => PathBuf::from(path),
        None => results_dir.join("distance_report.csv"),
    };

    Ok(ValidationResult {
        data_path,
        results_dir,
        report_path,
        metrics,
        ref_set,
        filter,
        qdist,
        raxml,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn base_args(data: &str) -> Args {
        Args {
            data: Some(data.to_string()),
            results_dir: Some("results".to_string()),
            qdist_exe: None,
            raxml_exe: None,
            qdist_timeout: None,
            metrics: Some("rf".to_string()),
            ref_trees: None,
            threads: None,
            include_datasets: None,
            exclude_datasets: None,
            ling_type: None,
            run_inference: false,
            force_recompute: false,
            partitioning: false,
            dry_run: false,
            report: None,
            no_report: false,
            config: None,
            generate_config: false,
        }
    }

    fn data_file(dir: &TempDir) -> String {
        let path = dir.path().join("data.csv");
        fs::write(&path, "ds_id,source,ling_type,family\n").unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let mut args = base_args(&data_file(&dir));
        args.metrics = None;
        args.dry_run = true;
        let result = validate_args(&args).unwrap();
        assert_eq!(result.metrics, vec![Metric::Rf, Metric::Gq]);
        assert_eq!(result.ref_set.len(), 5);
        assert_eq!(
            result.report_path,
            PathBuf::from("results/distance_report.csv")
        );
    }

    #[test]
    fn test_gq_requires_executable() {
        let dir = TempDir::new().unwrap();
        let mut args = base_args(&data_file(&dir));
        args.metrics = Some("rf,gq".to_string());
        let err = validate_args(&args).unwrap_err();
        assert!(err.contains("--qdist-exe"));
        // A dry run validates without the tool.
        args.dry_run = true;
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_unknown_and_duplicate_metrics() {
        let dir = TempDir::new().unwrap();
        let mut args = base_args(&data_file(&dir));
        args.metrics = Some("gqd".to_string());
        assert!(validate_args(&args).is_err());
        args.metrics = Some("rf,rf".to_string());
        assert!(validate_args(&args).unwrap_err().contains("twice"));
    }

    #[test]
    fn test_reference_set_from_args() {
        let dir = TempDir::new().unwrap();
        let mut args = base_args(&data_file(&dir));
        args.ref_trees = Some("glottolog,bin,bin_BIN+G_2".to_string());
        let result = validate_args(&args).unwrap();
        assert_eq!(result.ref_set.names().len(), 3);
        args.ref_trees = Some("bin,bin".to_string());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut args = base_args(&data_file(&dir));
        args.include_datasets = Some("(".to_string());
        assert!(validate_args(&args).unwrap_err().contains("regex"));
    }

    #[test]
    fn test_missing_inputs_are_rejected() {
        let dir = TempDir::new().unwrap();
        let args = base_args("/nonexistent/data.csv");
        assert!(validate_args(&args).is_err());
        let mut args = base_args(&data_file(&dir));
        args.run_inference = true;
        assert!(validate_args(&args).unwrap_err().contains("--raxml-exe"));
    }
}
