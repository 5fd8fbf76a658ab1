// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub data: Option<String>,
    pub results_dir: Option<String>,
    pub report: Option<String>,

    // External tools
    pub qdist_exe: Option<String>,
    pub raxml_exe: Option<String>,
    pub qdist_timeout: Option<u64>,

    // Matrix layout
    pub metrics: Option<Vec<String>>,
    pub ref_trees: Option<Vec<String>>,

    // Performance
    pub threads: Option<usize>,

    // Dataset filtering
    pub include_datasets: Option<String>,
    pub exclude_datasets: Option<String>,
    pub ling_type: Option<String>,

    // Flags
    pub run_inference: Option<bool>,
    pub force_recompute: Option<bool>,
    pub partitioning: Option<bool>,
    pub dry_run: Option<bool>,
    pub no_report: Option<bool>,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        println!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# lingdist.toml - Configuration file for lingdist
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Path to the dataset table (.csv)
data = "data/lingdata/datasets.csv"

# Results directory root
results_dir = "data/results"

# Report output file (omit for <results_dir>/distance_report.csv)
# report = "data/results/distance_report.csv"

# =============================================================================
# EXTERNAL TOOLS
# =============================================================================

# Path to the quartet-distance executable (required for the gq metric)
qdist_exe = "bin/qdist"

# Path to the tree-inference executable (required for the inference stage)
raxml_exe = "bin/raxml-ng"

# Timeout for one quartet-distance invocation, in seconds
qdist_timeout = 300

# =============================================================================
# MATRIX LAYOUT
# =============================================================================

# Metrics to compute; one persisted matrix file per metric
metrics = ["rf", "gq"]

# Reference tree names, in matrix order. The partitioning variant of the
# experiment configures a different list here.
ref_trees = ["glottolog", "bin", "catg_bin", "catg_multi", "consensus"]

# =============================================================================
# PERFORMANCE
# =============================================================================

# Number of threads (omit for auto-detection)
# threads = 16

# =============================================================================
# DATASET FILTERING
# =============================================================================

# Include only datasets whose ds_id matches regex pattern
# include_datasets = "bodt.*"

# Exclude datasets whose ds_id matches regex pattern
# exclude_datasets = "iecor"

# Restrict to datasets with this ling_type
ling_type = "cognate"

# =============================================================================
# FLAGS
# =============================================================================

# Run the external inference and consensus stage before computing distances
run_inference = false

# Recompute distance matrices even when cached files exist
force_recompute = false

# Use the partitioning-variant distances subtree
partitioning = false

# Validate inputs without computation
dry_run = false

# Skip report generation
no_report = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        assert_eq!(
            config.metrics,
            Some(vec!["rf".to_string(), "gq".to_string()])
        );
        assert_eq!(config.ling_type.as_deref(), Some("cognate"));
        assert_eq!(config.run_inference, Some(false));
    }
}
