// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};

impl Args {
    /// Merge with configuration from file.
    /// CLI arguments take precedence over config file values.
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.data.is_none() {
            self.data = config.data;
        }
        if self.results_dir.is_none() {
            self.results_dir = config.results_dir;
        }
        if self.report.is_none() {
            self.report = config.report;
        }

        // External tools
        if self.qdist_exe.is_none() {
            self.qdist_exe = config.qdist_exe;
        }
        if self.raxml_exe.is_none() {
            self.raxml_exe = config.raxml_exe;
        }
        if self.qdist_timeout.is_none() {
            self.qdist_timeout = config.qdist_timeout;
        }

        // Matrix layout (lists are comma-joined into the CLI representation)
        if self.metrics.is_none() {
            self.metrics = config.metrics.map(|m| m.join(","));
        }
        if self.ref_trees.is_none() {
            self.ref_trees = config.ref_trees.map(|r| r.join(","));
        }

        // Performance
        if self.threads.is_none() {
            self.threads = config.threads;
        }

        // Dataset filtering
        if self.include_datasets.is_none() {
            self.include_datasets = config.include_datasets;
        }
        if self.exclude_datasets.is_none() {
            self.exclude_datasets = config.exclude_datasets;
        }
        if self.ling_type.is_none() {
            self.ling_type = config.ling_type;
        }

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.run_inference && config.run_inference.unwrap_or(false) {
            self.run_inference = true;
        }
        if !self.force_recompute && config.force_recompute.unwrap_or(false) {
            self.force_recompute = true;
        }
        if !self.partitioning && config.partitioning.unwrap_or(false) {
            self.partitioning = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }
        if !self.no_report && config.no_report.unwrap_or(false) {
            self.no_report = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}
