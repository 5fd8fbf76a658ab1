// raxml.rs - External tree-inference tool invocation and log scraping

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::warn;

use crate::core::tree::{rf_distance, TreeSnapshot};

fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", prefix.display(), suffix))
}

/// Best ML tree produced by an inference run with the given prefix.
pub fn best_tree_path(prefix: &Path) -> PathBuf {
    suffixed(prefix, ".raxml.bestTree")
}

/// All ML replicate trees of an inference run, one Newick line each.
pub fn ml_trees_path(prefix: &Path) -> PathBuf {
    suffixed(prefix, ".raxml.mlTrees")
}

/// Majority-rule consensus tree of a `--consense` run.
pub fn consensus_tree_path(prefix: &Path) -> PathBuf {
    suffixed(prefix, ".raxml.consensusTreeMR")
}

pub fn log_path(prefix: &Path) -> PathBuf {
    suffixed(prefix, ".raxml.log")
}

/// Runner for the external tree-inference executable (raxml-ng style).
///
/// A run whose best tree (or consensus tree) already exists at the prefix is
/// left to the tool's own refuse-to-overwrite behavior; `--redo` is added
/// only when the expected output is missing, which makes re-invocations of
/// the pipeline idempotent.
#[derive(Debug, Clone)]
pub struct RaxmlRunner {
    exe_path: PathBuf,
}

impl RaxmlRunner {
    pub fn new(exe_path: PathBuf) -> Self {
        Self { exe_path }
    }

    /// Run one tree inference over an MSA file.
    ///
    /// A failed run is logged but not an error: the missing best-tree file
    /// surfaces downstream as an undefined distance, like any other missing
    /// input.
    pub fn run_inference(
        &self,
        msa_path: &Path,
        model: &str,
        prefix: &Path,
        extra_args: &[&str],
    ) -> Result<(), String> {
        if !msa_path.is_file() {
            return Err(format!("MSA '{}' does not exist", msa_path.display()));
        }
        if let Some(dir) = prefix.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create run directory '{}': {}", dir.display(), e))?;
        }
        let mut cmd = Command::new(&self.exe_path);
        cmd.arg("--msa")
            .arg(msa_path)
            .arg("--model")
            .arg(model)
            .arg("--prefix")
            .arg(prefix)
            .arg("--threads")
            .arg("auto")
            .arg("--seed")
            .arg("2");
        cmd.args(extra_args);
        if !best_tree_path(prefix).is_file() {
            cmd.arg("--redo");
        }
        let status = cmd
            .status()
            .map_err(|e| format!("Failed to run '{}': {}", self.exe_path.display(), e))?;
        if !status.success() {
            warn!(
                "Inference run '{}' exited with {}",
                prefix.display(),
                status
            );
        }
        Ok(())
    }

    /// Build the majority-rule consensus over the best trees of the given
    /// run prefixes. Prefixes whose best tree is missing are skipped.
    ///
    /// The concatenated tree list goes through a uniquely named temporary
    /// file, so concurrent consensus runs cannot clobber each other's input.
    pub fn consense_tree(
        &self,
        prefixes: &[PathBuf],
        prefix: &Path,
        extra_args: &[&str],
    ) -> Result<(), String> {
        if let Some(dir) = prefix.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create run directory '{}': {}", dir.display(), e))?;
        }
        let mut trees_file = tempfile::Builder::new()
            .prefix("consense_trees_")
            .suffix(".nw")
            .tempfile()
            .map_err(|e| format!("Failed to create temporary tree list: {}", e))?;
        for run_prefix in prefixes {
            let tree_path = best_tree_path(run_prefix);
            if !tree_path.is_file() {
                warn!(
                    "Skipping missing best tree '{}' for consensus",
                    tree_path.display()
                );
                continue;
            }
            let newick = fs::read_to_string(&tree_path)
                .map_err(|e| format!("Failed to read '{}': {}", tree_path.display(), e))?;
            trees_file
                .write_all(newick.as_bytes())
                .map_err(|e| format!("Failed to write temporary tree list: {}", e))?;
        }
        trees_file
            .flush()
            .map_err(|e| format!("Failed to flush temporary tree list: {}", e))?;

        let mut cmd = Command::new(&self.exe_path);
        cmd.arg("--consense")
            .arg("--tree")
            .arg(trees_file.path())
            .arg("--prefix")
            .arg(prefix);
        cmd.args(extra_args);
        if !consensus_tree_path(prefix).is_file() {
            cmd.arg("--redo");
        }
        let status = cmd
            .status()
            .map_err(|e| format!("Failed to run '{}': {}", self.exe_path.display(), e))?;
        if !status.success() {
            warn!(
                "Consensus run '{}' exited with {}",
                prefix.display(),
                status
            );
        }
        Ok(())
    }
}

/// Alpha parameter of the rate-heterogeneity model, scraped from the run
/// log. The log line looks like:
/// `   Rate heterogeneity: GAMMA (4 cats, mean),  alpha: 0.433159 (ML),  ...`
pub fn alpha(prefix: &Path) -> Option<f64> {
    let content = fs::read_to_string(log_path(prefix)).ok()?;
    for line in content.lines() {
        if line.starts_with("   Rate heterogeneity:") {
            return line.split(",  ").nth(1)?.split(' ').nth(1)?.parse().ok();
        }
    }
    None
}

/// Base frequencies scraped from the run log, empty when the line is
/// absent. The log line looks like:
/// `   Base frequencies (ML): 0.288442 0.711558 `
pub fn base_frequencies(prefix: &Path) -> Vec<f64> {
    let content = match fs::read_to_string(log_path(prefix)) {
        Ok(content) => content,
        Err(_) => return Vec::new(),
    };
    for line in content.lines() {
        if line.starts_with("   Base frequencies") {
            return line
                .split(": ")
                .nth(1)
                .map(|rest| {
                    rest.split_whitespace()
                        .filter_map(|part| part.parse().ok())
                        .collect()
                })
                .unwrap_or_default();
        }
    }
    Vec::new()
}

/// Mean pairwise RF distance over the ML replicate trees of one run:
/// a cheap stability signal for the inference. `None` when the replicate
/// file is missing or no pair has a defined distance.
pub fn avg_ml_tree_dist(prefix: &Path) -> Option<f64> {
    let path = ml_trees_path(prefix);
    let content = fs::read_to_string(&path).ok()?;
    let snapshots: Vec<TreeSnapshot> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match TreeSnapshot::from_newick(line) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Skipping malformed replicate tree in '{}': {}", path.display(), e);
                None
            }
        })
        .collect();
    let mut dists = Vec::new();
    for i in 0..snapshots.len() {
        for j in i + 1..snapshots.len() {
            if let Some(d) = rf_distance(&snapshots[i], &snapshots[j]) {
                dists.push(d);
            }
        }
    }
    if dists.is_empty() {
        return None;
    }
    Some(dists.iter().sum::<f64>() / dists.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prefix_suffixes() {
        let prefix = Path::new("/results/raxmlng/ds1/bin");
        assert_eq!(
            best_tree_path(prefix),
            PathBuf::from("/results/raxmlng/ds1/bin.raxml.bestTree")
        );
        assert_eq!(
            ml_trees_path(prefix),
            PathBuf::from("/results/raxmlng/ds1/bin.raxml.mlTrees")
        );
        assert_eq!(
            consensus_tree_path(prefix),
            PathBuf::from("/results/raxmlng/ds1/bin.raxml.consensusTreeMR")
        );
    }

    #[test]
    fn test_alpha_from_log() {
        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join("bin");
        let log = "Analysis started\n   Rate heterogeneity: GAMMA (4 cats, mean),  alpha: 0.433159 (ML),  weights&rates: (0.25,0.021)\n   Base frequencies (ML): 0.288442 0.711558 \n";
        fs::write(log_path(&prefix), log).unwrap();
        assert_eq!(alpha(&prefix), Some(0.433159));
        assert_eq!(base_frequencies(&prefix), vec![0.288442, 0.711558]);
    }

    #[test]
    fn test_missing_log_lines() {
        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join("bin");
        fs::write(log_path(&prefix), "Analysis started\n").unwrap();
        assert_eq!(alpha(&prefix), None);
        assert!(base_frequencies(&prefix).is_empty());
        // No log file at all behaves the same.
        let absent = dir.path().join("absent");
        assert_eq!(alpha(&absent), None);
        assert!(base_frequencies(&absent).is_empty());
    }

    #[test]
    fn test_avg_ml_tree_dist() {
        let dir = TempDir::new().unwrap();
        let prefix = dir.path().join("bin");
        // Two identical topologies and one conflicting quartet: pairwise
        // distances 0, 1, 1.
        let trees = "((a,b),(c,d));\n((a,b),(c,d));\n((a,c),(b,d));\n";
        fs::write(ml_trees_path(&prefix), trees).unwrap();
        let avg = avg_ml_tree_dist(&prefix).unwrap();
        assert!((avg - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_avg_ml_tree_dist_missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(avg_ml_tree_dist(&dir.path().join("bin")), None);
    }

    #[test]
    fn test_run_inference_requires_msa() {
        let runner = RaxmlRunner::new(PathBuf::from("/nonexistent/raxml-ng"));
        let err = runner
            .run_inference(Path::new("/nonexistent/msa.phy"), "BIN+G", Path::new("/tmp/x"), &[])
            .unwrap_err();
        assert!(err.contains("does not exist"));
    }
}
