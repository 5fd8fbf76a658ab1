// comparator.rs - Pairwise tree comparison for one metric

use std::path::Path;

use crate::core::tree::{rf_distance, TreeSnapshot};
use crate::tools::QdistRunner;

/// Computes a single scalar distance between two trees.
///
/// Undefined inputs (failed parses, missing paths) and undefined results
/// (degenerate topologies, external-tool failures) are `None` values, never
/// errors: they propagate through the matrix and are filtered out of every
/// aggregate downstream. The external quartet tool configuration is injected
/// at construction time; without one, every GQ distance is undefined.
#[derive(Debug, Clone)]
pub struct TreeComparator {
    qdist: Option<QdistRunner>,
}

impl TreeComparator {
    pub fn new(qdist: Option<QdistRunner>) -> Self {
        Self { qdist }
    }

    /// Normalized RF distance between two pre-parsed topologies.
    pub fn rf(&self, a: Option<&TreeSnapshot>, b: Option<&TreeSnapshot>) -> Option<f64> {
        rf_distance(a?, b?)
    }

    /// GQ distance between two tree files: `1 - q` for the
    /// quartet-agreement fraction `q` reported by the external tool.
    pub fn gq(&self, a: Option<&Path>, b: Option<&Path>) -> Option<f64> {
        let q = self.qdist.as_ref()?.quartet_agreement(a?, b?)?;
        Some(1.0 - q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn comparator() -> TreeComparator {
        TreeComparator::new(Some(QdistRunner::new(
            PathBuf::from("/nonexistent/qdist"),
            Duration::from_secs(5),
        )))
    }

    #[test]
    fn test_rf_undefined_inputs_propagate() {
        let c = comparator();
        let snapshot = TreeSnapshot::from_newick("((a,b),(c,d));").unwrap();
        assert_eq!(c.rf(None, Some(&snapshot)), None);
        assert_eq!(c.rf(Some(&snapshot), None), None);
        assert_eq!(c.rf(None, None), None);
    }

    #[test]
    fn test_rf_defined_inputs() {
        let c = comparator();
        let a = TreeSnapshot::from_newick("((a,b),(c,d));").unwrap();
        let b = TreeSnapshot::from_newick("((a,c),(b,d));").unwrap();
        assert_eq!(c.rf(Some(&a), Some(&b)), Some(1.0));
    }

    #[test]
    fn test_gq_undefined_paths_propagate() {
        let c = comparator();
        let path = PathBuf::from("tree.nwk");
        assert_eq!(c.gq(None, Some(&path)), None);
        assert_eq!(c.gq(Some(&path), None), None);
    }

    #[test]
    fn test_gq_without_tool_is_undefined() {
        let c = TreeComparator::new(None);
        let path = PathBuf::from("tree.nwk");
        assert_eq!(c.gq(Some(&path), Some(&path)), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_gq_is_one_minus_agreement() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::TempDir::new().unwrap();
        let exe = dir.path().join("qdist.sh");
        // Tool reporting a quartet agreement of 0.8 on line 2.
        std::fs::write(&exe, "#!/bin/sh\nprintf 'h\\n12\\t495\\t0.8\\t99\\t0\\n'\n").unwrap();
        let mut perms = std::fs::metadata(&exe).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&exe, perms).unwrap();

        let c = TreeComparator::new(Some(QdistRunner::new(exe, Duration::from_secs(10))));
        let path = PathBuf::from("tree.nwk");
        let d = c.gq(Some(&path), Some(&path)).unwrap();
        assert!((d - 0.2).abs() < 1e-12);
    }
}
