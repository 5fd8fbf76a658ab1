// tree.rs - Tree topology snapshots and Robinson-Foulds distance

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use phylotree::tree::Tree;

/// Topology snapshot used for RF comparisons: the leaf label set plus the
/// leaf set found below every internal edge.
///
/// Branch lengths and internal labels are irrelevant for topological RF and
/// are discarded at construction time. The snapshot is immutable and cheap
/// to compare repeatedly, so one tree parsed once can be reused across all
/// of its pairwise comparisons.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    leaves: HashSet<String>,
    clades: Vec<HashSet<String>>,
}

impl TreeSnapshot {
    /// Parse a single Newick string into a snapshot.
    pub fn from_newick(newick: &str) -> Result<Self, String> {
        let tree = Tree::from_newick(newick.trim())
            .map_err(|e| format!("Failed to parse Newick string: {}", e))?;
        Self::from_tree(&tree)
    }

    /// Read a tree file (first non-empty line is the Newick string).
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read tree file '{}': {}", path.display(), e))?;
        let line = content
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| format!("Tree file '{}' is empty", path.display()))?;
        Self::from_newick(line)
    }

    /// Build a snapshot from an already parsed tree.
    pub fn from_tree(tree: &Tree) -> Result<Self, String> {
        let root = tree
            .get_root()
            .map_err(|e| format!("Tree has no root: {}", e))?;
        let mut clades = Vec::new();
        let leaves = collect_clades(tree, root, &mut clades)?;
        if leaves.len() != tree.get_leaves().len() {
            return Err("Tree contains duplicate leaf labels".to_string());
        }
        // The root clade (and any unary chain repeating it) carries no split.
        clades.retain(|c| c.len() < leaves.len());
        Ok(Self { leaves, clades })
    }

    pub fn num_leaves(&self) -> usize {
        self.leaves.len()
    }

    /// Bipartitions of the given common leaf set induced by this tree's
    /// internal edges, trivial splits discarded, each split canonicalized to
    /// the sorted side that does not contain leaf index 0.
    fn restricted_splits(&self, index: &HashMap<&str, u32>, n: usize) -> HashSet<Vec<u32>> {
        let mut splits = HashSet::new();
        for clade in &self.clades {
            let mut side: Vec<u32> = clade
                .iter()
                .filter_map(|name| index.get(name.as_str()).copied())
                .collect();
            side.sort_unstable();
            if side.first() == Some(&0) {
                let members: HashSet<u32> = side.iter().copied().collect();
                side = (0..n as u32).filter(|i| !members.contains(i)).collect();
            }
            let k = side.len();
            if k < 2 || n - k < 2 {
                continue;
            }
            splits.insert(side);
        }
        splits
    }
}

/// Depth-first clade collection: returns the leaf set below `node_id` and
/// records it for every internal node on the way up.
fn collect_clades(
    tree: &Tree,
    node_id: usize,
    clades: &mut Vec<HashSet<String>>,
) -> Result<HashSet<String>, String> {
    let node = tree
        .get(&node_id)
        .map_err(|e| format!("Inconsistent tree structure: {}", e))?;
    if node.children.is_empty() {
        let name = node
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| "Tree contains an unnamed leaf".to_string())?;
        let mut set = HashSet::with_capacity(1);
        set.insert(name);
        return Ok(set);
    }
    let mut agg = HashSet::new();
    for &child in &node.children {
        agg.extend(collect_clades(tree, child, clades)?);
    }
    clades.push(agg.clone());
    Ok(agg)
}

/// Normalized unrooted Robinson-Foulds distance between two snapshots.
///
/// Both trees are restricted to their common leaf set before comparison.
/// The result is `rf / max_rf` where `rf` is the size of the symmetric
/// difference of the two non-trivial bipartition sets and `max_rf` the sum
/// of their sizes. `None` when `max_rf` is zero (star or otherwise trivial
/// topologies): that is a zero-over-zero case, not a zero distance.
pub fn rf_distance(a: &TreeSnapshot, b: &TreeSnapshot) -> Option<f64> {
    let mut common: Vec<&str> = a
        .leaves
        .iter()
        .filter(|name| b.leaves.contains(*name))
        .map(String::as_str)
        .collect();
    common.sort_unstable();
    let n = common.len();
    let index: HashMap<&str, u32> = common
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, i as u32))
        .collect();

    let parts_a = a.restricted_splits(&index, n);
    let parts_b = b.restricted_splits(&index, n);
    let max_rf = parts_a.len() + parts_b.len();
    if max_rf == 0 {
        return None;
    }
    let shared = parts_a.intersection(&parts_b).count();
    let rf = parts_a.len() + parts_b.len() - 2 * shared;
    Some(rf as f64 / max_rf as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(newick: &str) -> TreeSnapshot {
        TreeSnapshot::from_newick(newick).unwrap()
    }

    #[test]
    fn test_identical_trees_have_zero_distance() {
        let a = snap("((a,b),(c,d));");
        let b = snap("((a,b),(c,d));");
        assert_eq!(a.num_leaves(), 4);
        assert_eq!(rf_distance(&a, &b), Some(0.0));
    }

    #[test]
    fn test_label_order_is_irrelevant() {
        let a = snap("((a,b),(c,d));");
        let b = snap("((d,c),(b,a));");
        assert_eq!(rf_distance(&a, &b), Some(0.0));
    }

    #[test]
    fn test_conflicting_quartets_are_maximally_distant() {
        let a = snap("((a,b),(c,d));");
        let b = snap("((a,c),(b,d));");
        assert_eq!(rf_distance(&a, &b), Some(1.0));
    }

    #[test]
    fn test_star_trees_are_degenerate() {
        // No non-trivial bipartition on either side: max RF is zero and the
        // distance is undefined rather than zero.
        let a = snap("(a,b,c,d);");
        let b = snap("(a,b,c,d);");
        assert_eq!(rf_distance(&a, &b), None);
    }

    #[test]
    fn test_star_against_resolved_tree() {
        let star = snap("(a,b,c,d);");
        let resolved = snap("((a,b),(c,d));");
        // One side contributes its single split, the star contributes none.
        assert_eq!(rf_distance(&star, &resolved), Some(1.0));
    }

    #[test]
    fn test_restriction_to_common_leaves() {
        // On the shared leaves {a,b,c,d} both trees induce the split ab|cd.
        let a = snap("((a,b),((c,d),e));");
        let b = snap("((a,b),(c,d));");
        assert_eq!(rf_distance(&a, &b), Some(0.0));
    }

    #[test]
    fn test_too_few_common_leaves() {
        let a = snap("((a,b),(c,d));");
        let b = snap("((a,b),(x,y));");
        // Two common leaves cannot carry a non-trivial split.
        assert_eq!(rf_distance(&a, &b), None);
    }

    #[test]
    fn test_partial_agreement() {
        let a = snap("(((a,b),c),(d,(e,f)));");
        let b = snap("(((a,b),c),(e,(d,f)));");
        let d = rf_distance(&a, &b).unwrap();
        assert!(d > 0.0 && d < 1.0, "expected partial distance, got {}", d);
    }

    #[test]
    fn test_malformed_newick_is_an_error() {
        assert!(TreeSnapshot::from_newick("((a,b),(c,d)").is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(TreeSnapshot::from_file(Path::new("/nonexistent/tree.nwk")).is_err());
    }
}
