// mod.rs - Core distance subsystem module

pub mod builder;
pub mod comparator;
pub mod matrix;
pub mod metric;
pub mod tree;

// Re-export main types for convenience
pub use builder::{build_matrix, cache_complete, generate_distances};
pub use comparator::TreeComparator;
pub use matrix::{DistanceMatrix, RawMatrix, ReferenceSet, TreeId};
pub use metric::Metric;
pub use tree::{rf_distance, TreeSnapshot};
