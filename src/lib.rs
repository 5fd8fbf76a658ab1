// lib.rs - lingdist library root

//! # lingdist - Pairwise tree-distance matrices for linguistic phylogenetics
//!
//! This library computes, persists and queries triangular distance matrices
//! between phylogenetic trees: many sampled inference replicates per dataset
//! plus a handful of named reference trees (gold-standard taxonomy, full
//! inferences under different codings, consensus of the replicates).
//!
//! ## Features
//!
//! - **Two metrics**: in-process normalized Robinson-Foulds distance and the
//!   generalized quartet distance via an external quartet tool
//! - **Undefined as a value**: failed parses, missing trees, degenerate
//!   topologies and tool failures propagate as `None`, never as errors, and
//!   are filtered out of every aggregate
//! - **Compact storage**: one strict lower-triangular file per metric,
//!   reference trees addressed through negative slots at the end of the
//!   combined index space
//! - **Idempotent caching**: a dataset's distance directory is the cache
//!   unit; incomplete caches are rebuilt, failed builds are removed whole
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use lingdist::prelude::*;
//! use std::path::Path;
//!
//! // Load the cached distance matrices of one dataset
//! let dm = DistanceMatrix::from_dir(
//!     Path::new("data/results/distances/bodtkhobwa_lexibank_cognate_sinotibetan"),
//!     &Metric::ALL,
//!     ReferenceSet::default_roles(),
//! )?;
//!
//! // Distance between two reference trees, and the spread of the sampled
//! // replicates around the binary-coding tree
//! let d = dm.reference_distance("bin", "catg_bin", Metric::Rf)?;
//! let avg = dm.avg_reference_distance("bin", Metric::Rf)?;
//! println!("bin vs catg_bin: {:?}, sampled spread: {:?}", d, avg);
//! # Ok::<(), String>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod output;
pub mod tools;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{build_matrix, cache_complete, generate_distances, rf_distance};
    pub use crate::core::{DistanceMatrix, Metric, ReferenceSet, TreeComparator, TreeId, TreeSnapshot};
    pub use crate::data::{DatasetFilter, DatasetRow, DatasetTable};
    pub use crate::output::{read_matrix, write_matrix, DistanceReport};
    pub use crate::tools::{QdistRunner, RaxmlRunner};
}

// Re-export main types at the root level for convenience
pub use crate::core::{DistanceMatrix, Metric, ReferenceSet, TreeComparator, TreeId};
pub use crate::data::{DatasetRow, DatasetTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
