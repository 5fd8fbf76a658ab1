// mod.rs - External tool wrappers module

pub mod qdist;
pub mod raxml;

// Re-export main types for convenience
pub use qdist::QdistRunner;
pub use raxml::RaxmlRunner;
