#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Hybrid retrieval engine: orchestrates segmentation, metadata
//! extraction, the local keyword index and the dense collaborator, and
//! fuses both retrieval signals into one ranked result set.

pub mod dense;
pub mod engine;

pub use engine::{BuildOptions, BuildSummary, QueryOptions, RetrievalEngine};
