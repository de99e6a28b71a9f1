//! In-memory vector similarity search.
//!
//! Two index strategies behind one [`index::VectorIndex`] interface:
//! - [`index::exact::ExactIndex`]: linear scan, 100% recall, the
//!   correctness baseline for small collections.
//! - [`index::hnsw::HnswIndex`]: multi-layer navigable small-world graph
//!   (Malkov & Yashunin 2018) for sub-linear approximate search.

pub mod distance;
pub mod error;
pub mod index;
pub mod recall;
pub mod types;

pub use error::{IndexError, IndexResult};
pub use index::exact::ExactIndex;
pub use index::hnsw::{HnswConfig, HnswIndex};
pub use index::{index_for_config, VectorIndex};
pub use types::*;
