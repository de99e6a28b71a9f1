pub mod exact;
pub mod hnsw;

use crate::error::IndexResult;
use crate::types::{IndexConfig, IndexKind, SearchResult, VectorDocument};

use exact::ExactIndex;
use hnsw::{HnswConfig, HnswIndex};

/// Capability contract shared by every index strategy.
///
/// All methods take `&self`; implementations guard their state with an
/// interior reader-writer lock, so searches run concurrently while
/// inserts, deletes, and clears serialize behind the write side.
pub trait VectorIndex: Send + Sync {
    /// Inserts one document. Fails with `DimensionMismatch` on wrong
    /// vector length and `DuplicateId` if the id is live (delete first to
    /// replace). Validation failures leave the index unchanged.
    fn insert(&self, doc: VectorDocument) -> IndexResult<()>;

    /// Inserts a batch under one write lock. The whole batch is validated
    /// before any document is applied, so an error means nothing changed.
    fn insert_batch(&self, docs: Vec<VectorDocument>) -> IndexResult<()>;

    /// Returns up to `k` results ordered most-similar-first (ascending
    /// score). Fewer than `k` live documents is not an error.
    /// `ef_search` overrides the configured beam width for this query;
    /// strategies without a beam ignore it.
    fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: Option<usize>,
    ) -> IndexResult<Vec<SearchResult>>;

    /// Tombstones the document. Fails with `NotFound` if the id is absent
    /// or already deleted.
    fn delete(&self, id: &str) -> IndexResult<()>;

    /// Returns the stored document, `NotFound` for absent or deleted ids.
    fn get(&self, id: &str) -> IndexResult<VectorDocument>;

    /// Number of live (non-tombstoned) documents.
    fn count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Resets to the empty state.
    fn clear(&self);

    /// Snapshot for an external persistence layer. `ExactIndex::restore`
    /// and `HnswIndex::restore` rebuild a functionally identical index.
    fn serialize(&self) -> IndexResult<Vec<u8>>;
}

/// Builds the index strategy named by the configuration. The HNSW variant
/// starts from the `balanced` preset; construct [`HnswIndex`] directly for
/// other presets or custom parameters.
pub fn index_for_config(config: &IndexConfig) -> Box<dyn VectorIndex> {
    match config.kind {
        IndexKind::Exact => Box::new(ExactIndex::new(config.dimension, config.metric)),
        IndexKind::Hnsw => Box::new(HnswIndex::new(
            config.dimension,
            config.metric,
            HnswConfig::balanced(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DistanceMetricKind;

    #[test]
    fn test_factory_selects_strategy() {
        let exact = index_for_config(&IndexConfig::new(4));
        assert_eq!(exact.count(), 0);
        exact
            .insert(VectorDocument::new("a", vec![1.0, 0.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(exact.count(), 1);

        let cfg = IndexConfig::new(4)
            .with_metric(DistanceMetricKind::Euclidean)
            .with_kind(IndexKind::Hnsw);
        let hnsw = index_for_config(&cfg);
        hnsw.insert(VectorDocument::new("a", vec![1.0, 0.0, 0.0, 0.0]))
            .unwrap();
        let results = hnsw.search(&[1.0, 0.0, 0.0, 0.0], 1, None).unwrap();
        assert_eq!(results[0].id, "a");
    }
}
