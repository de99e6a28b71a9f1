use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type VectorData = Vec<f32>;
pub type Metadata = HashMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetricKind {
    Cosine,
    Euclidean,
    DotProduct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Exact,
    Hnsw,
}

/// One indexed item: caller-assigned id, fixed-dimension vector, and an
/// opaque metadata payload the index never interprets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDocument {
    pub id: String,
    pub vector: VectorData,
    #[serde(default)]
    pub metadata: Metadata,
}

impl VectorDocument {
    pub fn new(id: impl Into<String>, vector: VectorData) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// A scored neighbor. `score` is the index's internal distance key, so
/// lower is always more similar regardless of the configured metric
/// (cosine distance `1 - cos`, negated dot product, raw L2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Construction-time index configuration. Dimension and metric are fixed
/// for the lifetime of the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub dimension: usize,
    pub metric: DistanceMetricKind,
    pub kind: IndexKind,
}

impl IndexConfig {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            metric: DistanceMetricKind::Cosine,
            kind: IndexKind::Exact,
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetricKind) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_kind(mut self, kind: IndexKind) -> Self {
        self.kind = kind;
        self
    }
}
