mod cosine;
mod dot;
mod euclidean;

pub use cosine::CosineDistance;
pub use dot::DotProductDistance;
pub use euclidean::EuclideanDistance;

use crate::types::DistanceMetricKind;

/// Every metric yields a *distance key*: lower = more similar. This is the
/// single ordering used by heaps, pruning, and returned scores.
/// - cosine: 1 - cosine_similarity
/// - dot product: -dot (negated so larger products order first)
/// - euclidean: raw L2 distance
pub trait DistanceMetric: Send + Sync {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32;
}

pub fn metric_for_kind(kind: DistanceMetricKind) -> Box<dyn DistanceMetric> {
    match kind {
        DistanceMetricKind::Cosine => Box::new(CosineDistance),
        DistanceMetricKind::Euclidean => Box::new(EuclideanDistance),
        DistanceMetricKind::DotProduct => Box::new(DotProductDistance),
    }
}
