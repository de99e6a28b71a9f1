//! Recall measurement: runs identical queries against a ground-truth index
//! and a candidate index and reports top-k overlap. Intended for wiring an
//! approximate index against the exact baseline in benchmarks and tests.

use std::collections::HashSet;

use crate::error::IndexResult;
use crate::index::VectorIndex;
use crate::types::SearchResult;

/// Fraction of `ground_truth`'s top-k ids that `results` also returned.
/// Returns 1.0 for an empty ground truth (nothing to miss).
pub fn recall_at_k(ground_truth: &[SearchResult], results: &[SearchResult], k: usize) -> f64 {
    let truth: HashSet<&str> = ground_truth.iter().take(k).map(|r| r.id.as_str()).collect();
    if truth.is_empty() {
        return 1.0;
    }
    let found = results
        .iter()
        .take(k)
        .filter(|r| truth.contains(r.id.as_str()))
        .count();
    found as f64 / truth.len() as f64
}

/// Average recall@k of `candidate` against `baseline` over a query set.
/// Both indices must hold the same documents for the number to mean
/// anything; the caller owns that setup.
pub fn measure_recall(
    baseline: &dyn VectorIndex,
    candidate: &dyn VectorIndex,
    queries: &[Vec<f32>],
    k: usize,
) -> IndexResult<f64> {
    if queries.is_empty() {
        return Ok(1.0);
    }
    let mut total = 0.0f64;
    for query in queries {
        let truth = baseline.search(query, k, None)?;
        let results = candidate.search(query, k, None)?;
        total += recall_at_k(&truth, &results, k);
    }
    Ok(total / queries.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;

    fn result(id: &str, score: f32) -> SearchResult {
        SearchResult {
            id: id.into(),
            score,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_perfect_recall() {
        let truth = vec![result("a", 0.1), result("b", 0.2), result("c", 0.3)];
        assert_eq!(recall_at_k(&truth, &truth, 3), 1.0);
    }

    #[test]
    fn test_partial_recall() {
        let truth = vec![result("a", 0.1), result("b", 0.2), result("c", 0.3)];
        let got = vec![result("a", 0.1), result("x", 0.2), result("c", 0.3)];
        let r = recall_at_k(&truth, &got, 3);
        assert!((r - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_recall_only_counts_top_k() {
        let truth = vec![result("a", 0.1), result("b", 0.2)];
        // "b" appears past position k, so it does not count at k=1.
        let got = vec![result("b", 0.2), result("a", 0.1)];
        assert_eq!(recall_at_k(&truth, &got, 1), 0.0);
    }

    #[test]
    fn test_empty_ground_truth() {
        assert_eq!(recall_at_k(&[], &[result("a", 0.1)], 5), 1.0);
    }

    #[test]
    fn test_measure_recall_identical_indices() {
        use crate::index::exact::ExactIndex;
        use crate::types::{DistanceMetricKind, VectorDocument};

        let a = ExactIndex::new(2, DistanceMetricKind::Euclidean);
        let b = ExactIndex::new(2, DistanceMetricKind::Euclidean);
        for (i, v) in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]].iter().enumerate() {
            a.insert(VectorDocument::new(format!("v{i}"), v.to_vec()))
                .unwrap();
            b.insert(VectorDocument::new(format!("v{i}"), v.to_vec()))
                .unwrap();
        }
        let queries = vec![vec![0.1, 0.1], vec![0.9, 0.0]];
        let r = measure_recall(&a, &b, &queries, 2).unwrap();
        assert_eq!(r, 1.0);
    }
}
