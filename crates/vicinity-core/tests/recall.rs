//! Recall of the HNSW index measured against the exact baseline as ground
//! truth. The small gate runs in CI; the full 10k-vector gate is ignored
//! by default and run explicitly with `cargo test -- --ignored`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use vicinity_core::recall::measure_recall;
use vicinity_core::{
    DistanceMetricKind, ExactIndex, HnswConfig, HnswIndex, VectorDocument, VectorIndex,
};

fn random_unit_vector(rng: &mut impl Rng, dim: usize) -> Vec<f32> {
    let mut v: Vec<f32> = (0..dim).map(|_| rng.gen::<f32>() - 0.5).collect();
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

fn build_pair(
    dim: usize,
    n: usize,
    config: HnswConfig,
    rng: &mut StdRng,
) -> (ExactIndex, HnswIndex) {
    let exact = ExactIndex::new(dim, DistanceMetricKind::Cosine);
    let hnsw = HnswIndex::new(dim, DistanceMetricKind::Cosine, config);
    for i in 0..n {
        let v = random_unit_vector(rng, dim);
        let id = format!("v{i}");
        exact.insert(VectorDocument::new(id.clone(), v.clone())).unwrap();
        hnsw.insert(VectorDocument::new(id, v)).unwrap();
    }
    (exact, hnsw)
}

#[test]
fn recall_small_gate() {
    let mut rng = StdRng::seed_from_u64(41);
    let (exact, hnsw) = build_pair(64, 1000, HnswConfig::balanced(), &mut rng);

    let queries: Vec<Vec<f32>> = (0..50).map(|_| random_unit_vector(&mut rng, 64)).collect();
    let recall = measure_recall(&exact, &hnsw, &queries, 10).unwrap();
    assert!(recall >= 0.90, "recall@10 = {recall:.3}, expected >= 0.90");
}

#[test]
#[ignore = "takes minutes; run with --ignored for the full recall gate"]
fn recall_full_gate() {
    let mut rng = StdRng::seed_from_u64(42);
    let (exact, hnsw) = build_pair(128, 10_000, HnswConfig::balanced(), &mut rng);

    let queries: Vec<Vec<f32>> = (0..100).map(|_| random_unit_vector(&mut rng, 128)).collect();
    let recall = measure_recall(&exact, &hnsw, &queries, 10).unwrap();
    assert!(recall >= 0.95, "recall@10 = {recall:.3}, expected >= 0.95");
}

// Tombstones must not sink recall over the surviving set: ground truth is
// computed on the exact index after the same deletes.
#[test]
fn recall_survives_deletes() {
    let mut rng = StdRng::seed_from_u64(43);
    let (exact, hnsw) = build_pair(32, 800, HnswConfig::balanced(), &mut rng);

    for i in 0..200 {
        let id = format!("v{i}");
        exact.delete(&id).unwrap();
        hnsw.delete(&id).unwrap();
    }
    assert_eq!(exact.count(), 600);
    assert_eq!(hnsw.count(), 600);

    let queries: Vec<Vec<f32>> = (0..30).map(|_| random_unit_vector(&mut rng, 32)).collect();
    let recall = measure_recall(&exact, &hnsw, &queries, 10).unwrap();
    assert!(recall >= 0.85, "recall@10 = {recall:.3}, expected >= 0.85");
}
