//! HNSW (Hierarchical Navigable Small World) index.
//!
//! Implements the multi-layer navigable graph of Malkov & Yashunin (2018),
//! "Efficient and robust approximate nearest neighbor search using
//! Hierarchical Navigable Small World graphs", https://arxiv.org/abs/1603.09320
//!
//! The graph lives in a flat arena of nodes addressed by integer index;
//! neighbor lists store arena indices, never references. Deletes tombstone
//! nodes in place: tombstoned nodes keep routing traffic through the graph
//! but are never returned from a search.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::{metric_for_kind, DistanceMetric};
use crate::error::{IndexError, IndexResult};
use crate::types::{DistanceMetricKind, Metadata, SearchResult, VectorData, VectorDocument};

use super::VectorIndex;

/// Upper bound on assigned layers. With ml = 1/ln(M) the draw exceeding
/// this is vanishingly rare; the cap bounds memory against degenerate
/// RNG output.
const LAYER_CAP: usize = 16;

const DEFAULT_SEED: u64 = 0x5EED_CAFE;

/// HNSW construction and search parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Max neighbors per node per layer above 0.
    pub m: usize,
    /// Max neighbors at layer 0 (2 * M).
    pub m_max0: usize,
    /// Candidate-list width during insertion.
    pub ef_construction: usize,
    /// Default candidate-list width during search.
    pub ef_search: usize,
    /// Layer assignment parameter, 1 / ln(M).
    pub ml: f64,
    /// Seed for layer assignment, fixed so test graphs are reproducible.
    pub seed: u64,
}

impl HnswConfig {
    pub fn new(m: usize, ef_construction: usize, ef_search: usize) -> Self {
        Self {
            m,
            m_max0: m * 2,
            ef_construction,
            ef_search,
            ml: 1.0 / (m as f64).ln(),
            seed: DEFAULT_SEED,
        }
    }

    /// General-purpose preset: M=32, ef_construction=200, ef_search=128.
    pub fn balanced() -> Self {
        Self::new(32, 200, 128)
    }

    /// Memory-constrained preset for small collections:
    /// M=16, ef_construction=80, ef_search=64.
    pub fn edge_cache() -> Self {
        Self::new(16, 80, 64)
    }

    /// Recall-first preset for large collections:
    /// M=48, ef_construction=320, ef_search=256.
    pub fn high_recall() -> Self {
        Self::new(48, 320, 256)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self::balanced()
    }
}

/// Arena record: the owned vector plus per-layer neighbor lists.
/// `neighbors.len() - 1` is the highest layer the node participates in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node {
    id: String,
    vector: VectorData,
    metadata: Metadata,
    neighbors: Vec<Vec<usize>>,
    deleted: bool,
}

struct HnswState {
    nodes: Vec<Node>,
    /// Live ids only; tombstoned nodes stay in the arena but drop out here.
    id_to_idx: HashMap<String, usize>,
    entry_point: Option<usize>,
    max_layer: usize,
    rng: StdRng,
}

impl HnswState {
    fn empty(seed: u64) -> Self {
        Self {
            nodes: Vec::new(),
            id_to_idx: HashMap::new(),
            entry_point: None,
            max_layer: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct HnswSnapshot {
    dimension: usize,
    metric: DistanceMetricKind,
    config: HnswConfig,
    nodes: Vec<Node>,
    entry_point: Option<usize>,
    max_layer: usize,
}

#[derive(Clone, Copy)]
struct Candidate {
    idx: usize,
    distance: f32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}
impl Eq for Candidate {}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
/// Reversed so `BinaryHeap<Candidate>` pops the closest entry first.
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// Natural ordering wrapper: `BinaryHeap<FarthestCandidate>` keeps the
/// current worst result at the root for O(log ef) eviction.
struct FarthestCandidate(Candidate);

impl PartialEq for FarthestCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.0.distance == other.0.distance
    }
}
impl Eq for FarthestCandidate {}
impl PartialOrd for FarthestCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for FarthestCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .distance
            .partial_cmp(&other.0.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// Approximate index over a multi-layer navigable small-world graph.
///
/// Reads take a shared lock and see a consistent snapshot of the graph;
/// inserts and deletes take the exclusive side for their full duration.
pub struct HnswIndex {
    dimension: usize,
    metric_kind: DistanceMetricKind,
    metric: Box<dyn DistanceMetric>,
    config: HnswConfig,
    state: RwLock<HnswState>,
}

impl HnswIndex {
    pub fn new(dimension: usize, metric_kind: DistanceMetricKind, config: HnswConfig) -> Self {
        let seed = config.seed;
        Self {
            dimension,
            metric_kind,
            metric: metric_for_kind(metric_kind),
            config,
            state: RwLock::new(HnswState::empty(seed)),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric_kind(&self) -> DistanceMetricKind {
        self.metric_kind
    }

    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    /// Rebuilds an index from [`VectorIndex::serialize`] output. Answered
    /// queries match the snapshotted index exactly; the layer RNG restarts
    /// from the configured seed.
    pub fn restore(bytes: &[u8]) -> IndexResult<Self> {
        let snapshot: HnswSnapshot = serde_json::from_slice(bytes)?;

        if let Some(ep) = snapshot.entry_point {
            if ep >= snapshot.nodes.len() {
                return Err(IndexError::InternalInconsistency(format!(
                    "snapshot entry point {} outside arena of {} nodes",
                    ep,
                    snapshot.nodes.len()
                )));
            }
        }

        let mut state = HnswState::empty(snapshot.config.seed);
        state.id_to_idx = snapshot
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.deleted)
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
        state.nodes = snapshot.nodes;
        state.entry_point = snapshot.entry_point;
        state.max_layer = snapshot.max_layer;

        debug!(
            dimension = snapshot.dimension,
            live = state.id_to_idx.len(),
            arena = state.nodes.len(),
            "restored hnsw index from snapshot"
        );
        Ok(Self {
            dimension: snapshot.dimension,
            metric_kind: snapshot.metric,
            metric: metric_for_kind(snapshot.metric),
            config: snapshot.config,
            state: RwLock::new(state),
        })
    }

    fn validate(&self, vector: &[f32]) -> IndexResult<()> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }
        if vector.is_empty() {
            return Err(IndexError::EmptyVector);
        }
        Ok(())
    }

    fn dist(&self, a: &[f32], b: &[f32]) -> f32 {
        self.metric.distance(a, b)
    }

    /// Draws a node's top layer from the exponential distribution with
    /// parameter ml = 1/ln(M).
    fn random_level(&self, rng: &mut StdRng) -> usize {
        let uniform: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
        ((-uniform.ln() * self.config.ml).floor() as usize).min(LAYER_CAP)
    }

    /// Beam search within one layer.
    ///
    /// Two structures drive the search: a min-heap of candidates still to
    /// expand and a bounded max-heap of the best `ef` results found so
    /// far. Expansion stops once the closest unexplored candidate is
    /// farther than the worst kept result and the result set is full.
    ///
    /// With `live_only`, tombstoned nodes are still traversed (they keep
    /// the graph connected) but never admitted to the result set.
    fn search_layer(
        &self,
        state: &HnswState,
        query: &[f32],
        entry_points: &[usize],
        ef: usize,
        layer: usize,
        live_only: bool,
    ) -> Vec<Candidate> {
        let mut visited: HashSet<usize> = HashSet::new();
        let mut candidates: BinaryHeap<Candidate> = BinaryHeap::new();
        let mut results: BinaryHeap<FarthestCandidate> = BinaryHeap::new();

        for &ep in entry_points {
            if !visited.insert(ep) {
                continue;
            }
            let c = Candidate {
                idx: ep,
                distance: self.dist(query, &state.nodes[ep].vector),
            };
            candidates.push(c);
            if !live_only || !state.nodes[ep].deleted {
                results.push(FarthestCandidate(c));
                if results.len() > ef {
                    results.pop();
                }
            }
        }

        while let Some(closest) = candidates.pop() {
            let worst = results.peek().map(|f| f.0.distance).unwrap_or(f32::MAX);
            if results.len() >= ef && closest.distance > worst {
                break;
            }

            let Some(layer_neighbors) = state.nodes[closest.idx].neighbors.get(layer) else {
                continue;
            };
            for &neighbor_idx in layer_neighbors {
                if !visited.insert(neighbor_idx) {
                    continue;
                }
                let distance = self.dist(query, &state.nodes[neighbor_idx].vector);
                let worst = results.peek().map(|f| f.0.distance).unwrap_or(f32::MAX);
                if results.len() < ef || distance < worst {
                    let c = Candidate { idx: neighbor_idx, distance };
                    candidates.push(c);
                    if !live_only || !state.nodes[neighbor_idx].deleted {
                        results.push(FarthestCandidate(c));
                        if results.len() > ef {
                            results.pop();
                        }
                    }
                }
            }
        }

        results
            .into_sorted_vec()
            .into_iter()
            .map(|fc| fc.0)
            .collect()
    }

    /// Diversity-aware neighbor selection (Algorithm 4 from the paper).
    ///
    /// Walking candidates closest-first, a candidate that sits closer to
    /// an already-selected neighbor than to the insertion point is
    /// discarded; keeping only mutually spread-out neighbors preserves
    /// navigability where closest-only selection forms hubs. Discarded
    /// candidates backfill if fewer than `m` survive.
    fn select_neighbors(&self, state: &HnswState, candidates: &[Candidate], m: usize) -> Vec<usize> {
        if candidates.len() <= m {
            return candidates.iter().map(|c| c.idx).collect();
        }

        let mut selected: Vec<Candidate> = Vec::with_capacity(m);
        let mut discarded: Vec<Candidate> = Vec::new();

        for &cand in candidates {
            if selected.len() >= m {
                break;
            }
            let cand_vector = &state.nodes[cand.idx].vector;
            let diverse = selected
                .iter()
                .all(|s| self.dist(cand_vector, &state.nodes[s.idx].vector) >= cand.distance);
            if diverse {
                selected.push(cand);
            } else {
                discarded.push(cand);
            }
        }

        for cand in discarded {
            if selected.len() >= m {
                break;
            }
            selected.push(cand);
        }

        selected.into_iter().map(|c| c.idx).collect()
    }

    /// Re-selects a node's neighbor list after its degree overflowed.
    fn prune_neighbors(&self, state: &mut HnswState, node_idx: usize, layer: usize, m_max: usize) {
        let node_vector = state.nodes[node_idx].vector.clone();
        let mut scored: Vec<Candidate> = state.nodes[node_idx].neighbors[layer]
            .iter()
            .map(|&idx| Candidate {
                idx,
                distance: self.dist(&node_vector, &state.nodes[idx].vector),
            })
            .collect();
        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
        });

        let selected = self.select_neighbors(state, &scored, m_max);
        state.nodes[node_idx].neighbors[layer] = selected;
    }

    fn insert_node(&self, state: &mut HnswState, doc: VectorDocument) -> IndexResult<()> {
        if state.id_to_idx.contains_key(&doc.id) {
            return Err(IndexError::DuplicateId(doc.id));
        }

        let level = self.random_level(&mut state.rng);
        let node_idx = state.nodes.len();
        let query = doc.vector.clone();
        let node = Node {
            id: doc.id.clone(),
            vector: doc.vector,
            metadata: doc.metadata,
            neighbors: vec![Vec::new(); level + 1],
            deleted: false,
        };

        let Some(mut ep) = state.entry_point else {
            state.nodes.push(node);
            state.id_to_idx.insert(doc.id, node_idx);
            state.entry_point = Some(node_idx);
            state.max_layer = level;
            debug!(idx = node_idx, layer = level, "first node becomes entry point");
            return Ok(());
        };
        if ep >= state.nodes.len() {
            return Err(IndexError::InternalInconsistency(format!(
                "entry point {} outside arena of {} nodes",
                ep,
                state.nodes.len()
            )));
        }

        state.nodes.push(node);
        state.id_to_idx.insert(doc.id, node_idx);

        // Greedy single-candidate descent through the layers above the new
        // node's top layer.
        let mut layer = state.max_layer;
        while layer > level {
            if let Some(best) = self
                .search_layer(state, &query, &[ep], 1, layer, false)
                .first()
            {
                ep = best.idx;
            }
            layer -= 1;
        }

        // Beam search and bidirectional wiring from min(level, max_layer)
        // down to layer 0.
        let mut entry_points = vec![ep];
        for layer in (0..=level.min(state.max_layer)).rev() {
            let m_max = if layer == 0 {
                self.config.m_max0
            } else {
                self.config.m
            };

            let candidates = self.search_layer(
                state,
                &query,
                &entry_points,
                self.config.ef_construction,
                layer,
                false,
            );
            let neighbors = self.select_neighbors(state, &candidates, m_max);

            state.nodes[node_idx].neighbors[layer] = neighbors.clone();
            for &neighbor_idx in &neighbors {
                let Some(list) = state.nodes[neighbor_idx].neighbors.get_mut(layer) else {
                    continue;
                };
                if !list.contains(&node_idx) {
                    list.push(node_idx);
                    if list.len() > m_max {
                        self.prune_neighbors(state, neighbor_idx, layer, m_max);
                    }
                }
            }

            if !candidates.is_empty() {
                entry_points = candidates.iter().map(|c| c.idx).collect();
            }
        }

        if level > state.max_layer {
            state.max_layer = level;
            state.entry_point = Some(node_idx);
            debug!(idx = node_idx, layer = level, "entry point promoted");
        }

        Ok(())
    }
}

impl VectorIndex for HnswIndex {
    fn insert(&self, doc: VectorDocument) -> IndexResult<()> {
        self.validate(&doc.vector)?;
        let mut state = self.state.write();
        self.insert_node(&mut state, doc)
    }

    fn insert_batch(&self, docs: Vec<VectorDocument>) -> IndexResult<()> {
        let mut state = self.state.write();

        // Validate everything before mutating anything.
        let mut batch_ids: HashSet<&str> = HashSet::with_capacity(docs.len());
        for doc in &docs {
            self.validate(&doc.vector)?;
            if state.id_to_idx.contains_key(&doc.id) || !batch_ids.insert(&doc.id) {
                return Err(IndexError::DuplicateId(doc.id.clone()));
            }
        }

        // Sequential insertion under the one write lock. Parallel graph
        // construction races on neighbor selection and is out of scope.
        for doc in docs {
            self.insert_node(&mut state, doc)?;
        }
        Ok(())
    }

    fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: Option<usize>,
    ) -> IndexResult<Vec<SearchResult>> {
        self.validate(query)?;
        let state = self.state.read();

        if state.nodes.is_empty() {
            return Ok(Vec::new());
        }
        let mut ep = match state.entry_point {
            Some(ep) if ep < state.nodes.len() => ep,
            Some(ep) => {
                return Err(IndexError::InternalInconsistency(format!(
                    "entry point {} outside arena of {} nodes",
                    ep,
                    state.nodes.len()
                )))
            }
            None => {
                return Err(IndexError::InternalInconsistency(
                    "populated graph has no entry point".into(),
                ))
            }
        };

        for layer in (1..=state.max_layer).rev() {
            if let Some(best) = self
                .search_layer(&state, query, &[ep], 1, layer, false)
                .first()
            {
                ep = best.idx;
            }
        }

        let ef = ef_search.unwrap_or(self.config.ef_search).max(k);
        let candidates = self.search_layer(&state, query, &[ep], ef, 0, true);

        let results = candidates
            .into_iter()
            .take(k)
            .map(|c| {
                let node = &state.nodes[c.idx];
                SearchResult {
                    id: node.id.clone(),
                    score: c.distance,
                    metadata: node.metadata.clone(),
                }
            })
            .collect();
        Ok(results)
    }

    fn delete(&self, id: &str) -> IndexResult<()> {
        let mut state = self.state.write();
        let idx = state
            .id_to_idx
            .remove(id)
            .ok_or_else(|| IndexError::NotFound(id.to_string()))?;
        // Tombstone only. Edges stay in place so the graph keeps routing
        // through the node; reclaiming slots is a separate compaction
        // concern.
        state.nodes[idx].deleted = true;
        Ok(())
    }

    fn get(&self, id: &str) -> IndexResult<VectorDocument> {
        let state = self.state.read();
        let &idx = state
            .id_to_idx
            .get(id)
            .ok_or_else(|| IndexError::NotFound(id.to_string()))?;
        let node = &state.nodes[idx];
        Ok(VectorDocument {
            id: node.id.clone(),
            vector: node.vector.clone(),
            metadata: node.metadata.clone(),
        })
    }

    fn count(&self) -> usize {
        self.state.read().id_to_idx.len()
    }

    fn clear(&self) {
        let mut state = self.state.write();
        *state = HnswState::empty(self.config.seed);
        debug!("cleared hnsw index");
    }

    fn serialize(&self) -> IndexResult<Vec<u8>> {
        let state = self.state.read();
        let snapshot = HnswSnapshot {
            dimension: self.dimension,
            metric: self.metric_kind,
            config: self.config.clone(),
            nodes: state.nodes.clone(),
            entry_point: state.entry_point,
            max_layer: state.max_layer,
        };
        Ok(serde_json::to_vec(&snapshot)?)
    }
}
