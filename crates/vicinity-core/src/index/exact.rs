use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::distance::{metric_for_kind, DistanceMetric};
use crate::error::{IndexError, IndexResult};
use crate::types::{DistanceMetricKind, Metadata, SearchResult, VectorData, VectorDocument};

use super::VectorIndex;

/// Max-heap entry keyed on distance, used to keep the k best candidates
/// while scanning: the root is the current worst, evicted on overflow.
struct Scored {
    idx: usize,
    distance: f32,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}
impl Eq for Scored {}
impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(Ordering::Equal)
    }
}

#[derive(Default, Serialize, Deserialize)]
struct ExactState {
    ids: Vec<String>,
    vectors: Vec<VectorData>,
    metadata: Vec<Metadata>,
    #[serde(skip)]
    id_to_idx: HashMap<String, usize>,
}

impl ExactState {
    fn rebuild_lookup(&mut self) {
        self.id_to_idx = self
            .ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
    }
}

#[derive(Serialize, Deserialize)]
struct ExactSnapshot {
    dimension: usize,
    metric: DistanceMetricKind,
    state: ExactState,
}

/// Linear-scan baseline: O(n·d) per query, 100% recall by construction.
/// Appropriate below roughly 10,000 vectors and as the ground-truth oracle
/// for approximate-index recall tests.
pub struct ExactIndex {
    dimension: usize,
    metric_kind: DistanceMetricKind,
    metric: Box<dyn DistanceMetric>,
    state: RwLock<ExactState>,
}

impl ExactIndex {
    pub fn new(dimension: usize, metric_kind: DistanceMetricKind) -> Self {
        Self {
            dimension,
            metric_kind,
            metric: metric_for_kind(metric_kind),
            state: RwLock::new(ExactState::default()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric_kind(&self) -> DistanceMetricKind {
        self.metric_kind
    }

    /// Rebuilds an index from [`VectorIndex::serialize`] output.
    pub fn restore(bytes: &[u8]) -> IndexResult<Self> {
        let snapshot: ExactSnapshot = serde_json::from_slice(bytes)?;
        let mut state = snapshot.state;
        state.rebuild_lookup();
        tracing::debug!(
            dimension = snapshot.dimension,
            documents = state.ids.len(),
            "restored exact index from snapshot"
        );
        Ok(Self {
            dimension: snapshot.dimension,
            metric_kind: snapshot.metric,
            metric: metric_for_kind(snapshot.metric),
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

    fn apply_insert(state: &mut ExactState, doc: VectorDocument) {
        let idx = state.vectors.len();
        state.id_to_idx.insert(doc.id.clone(), idx);
        state.ids.push(doc.id);
        state.vectors.push(doc.vector);
        state.metadata.push(doc.metadata);
    }
}

impl VectorIndex for ExactIndex {
    fn insert(&self, doc: VectorDocument) -> IndexResult<()> {
        self.validate(&doc.vector)?;
        let mut state = self.state.write();
        if state.id_to_idx.contains_key(&doc.id) {
            return Err(IndexError::DuplicateId(doc.id));
        }
        Self::apply_insert(&mut state, doc);
        Ok(())
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

        for doc in docs {
            Self::apply_insert(&mut state, doc);
        }
        Ok(())
    }

    fn search(
        &self,
        query: &[f32],
        k: usize,
        _ef_search: Option<usize>,
    ) -> IndexResult<Vec<SearchResult>> {
        self.validate(query)?;
        let state = self.state.read();

        let mut heap: BinaryHeap<Scored> = BinaryHeap::with_capacity(k + 1);
        for (idx, vector) in state.vectors.iter().enumerate() {
            let distance = self.metric.distance(query, vector);
            if heap.len() < k {
                heap.push(Scored { idx, distance });
            } else if let Some(worst) = heap.peek() {
                if distance < worst.distance {
                    heap.pop();
                    heap.push(Scored { idx, distance });
                }
            }
        }

        let results = heap
            .into_sorted_vec()
            .into_iter()
            .map(|s| SearchResult {
                id: state.ids[s.idx].clone(),
                score: s.distance,
                metadata: state.metadata[s.idx].clone(),
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

        // Swap-remove keeps delete O(1) without tombstone bookkeeping.
        let last = state.vectors.len() - 1;
        if idx != last {
            state.vectors.swap(idx, last);
            state.ids.swap(idx, last);
            state.metadata.swap(idx, last);
            let moved = state.ids[idx].clone();
            state.id_to_idx.insert(moved, idx);
        }
        state.vectors.pop();
        state.ids.pop();
        state.metadata.pop();
        Ok(())
    }

    fn get(&self, id: &str) -> IndexResult<VectorDocument> {
        let state = self.state.read();
        let &idx = state
            .id_to_idx
            .get(id)
            .ok_or_else(|| IndexError::NotFound(id.to_string()))?;
        Ok(VectorDocument {
            id: state.ids[idx].clone(),
            vector: state.vectors[idx].clone(),
            metadata: state.metadata[idx].clone(),
        })
    }

    fn count(&self) -> usize {
        self.state.read().vectors.len()
    }

    fn clear(&self) {
        let mut state = self.state.write();
        *state = ExactState::default();
        tracing::debug!("cleared exact index");
    }

    fn serialize(&self) -> IndexResult<Vec<u8>> {
        let state = self.state.read();
        let snapshot = ExactSnapshot {
            dimension: self.dimension,
            metric: self.metric_kind,
            state: ExactState {
                ids: state.ids.clone(),
                vectors: state.vectors.clone(),
                metadata: state.metadata.clone(),
                id_to_idx: HashMap::new(),
            },
        };
        Ok(serde_json::to_vec(&snapshot)?)
    }
}
