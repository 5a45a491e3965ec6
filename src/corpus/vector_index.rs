//! Exact nearest-neighbour index over fixed-dimension embeddings.
//!
//! Search is a brute-force linear scan: O(N·D) per query, O(D) per add.
//! Results are exact, so this is also the reference any faster structure
//! layered on top must agree with.

use std::cmp::Ordering;

use super::{CorpusError, DocumentId};

#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Append a vector and return its position.
    pub fn add(&mut self, vector: Vec<f32>) -> Result<DocumentId, CorpusError> {
        self.check_dimension(&vector)?;
        let id = self.vectors.len();
        self.vectors.push(vector);
        Ok(id)
    }

    /// The `k` closest entries by squared L2 distance, ascending.
    ///
    /// Equal distances are ordered by ascending id. Asking for more entries
    /// than the index holds returns everything it has.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(DocumentId, f32)>, CorpusError> {
        self.check_dimension(query)?;
        if k == 0 || self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(DocumentId, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(id, vector)| (id, squared_l2(query, vector)))
            .collect();

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_id);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance_then_id);

        Ok(scored)
    }

    /// Drop every entry at or after `len`. Only the corpus uses this, to undo
    /// an add whose paired document append failed.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.vectors.truncate(len);
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), CorpusError> {
        if vector.len() != self.dimension {
            return Err(CorpusError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn by_distance_then_id(a: &(DocumentId, f32), b: &(DocumentId, f32)) -> Ordering {
    a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0))
}
