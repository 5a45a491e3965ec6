use parking_lot::RwLock;
use serde::Serialize;

use super::{CorpusError, DocumentId, DocumentStore, VectorIndex};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedDocument {
    pub id: DocumentId,
    pub distance: f32,
    pub text: String,
}

struct CorpusState {
    index: VectorIndex,
    store: DocumentStore,
}

/// The document store and its vector index, kept the same length.
///
/// Writers hold the lock for the paired append only; readers hold it for
/// search plus fetch. Embedding happens before either, so no model call ever
/// runs under the lock.
pub struct Corpus {
    state: RwLock<CorpusState>,
}

impl Corpus {
    pub fn new(dimension: usize) -> Self {
        Self {
            state: RwLock::new(CorpusState {
                index: VectorIndex::new(dimension),
                store: DocumentStore::new(),
            }),
        }
    }

    pub fn dimension(&self) -> usize {
        self.state.read().index.dimension()
    }

    pub fn len(&self) -> usize {
        self.state.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a document together with its embedding.
    ///
    /// Either both structures grow by one or neither changes.
    pub fn insert(&self, text: &str, vector: Vec<f32>) -> Result<DocumentId, CorpusError> {
        let mut state = self.state.write();
        let before = state.index.len();

        let id = state.index.add(vector)?;
        if let Err(e) = state.store.append(text) {
            state.index.truncate(before);
            return Err(e);
        }
        debug_assert_eq!(state.index.len(), state.store.len());

        Ok(id)
    }

    /// Search the index and fetch the matching documents in rank order.
    pub fn retrieve(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedDocument>, CorpusError> {
        let state = self.state.read();
        let hits = state.index.search(query, k)?;

        hits.into_iter()
            .map(|(id, distance)| -> Result<RetrievedDocument, CorpusError> {
                let text = state.store.get(id)?.to_string();
                Ok(RetrievedDocument { id, distance, text })
            })
            .collect()
    }

    pub fn document(&self, id: DocumentId) -> Result<String, CorpusError> {
        self.state.read().store.get(id).map(str::to_string)
    }
}
