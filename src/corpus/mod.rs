pub mod vector_index;
pub mod document_store;
pub mod corpus;
pub mod seed;

use thiserror::Error;

pub use corpus::{Corpus, RetrievedDocument};
pub use document_store::DocumentStore;
pub use seed::SEED_DOCUMENTS;
pub use vector_index::VectorIndex;

/// Position of a document in the corpus. Equal to its insertion order.
pub type DocumentId = usize;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorpusError {
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Document has no text after trimming")]
    EmptyDocument,
    #[error("Document {0} not found")]
    NotFound(DocumentId),
}
