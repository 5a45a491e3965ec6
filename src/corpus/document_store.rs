use super::{CorpusError, DocumentId};

/// Document text keyed by insertion order.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<String>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Store the trimmed text and return its id.
    pub fn append(&mut self, text: &str) -> Result<DocumentId, CorpusError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CorpusError::EmptyDocument);
        }
        let id = self.documents.len();
        self.documents.push(text.to_string());
        Ok(id)
    }

    pub fn get(&self, id: DocumentId) -> Result<&str, CorpusError> {
        self.documents
            .get(id)
            .map(String::as_str)
            .ok_or(CorpusError::NotFound(id))
    }
}
