pub mod api;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod document;
pub mod llm;
pub mod providers;

// Re-export commonly used items
pub use config::RagConfig;
pub use corpus::{Corpus, SEED_DOCUMENTS};
pub use llm::{RagError, RetrievalPipeline};
