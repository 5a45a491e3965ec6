pub mod filter;
pub mod prompt;
pub mod retrieval;

pub use filter::{filter, DEFAULT_BLOCKLIST};
pub use retrieval::{RagError, RetrievalPipeline};
