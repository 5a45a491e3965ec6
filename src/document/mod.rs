mod extractor;

pub use extractor::{extract_text, DocumentFormat, ExtractError};
