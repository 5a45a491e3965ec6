use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDF could not be read: {0}")]
    Pdf(String),
    #[error("File has no readable text")]
    NoText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    PlainText,
}

impl DocumentFormat {
    /// PDF for a `.pdf` name in any case, plain text otherwise.
    pub fn from_filename(name: &str) -> Self {
        if name.to_ascii_lowercase().ends_with(".pdf") {
            DocumentFormat::Pdf
        } else {
            DocumentFormat::PlainText
        }
    }
}

/// Pull the text out of an uploaded file, trimmed.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractError> {
    let text = match format {
        DocumentFormat::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?,
        DocumentFormat::PlainText => decode_dropping_invalid(bytes),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::NoText);
    }
    Ok(text.to_string())
}

/// UTF-8 decode that skips undecodable sequences instead of replacing them.
fn decode_dropping_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                if let Ok(valid) = std::str::from_utf8(valid) {
                    out.push_str(valid);
                }
                match e.error_len() {
                    Some(len) => bytes = &rest[len..],
                    // Truncated sequence at the end of input.
                    None => return out,
                }
            }
        }
    }
}
