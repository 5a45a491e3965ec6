use std::env;
use std::str::FromStr;

pub const DEFAULT_TOP_K: usize = 2;
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 100;

#[derive(Debug, Clone)]
pub struct RagConfig {
    pub api_base: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    /// Upper bound on generated tokens per answer.
    pub max_new_tokens: u32,
    pub top_k: usize,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimension: 1536,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            top_k: DEFAULT_TOP_K,
            temperature: 0.7,
            request_timeout_secs: 60,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl RagConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_base: env::var("OPENAI_API_BASE").unwrap_or(defaults.api_base),
            chat_model: env::var("RAG_CHAT_MODEL").unwrap_or(defaults.chat_model),
            embedding_model: env::var("RAG_EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            embedding_dimension: parsed_var("RAG_EMBEDDING_DIMENSIONS", defaults.embedding_dimension),
            max_new_tokens: parsed_var("RAG_MAX_NEW_TOKENS", defaults.max_new_tokens),
            top_k: parsed_var("RAG_TOP_K", defaults.top_k),
            temperature: parsed_var("RAG_TEMPERATURE", defaults.temperature),
            request_timeout_secs: parsed_var("RAG_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            max_upload_bytes: parsed_var("RAG_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring {}={:?}: not a valid value", name, raw);
            default
        }),
        Err(_) => default,
    }
}
