//! Deterministic providers for offline runs and tests.

use async_trait::async_trait;
use anyhow::Result;

use crate::providers::traits::{Embedder, Generator};

pub const DEFAULT_STUB_DIMENSION: usize = 256;

/// Hashed bag-of-words embedder.
///
/// Lowercased alphanumeric tokens are folded through a small synonym table,
/// hashed (FNV-1a) into `dimension` buckets and L2-normalised. The same text
/// always yields the same vector.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension: dimension.max(1) }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_STUB_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        Ok(hash_embedding(text, self.dimension))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> String {
        format!("hash-bow-{}", self.dimension)
    }
}

pub fn hash_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimension];
    for token in tokenize(text) {
        let bucket = (fnv1a(canonical(&token).as_bytes()) % dimension as u64) as usize;
        vector[bucket] += 1.0;
    }

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn canonical(token: &str) -> &str {
    match token {
        "home" | "remote" | "remotely" | "wfh" => "remote",
        "working" | "works" | "work" => "work",
        "leave" | "vacation" | "holiday" | "holidays" | "pto" => "leave",
        "hours" | "schedule" | "time" => "hours",
        "review" | "reviews" | "appraisal" => "review",
        "complaint" | "complaints" | "grievance" | "grievances" => "grievance",
        "unsafe" | "safety" | "hazard" | "danger" => "safety",
        other => other,
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Answers with the context block of the prompt it is given.
#[derive(Debug, Clone, Default)]
pub struct ExtractiveGenerator;

#[async_trait]
impl Generator for ExtractiveGenerator {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Vec<String>> {
        let context = prompt
            .lines()
            .find_map(|line| line.strip_prefix("Context:"))
            .unwrap_or("")
            .trim();

        let answer = context
            .split_whitespace()
            .take(max_tokens as usize)
            .collect::<Vec<_>>()
            .join(" ");

        Ok(vec![answer])
    }

    fn model_name(&self) -> String {
        "extractive".to_string()
    }
}
