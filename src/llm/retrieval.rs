use std::sync::Arc;

use thiserror::Error;

use crate::config::RagConfig;
use crate::corpus::{Corpus, CorpusError, DocumentId, RetrievedDocument};
use crate::document::{extract_text, DocumentFormat, ExtractError};
use crate::llm::filter::{filter, DEFAULT_BLOCKLIST};
use crate::llm::prompt::{build_context, build_prompt};
use crate::providers::traits::{Embedder, Generator};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RagError {
    #[error("Document has no readable text")]
    EmptyDocument,
    #[error("Query is empty")]
    EmptyQuery,
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Document {0} not found")]
    NotFound(DocumentId),
    #[error("Upstream model call failed: {0}")]
    UpstreamFailure(String),
}

impl RagError {
    /// Errors the caller can fix by changing their input.
    pub fn is_user_error(&self) -> bool {
        matches!(self, RagError::EmptyDocument | RagError::EmptyQuery)
    }
}

impl From<CorpusError> for RagError {
    fn from(err: CorpusError) -> Self {
        match err {
            CorpusError::EmptyDocument => RagError::EmptyDocument,
            CorpusError::DimensionMismatch { expected, actual } => {
                log::error!("Corpus rejected vector: expected {} dimensions, got {}", expected, actual);
                RagError::DimensionMismatch { expected, actual }
            }
            CorpusError::NotFound(id) => {
                log::error!("Index returned id {} with no stored document", id);
                RagError::NotFound(id)
            }
        }
    }
}

impl From<ExtractError> for RagError {
    fn from(err: ExtractError) -> Self {
        log::warn!("Text extraction failed: {}", err);
        RagError::EmptyDocument
    }
}

/// Embeds, stores and retrieves documents, and answers questions over them.
pub struct RetrievalPipeline {
    corpus: Arc<Corpus>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    top_k: usize,
    max_new_tokens: u32,
}

impl RetrievalPipeline {
    /// Wrap an existing corpus. Fails if the embedder's output size differs
    /// from the corpus dimension.
    pub fn new(
        corpus: Arc<Corpus>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: &RagConfig,
    ) -> Result<Self, RagError> {
        if corpus.dimension() != embedder.dimension() {
            log::error!(
                "Embedder {} produces {} dimensions but the corpus holds {}",
                embedder.model_name(),
                embedder.dimension(),
                corpus.dimension()
            );
            return Err(RagError::DimensionMismatch {
                expected: corpus.dimension(),
                actual: embedder.dimension(),
            });
        }

        Ok(Self {
            corpus,
            embedder,
            generator,
            top_k: config.top_k,
            max_new_tokens: config.max_new_tokens,
        })
    }

    /// Build a fresh corpus sized for `embedder` and ingest `seeds` into it.
    pub async fn seeded<S: AsRef<str>>(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: &RagConfig,
        seeds: &[S],
    ) -> Result<Self, RagError> {
        let corpus = Arc::new(Corpus::new(embedder.dimension()));
        let pipeline = Self::new(corpus, embedder, generator, config)?;

        for seed in seeds {
            pipeline.ingest(seed.as_ref()).await?;
        }
        log::info!(
            "Corpus seeded with {} documents ({} dimensions, embedder {}, generator {})",
            pipeline.corpus.len(),
            pipeline.corpus.dimension(),
            pipeline.embedder.model_name(),
            pipeline.generator.model_name()
        );

        Ok(pipeline)
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Add one document and return its id.
    pub async fn ingest(&self, raw_text: &str) -> Result<DocumentId, RagError> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Err(RagError::EmptyDocument);
        }

        let embedding = self.embed(text).await?;
        let id = self.corpus.insert(text, embedding)?;

        log::info!("Indexed document {} ({} chars)", id, text.chars().count());
        Ok(id)
    }

    /// Extract text from an uploaded file and ingest it.
    pub async fn ingest_bytes(&self, bytes: &[u8], format: DocumentFormat) -> Result<DocumentId, RagError> {
        // PDF parsing is CPU-bound and may panic on malformed input.
        let owned = bytes.to_vec();
        let text = tokio::task::spawn_blocking(move || extract_text(&owned, format))
            .await
            .map_err(|e| {
                log::warn!("Text extraction aborted: {}", e);
                RagError::EmptyDocument
            })??;
        self.ingest(&text).await
    }

    /// The `top_k` documents closest to `query`, most relevant first.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDocument>, RagError> {
        let normalized = query.trim();
        if normalized.is_empty() {
            return Err(RagError::EmptyQuery);
        }

        let embedding = self.embed(normalized).await?;
        let documents = self.corpus.retrieve(&embedding, top_k)?;

        log::debug!(
            "Retrieved {:?} for query {:?}",
            documents.iter().map(|d| d.id).collect::<Vec<_>>(),
            normalized
        );
        Ok(documents)
    }

    /// Answer using the configured number of context documents.
    pub async fn answer(&self, query: &str) -> Result<String, RagError> {
        self.answer_with(query, self.top_k).await
    }

    pub async fn answer_with(&self, query: &str, top_k: usize) -> Result<String, RagError> {
        let documents = self.retrieve(query, top_k).await?;

        let context = build_context(&documents);
        // The prompt carries the question exactly as asked.
        let prompt = build_prompt(query, &context);

        let completions = self.generator
            .complete(&prompt, self.max_new_tokens)
            .await
            .map_err(|e| {
                log::error!("Generator {} failed: {:#}", self.generator.model_name(), e);
                RagError::UpstreamFailure(e.to_string())
            })?;

        let first = completions.into_iter().next().ok_or_else(|| {
            log::error!("Generator {} returned no completions", self.generator.model_name());
            RagError::UpstreamFailure("generator returned no completions".to_string())
        })?;

        Ok(filter(first.trim(), DEFAULT_BLOCKLIST))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let embedding = self.embedder.encode(text).await.map_err(|e| {
            log::error!("Embedder {} failed: {:#}", self.embedder.model_name(), e);
            RagError::UpstreamFailure(e.to_string())
        })?;

        let expected = self.corpus.dimension();
        if embedding.len() != expected {
            log::error!(
                "Embedder {} returned {} dimensions, corpus expects {}",
                self.embedder.model_name(),
                embedding.len(),
                expected
            );
            return Err(RagError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::SEED_DOCUMENTS;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// One axis per policy topic plus a constant bias axis.
    const TOPICS: &[&[&str]] = &[
        &["remote", "home"],
        &["leave", "vacation"],
        &["hours"],
        &["review"],
        &["grievance"],
        &["software"],
        &["safety", "unsafe"],
    ];

    #[derive(Default)]
    struct KeywordEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn encode(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let lower = text.to_lowercase();
            let mut v: Vec<f32> = TOPICS
                .iter()
                .map(|words| if words.iter().any(|w| lower.contains(w)) { 1.0 } else { 0.0 })
                .collect();
            v.push(0.1);
            Ok(v)
        }

        fn dimension(&self) -> usize {
            TOPICS.len() + 1
        }

        fn model_name(&self) -> String {
            "keyword".to_string()
        }
    }

    /// Records every prompt and answers with a fixed string.
    struct RecordingGenerator {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingGenerator {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<Vec<String>> {
            self.prompts.lock().push(prompt.to_string());
            Ok(vec![self.reply.clone(), "ignored second completion".to_string()])
        }

        fn model_name(&self) -> String {
            "recording".to_string()
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn encode(&self, _text: &str) -> Result<Vec<f32>> {
            Err(anyhow!("connection reset"))
        }

        fn dimension(&self) -> usize {
            TOPICS.len() + 1
        }

        fn model_name(&self) -> String {
            "failing".to_string()
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn encode(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        fn dimension(&self) -> usize {
            TOPICS.len() + 1
        }

        fn model_name(&self) -> String {
            "short".to_string()
        }
    }

    struct SilentGenerator;

    #[async_trait]
    impl Generator for SilentGenerator {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn model_name(&self) -> String {
            "silent".to_string()
        }
    }

    async fn seeded_with(generator: Arc<dyn Generator>) -> RetrievalPipeline {
        RetrievalPipeline::seeded(
            Arc::new(KeywordEmbedder::default()),
            generator,
            &RagConfig::default(),
            SEED_DOCUMENTS,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_seeding_fills_corpus() {
        let pipeline = seeded_with(Arc::new(RecordingGenerator::new("ok"))).await;
        assert_eq!(pipeline.corpus().len(), SEED_DOCUMENTS.len());
        assert_eq!(pipeline.corpus().document(2).unwrap(), SEED_DOCUMENTS[2]);
    }

    #[tokio::test]
    async fn test_ingest_empty_rejected_without_embedding() {
        let embedder = Arc::new(KeywordEmbedder::default());
        let pipeline = RetrievalPipeline::seeded(
            embedder.clone(),
            Arc::new(RecordingGenerator::new("ok")),
            &RagConfig::default(),
            SEED_DOCUMENTS,
        )
        .await
        .unwrap();
        let calls_before = embedder.calls.load(Ordering::SeqCst);

        assert_eq!(pipeline.ingest("").await, Err(RagError::EmptyDocument));
        assert_eq!(pipeline.ingest(" \n\t").await, Err(RagError::EmptyDocument));

        assert_eq!(pipeline.corpus().len(), SEED_DOCUMENTS.len());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_before);
    }

    #[tokio::test]
    async fn test_ingested_document_is_retrieved() {
        let generator = Arc::new(RecordingGenerator::new("Yes, with approval."));
        let pipeline = seeded_with(generator.clone()).await;

        let id = pipeline.ingest("  Remote work requires approval. ").await.unwrap();
        assert_eq!(id, SEED_DOCUMENTS.len());
        assert_eq!(pipeline.corpus().len(), SEED_DOCUMENTS.len() + 1);
        assert_eq!(pipeline.corpus().document(id).unwrap(), "Remote work requires approval.");

        let docs = pipeline.retrieve("Can I work from home?", 2).await.unwrap();
        assert!(docs.iter().any(|d| d.id == id));

        pipeline.answer("Can I work from home?").await.unwrap();
        let prompts = generator.prompts.lock();
        assert!(prompts[0].contains("Remote work requires approval."));
    }

    #[tokio::test]
    async fn test_prompt_uses_untrimmed_query_and_rank_order() {
        let generator = Arc::new(RecordingGenerator::new("answer"));
        let pipeline = seeded_with(generator.clone()).await;

        pipeline.answer("  How much paid leave do I get?  ").await.unwrap();

        let prompts = generator.prompts.lock();
        let expected_context = format!("{} {}", SEED_DOCUMENTS[0], SEED_DOCUMENTS[1]);
        assert_eq!(
            prompts[0],
            format!(
                "Question:   How much paid leave do I get?  \nContext: {}\nAnswer:",
                expected_context
            )
        );
    }

    #[tokio::test]
    async fn test_answer_is_trimmed_and_filtered() {
        let pipeline = seeded_with(Arc::new(RecordingGenerator::new("  badword1 policy applies. \n"))).await;
        let answer = pipeline.answer("leave?").await.unwrap();
        assert_eq!(answer, "**** policy applies.");
    }

    #[tokio::test]
    async fn test_answer_is_repeatable() {
        let pipeline = seeded_with(Arc::new(RecordingGenerator::new("Twenty days."))).await;
        let first = pipeline.answer("How many vacation days?").await.unwrap();
        let second = pipeline.answer("How many vacation days?").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let generator = Arc::new(RecordingGenerator::new("unused"));
        let pipeline = seeded_with(generator.clone()).await;
        assert_eq!(pipeline.answer("   ").await, Err(RagError::EmptyQuery));
        assert!(generator.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_top_k_beyond_corpus_returns_everything() {
        let pipeline = seeded_with(Arc::new(RecordingGenerator::new("ok"))).await;
        let docs = pipeline.retrieve("anything", 100).await.unwrap();
        assert_eq!(docs.len(), SEED_DOCUMENTS.len());
    }

    #[tokio::test]
    async fn test_upstream_failures_abort() {
        let corpus = Arc::new(Corpus::new(TOPICS.len() + 1));
        let pipeline = RetrievalPipeline::new(
            corpus.clone(),
            Arc::new(FailingEmbedder),
            Arc::new(RecordingGenerator::new("unused")),
            &RagConfig::default(),
        )
        .unwrap();

        assert!(matches!(pipeline.ingest("text").await, Err(RagError::UpstreamFailure(_))));
        assert!(matches!(pipeline.answer("question").await, Err(RagError::UpstreamFailure(_))));
        assert!(corpus.is_empty());

        let pipeline = seeded_with(Arc::new(SilentGenerator)).await;
        assert!(matches!(pipeline.answer("leave").await, Err(RagError::UpstreamFailure(_))));
    }

    #[tokio::test]
    async fn test_dimension_checks() {
        let corpus = Arc::new(Corpus::new(3));
        let err = RetrievalPipeline::new(
            corpus,
            Arc::new(KeywordEmbedder::default()),
            Arc::new(RecordingGenerator::new("unused")),
            &RagConfig::default(),
        )
        .err()
        .unwrap();
        assert_eq!(err, RagError::DimensionMismatch { expected: 3, actual: TOPICS.len() + 1 });

        let corpus = Arc::new(Corpus::new(TOPICS.len() + 1));
        let pipeline = RetrievalPipeline::new(
            corpus.clone(),
            Arc::new(ShortEmbedder),
            Arc::new(RecordingGenerator::new("unused")),
            &RagConfig::default(),
        )
        .unwrap();
        assert!(matches!(pipeline.ingest("text").await, Err(RagError::DimensionMismatch { .. })));
        assert!(corpus.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_bytes_maps_extraction_failures() {
        let pipeline = seeded_with(Arc::new(RecordingGenerator::new("ok"))).await;
        assert_eq!(
            pipeline.ingest_bytes(b"   ", DocumentFormat::PlainText).await,
            Err(RagError::EmptyDocument)
        );
        let id = pipeline
            .ingest_bytes(b"Safety shoes are required in the warehouse.", DocumentFormat::PlainText)
            .await
            .unwrap();
        assert_eq!(id, SEED_DOCUMENTS.len());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_queries_and_ingestion() {
        let pipeline = Arc::new(seeded_with(Arc::new(RecordingGenerator::new("ok"))).await);

        let mut handles = Vec::new();
        for i in 0..8 {
            let pipeline = Arc::clone(&pipeline);
            handles.push(tokio::spawn(async move {
                pipeline.ingest(&format!("Remote policy addendum {}", i)).await.unwrap();
            }));
        }
        for _ in 0..16 {
            let pipeline = Arc::clone(&pipeline);
            handles.push(tokio::spawn(async move {
                pipeline.answer("Can I work from home?").await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(pipeline.corpus().len(), SEED_DOCUMENTS.len() + 8);
    }

    #[test]
    fn test_user_errors_are_input_problems_only() {
        assert!(RagError::EmptyQuery.is_user_error());
        assert!(RagError::EmptyDocument.is_user_error());
        assert!(!RagError::UpstreamFailure("down".to_string()).is_user_error());
        assert!(!RagError::NotFound(3).is_user_error());
        assert!(!RagError::DimensionMismatch { expected: 4, actual: 2 }.is_user_error());
    }
}
