use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;

use crate::errors::ApiError;
use crate::llm::LlmProvider;

/// Reference sentences embedded when no external corpus is supplied.
fn default_corpus() -> Vec<String> {
    [
        "AI helps in personalized marketing campaigns and customer segmentation.",
        "Latest trends in AI for digital marketing and social media optimization.",
        "Data-driven marketing strategies using machine learning algorithms.",
        "Content optimization using natural language processing.",
        "Marketing automation and customer journey mapping with AI.",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub text: String,
    /// Cosine similarity against the query (higher = better).
    pub score: f32,
}

/// In-memory nearest-neighbor index over the reference corpus.
///
/// Documents and their embeddings are fixed at construction. Queries embed
/// the input text and rank the corpus by cosine similarity, so concurrent
/// reads need no locking.
pub struct SimilarityIndex {
    provider: Arc<dyn LlmProvider>,
    documents: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

impl SimilarityIndex {
    /// Embed the corpus and build the index. Any embedding failure aborts
    /// construction; a failed index must not be used.
    pub async fn build(
        provider: Arc<dyn LlmProvider>,
        documents: Option<Vec<String>>,
    ) -> Result<Self, ApiError> {
        let documents = documents.unwrap_or_else(default_corpus);
        if documents.is_empty() {
            return Err(ApiError::Internal(
                "Similarity index requires at least one document".to_string(),
            ));
        }

        let embeddings = provider.embed(&documents).await?;
        if embeddings.len() != documents.len() {
            return Err(ApiError::Internal(format!(
                "Embedding count mismatch: {} vectors for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        tracing::info!("Similarity index built over {} documents", documents.len());

        Ok(Self {
            provider,
            documents,
            embeddings,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Return up to `k` documents ordered by non-increasing similarity.
    /// Fewer than `k` results only when the corpus itself is smaller.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<SearchResult>, ApiError> {
        let query_embedding = self
            .provider
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ApiError::Internal("Embedding provider returned no query vector".to_string())
            })?;

        let mut scored: Vec<(usize, f32)> = self
            .embeddings
            .iter()
            .enumerate()
            .map(|(idx, emb)| (idx, cosine_similarity(&query_embedding, emb)))
            .collect();
        scored.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(idx, score)| SearchResult {
                text: self.documents[idx].clone(),
                score,
            })
            .collect())
    }
}

/// Cosine similarity with length-mismatch and zero-norm handling (0.0, never NaN).
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    ((dot / (norm_a * norm_b)).clamp(-1.0, 1.0)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::llm::ChatRequest;

    /// Deterministic embedder: one dimension per keyword, counted on word
    /// boundaries so "campaigns" does not match "ai".
    struct KeywordEmbedder {
        keywords: Vec<&'static str>,
    }

    impl KeywordEmbedder {
        fn new() -> Self {
            Self {
                keywords: vec!["marketing", "ai", "learning", "language"],
            }
        }

        fn embed_one(&self, text: &str) -> Vec<f32> {
            let words: Vec<String> = text
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(|w| w.to_lowercase())
                .collect();
            self.keywords
                .iter()
                .map(|kw| words.iter().filter(|w| w == kw).count() as f32)
                .collect()
        }
    }

    #[async_trait]
    impl LlmProvider for KeywordEmbedder {
        fn name(&self) -> &str {
            "keyword-embedder"
        }

        async fn chat(&self, _request: ChatRequest) -> Result<String, ApiError> {
            Err(ApiError::Internal("chat not supported".to_string()))
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs.iter().map(|text| self.embed_one(text)).collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl LlmProvider for FailingEmbedder {
        fn name(&self) -> &str {
            "failing"
        }

        async fn chat(&self, _request: ChatRequest) -> Result<String, ApiError> {
            Err(ApiError::Provider("down".to_string()))
        }

        async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Err(ApiError::Provider("embedding service down".to_string()))
        }
    }

    #[test]
    fn cosine_is_one_for_identical_vectors() {
        let v = [1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_is_zero_for_orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_handles_mismatch_and_zero_norm() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn build_fails_when_embedding_fails() {
        let result = SimilarityIndex::build(Arc::new(FailingEmbedder), None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn query_orders_by_non_increasing_score() {
        let index = SimilarityIndex::build(Arc::new(KeywordEmbedder::new()), None)
            .await
            .expect("index");

        let results = index.query("AI in marketing", 5).await.expect("query");
        assert_eq!(results.len(), 5);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn query_is_deterministic_across_calls() {
        let index = SimilarityIndex::build(Arc::new(KeywordEmbedder::new()), None)
            .await
            .expect("index");

        let first: Vec<String> = index
            .query("machine learning strategies", 3)
            .await
            .expect("query")
            .into_iter()
            .map(|r| r.text)
            .collect();
        let second: Vec<String> = index
            .query("machine learning strategies", 3)
            .await
            .expect("query")
            .into_iter()
            .map(|r| r.text)
            .collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn marketing_topic_retrieves_marketing_documents() {
        let index = SimilarityIndex::build(Arc::new(KeywordEmbedder::new()), None)
            .await
            .expect("index");

        let results = index.query("AI in marketing", 3).await.expect("query");
        assert_eq!(results.len(), 3);
        for result in &results {
            let lower = result.text.to_lowercase();
            assert!(lower.contains("marketing") || lower.contains("ai"));
            assert!(result.score > 0.0);
        }
    }

    #[tokio::test]
    async fn query_caps_at_corpus_size() {
        let docs = vec!["marketing one".to_string(), "marketing two".to_string()];
        let index = SimilarityIndex::build(Arc::new(KeywordEmbedder::new()), Some(docs))
            .await
            .expect("index");

        let results = index.query("marketing", 10).await.expect("query");
        assert_eq!(results.len(), 2);
    }
}
