use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::config::{AppPaths, Settings};
use crate::llm::{GeminiProvider, LlmProvider};
use crate::post::PostService;
use crate::rag::SimilarityIndex;
use crate::tools::{Tool, WebLookupTool};

/// Process-lifetime state: provider connections, the read-only similarity
/// index, and the post service built over them. Per-request state (agent
/// transcript) lives inside `PostService::generate_post`.
pub struct AppState {
    pub paths: AppPaths,
    pub settings: Settings,
    pub index: Arc<SimilarityIndex>,
    pub service: PostService,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Index construction failure is fatal to startup; there is no
    /// per-request recovery from a corpus that never embedded.
    pub async fn initialize(settings: Settings) -> anyhow::Result<Arc<Self>> {
        let paths = AppPaths::new();

        let provider: Arc<dyn LlmProvider> = Arc::new(GeminiProvider::new(
            settings.google_api_key.clone(),
            settings.chat_model.clone(),
            settings.embed_model.clone(),
        ));

        let index = Arc::new(
            SimilarityIndex::build(provider.clone(), None)
                .await
                .context("Failed to build similarity index")?,
        );

        let tools: Vec<Arc<dyn Tool>> =
            vec![Arc::new(WebLookupTool::new(settings.lookup_timeout_secs))];

        let service = PostService::new(
            provider,
            index.clone(),
            tools,
            settings.agent_max_iterations,
        );

        Ok(Arc::new(AppState {
            paths,
            settings,
            index,
            service,
            started_at: Utc::now(),
        }))
    }
}
