use std::sync::Arc;

use serde::Deserialize;

use super::composer::ContentComposer;
use crate::agent::ReasoningAgent;
use crate::errors::ApiError;
use crate::llm::LlmProvider;
use crate::rag::SimilarityIndex;
use crate::tools::Tool;

pub const REQUIRED_FIELDS_MESSAGE: &str = "Topic, tone, and audience are required";

/// Inbound generation request. Missing fields deserialize to empty strings so
/// validation owns the error message; extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub audience: String,
}

impl GenerationRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let fields = [&self.topic, &self.tone, &self.audience];
        if fields.iter().any(|field| field.trim().is_empty()) {
            return Err(ApiError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        }
        Ok(())
    }
}

/// Orchestrates retrieval, agent lookup, and composition for one request.
///
/// Process-lifetime state (provider, index, tools) is shared; a fresh agent
/// with fresh transcript memory is created per call.
pub struct PostService {
    provider: Arc<dyn LlmProvider>,
    tools: Vec<Arc<dyn Tool>>,
    composer: ContentComposer,
    agent_max_iterations: usize,
}

impl PostService {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        index: Arc<SimilarityIndex>,
        tools: Vec<Arc<dyn Tool>>,
        agent_max_iterations: usize,
    ) -> Self {
        let composer = ContentComposer::new(provider.clone(), index);
        Self {
            provider,
            tools,
            composer,
            agent_max_iterations,
        }
    }

    /// Validation happens before any provider, tool, or network call. The
    /// lookup step degrades internally; composition failures surface as a
    /// generation error with the cause logged server-side.
    pub async fn generate_post(&self, request: &GenerationRequest) -> Result<String, ApiError> {
        request.validate()?;

        let mut agent = ReasoningAgent::new(
            self.provider.clone(),
            self.tools.clone(),
            self.agent_max_iterations,
        );
        let latest_info = agent.get_latest_info(&request.topic).await;

        match self
            .composer
            .generate(&request.topic, &request.tone, &request.audience, &latest_info)
            .await
        {
            Ok(post) if !post.is_empty() => Ok(post),
            Ok(_) => {
                tracing::error!("Post generation error: model returned empty output");
                Err(ApiError::Generation("empty model output".to_string()))
            }
            Err(err) => {
                tracing::error!("Post generation error: {}", err);
                Err(ApiError::Generation(err.to_string()))
            }
        }
    }
}
