use std::sync::Arc;

use crate::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::rag::SimilarityIndex;

const RETRIEVAL_TOP_K: usize = 3;
const GENERATION_TEMPERATURE: f64 = 0.7;

/// The structural template is advisory guidance for the model; the output is
/// returned trimmed but otherwise unvalidated.
const PROMPT_TEMPLATE: &str = r#"Create a professional LinkedIn post following these guidelines:
Topic: {topic}
Tone: {tone}
Target Audience: {audience}

Latest Information to include:
{latest_info}

Additional Context:
{context}

Content Structure:
- Opening:
  - Start with an attention-grabbing hook using emojis and a question or statistic
  - Set up context and establish thought leadership
  - Create urgency around the topic

- Body:
  - Include 3-4 data-backed statistics or insights with source citations
  - Structure in clear 2-3 sentence paragraphs with bullet points
  - Use industry-specific terminology matched to the audience's expertise level
  - Add strategic emojis to highlight key points (2-3 per paragraph)
  - Include real-world examples and case studies
  - Address common pain points and solutions

- Closing:
  - End with a compelling call-to-action
  - Include 2 discussion questions to drive engagement
  - Add 5-6 strategic hashtags (mix of trending, niche, and branded)
  - Provide 3 key takeaways or actionable tips

Formatting Guidelines:
- Length: 1000-2000 characters optimized for the LinkedIn algorithm
- Use strategic line breaks and spacing for readability
- Match the tone precisely to audience expectations
- Front-load key insights in the first 2-3 lines

Summary:
Create a data-driven, highly engaging post that establishes authority while
driving meaningful discussion through strategic formatting."#;

/// Builds the generation prompt and invokes the model exactly once.
pub struct ContentComposer {
    provider: Arc<dyn LlmProvider>,
    index: Arc<SimilarityIndex>,
}

impl ContentComposer {
    pub fn new(provider: Arc<dyn LlmProvider>, index: Arc<SimilarityIndex>) -> Self {
        Self { provider, index }
    }

    /// Retrieval failures and model failures both propagate unmodified;
    /// there is no meaningful fallback for the primary output.
    pub async fn generate(
        &self,
        topic: &str,
        tone: &str,
        audience: &str,
        latest_info: &str,
    ) -> Result<String, ApiError> {
        let results = self.index.query(topic, RETRIEVAL_TOP_K).await?;
        let context = results
            .iter()
            .map(|result| result.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let prompt = fill_template(topic, tone, audience, latest_info, &context);
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(GENERATION_TEMPERATURE);

        let post = self.provider.chat(request).await?;
        Ok(post.trim().to_string())
    }
}

fn fill_template(
    topic: &str,
    tone: &str,
    audience: &str,
    latest_info: &str,
    context: &str,
) -> String {
    PROMPT_TEMPLATE
        .replace("{topic}", topic)
        .replace("{tone}", tone)
        .replace("{audience}", audience)
        .replace("{latest_info}", latest_info)
        .replace("{context}", context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    /// Records the prompt it was given and replies with padded text so the
    /// trim behavior is observable.
    struct RecordingProvider {
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingProvider {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
            let prompt = request.messages.last().unwrap().content.clone();
            self.prompts.lock().unwrap().push(prompt.clone());
            let topic_line = prompt
                .lines()
                .find(|line| line.starts_with("Topic: "))
                .unwrap_or("Topic: unknown")
                .to_string();
            Ok(format!("\n  Generated post about {}  \n", topic_line))
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            // Keyword features on word boundaries, enough to rank the corpus.
            Ok(inputs
                .iter()
                .map(|text| {
                    let words: Vec<String> = text
                        .split(|c: char| !c.is_alphanumeric())
                        .filter(|w| !w.is_empty())
                        .map(|w| w.to_lowercase())
                        .collect();
                    ["marketing", "ai", "learning"]
                        .iter()
                        .map(|kw| words.iter().filter(|w| w == kw).count() as f32)
                        .collect()
                })
                .collect())
        }
    }

    struct FailingChatProvider;

    #[async_trait]
    impl LlmProvider for FailingChatProvider {
        fn name(&self) -> &str {
            "failing-chat"
        }

        async fn chat(&self, _request: ChatRequest) -> Result<String, ApiError> {
            Err(ApiError::Provider("generation backend down".to_string()))
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[test]
    fn template_fill_substitutes_all_fields() {
        let prompt = fill_template("AI", "professional", "marketers", "fresh info", "ctx");
        assert!(prompt.contains("Topic: AI"));
        assert!(prompt.contains("Tone: professional"));
        assert!(prompt.contains("Target Audience: marketers"));
        assert!(prompt.contains("fresh info"));
        assert!(prompt.contains("ctx"));
        assert!(!prompt.contains('{'));
    }

    #[tokio::test]
    async fn generate_embeds_retrieved_context_and_trims() {
        let provider = Arc::new(RecordingProvider::new());
        let index = Arc::new(
            SimilarityIndex::build(provider.clone(), None)
                .await
                .expect("index"),
        );
        let composer = ContentComposer::new(provider.clone(), index);

        let post = composer
            .generate("AI in marketing", "professional", "marketers", "latest info")
            .await
            .expect("generate");

        assert!(post.contains("AI in marketing"));
        assert_eq!(post, post.trim());

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1, "model must be invoked exactly once");
        // Top-3 corpus sentences are concatenated into the context block.
        assert!(prompts[0].contains("marketing"));
    }

    #[tokio::test]
    async fn chat_failure_propagates() {
        let provider = Arc::new(FailingChatProvider);
        let index = Arc::new(
            SimilarityIndex::build(provider.clone(), None)
                .await
                .expect("index"),
        );
        let composer = ContentComposer::new(provider, index);

        let err = composer
            .generate("AI", "casual", "everyone", "info")
            .await
            .expect_err("must fail");
        assert!(matches!(err, ApiError::Provider(_)));
    }
}
