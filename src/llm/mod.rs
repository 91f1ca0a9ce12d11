//! LLM provider abstraction.
//!
//! The service talks to exactly one provider through the `LlmProvider` trait:
//! chat completions for generation and agent reasoning, embeddings for the
//! similarity index. The concrete implementation is `GeminiProvider`.

mod gemini;
mod provider;
mod types;

pub use gemini::GeminiProvider;
pub use provider::LlmProvider;
pub use types::{ChatMessage, ChatRequest};
