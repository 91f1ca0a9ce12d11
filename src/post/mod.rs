//! Post generation pipeline.
//!
//! `ContentComposer` builds the generation prompt from retrieved context and
//! the agent's latest-info answer; `PostService` orchestrates the whole
//! request and owns error translation.

mod composer;
mod service;

pub use composer::ContentComposer;
pub use service::{GenerationRequest, PostService, REQUIRED_FIELDS_MESSAGE};
