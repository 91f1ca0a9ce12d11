//! Agent tool capabilities.
//!
//! Tools are registered with the reasoning agent by name; the loop stays
//! unchanged when new tools are added.

mod web_lookup;

use async_trait::async_trait;

pub use web_lookup::WebLookupTool;

/// A capability the agent may invoke during its reasoning loop.
///
/// `invoke` is infallible by contract: implementations degrade to a fallback
/// string instead of erroring, so a tool failure never unwinds the loop.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn invoke(&self, query: &str) -> String;
}
