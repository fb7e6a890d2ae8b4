mod client;
pub mod moderation;
pub mod planner;
mod types;

use std::future::Future;

pub use client::{LlmClient, LlmConfig};
pub use moderation::{ContentModeration, ModerationClient, ModerationConfig};
pub use planner::{generate_plan, plan_workflow};
pub use types::*;

/// A chat-completion service. Implemented by [`LlmClient`] and by test doubles.
pub trait ChatBackend: Send + Sync {
    fn model_name(&self) -> &str;

    fn chat(&self, messages: Vec<Message>) -> impl Future<Output = anyhow::Result<ChatResponse>> + Send;
}
