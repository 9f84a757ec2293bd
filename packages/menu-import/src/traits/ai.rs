//! Text generation trait for the model call.
//!
//! The pipeline needs exactly one capability from a model provider: take a
//! system/user message pair and return either free text or a JSON value
//! conforming to a supplied schema.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One model call: a model id and a system/user message pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ModelRequest {
    pub fn new(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)],
        }
    }

    /// Content of the first message with the given role.
    pub fn content_for(&self, role: Role) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Text generation provider.
///
/// Implementations wrap a specific LLM API (OpenAI, a proxy, a mock) and
/// handle the transport. Prompting and parsing stay in the pipeline.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Whether `model` can return schema-validated structured output.
    fn supports_structured_output(&self, model: &str) -> bool {
        let _ = model;
        false
    }

    /// Chat completion returning the assistant's raw text.
    async fn generate_text(&self, request: &ModelRequest) -> Result<String>;

    /// Structured completion returning a JSON value conforming to `schema`.
    async fn generate_structured(
        &self,
        request: &ModelRequest,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    fn supports_structured_output(&self, model: &str) -> bool {
        (**self).supports_structured_output(model)
    }

    async fn generate_text(&self, request: &ModelRequest) -> Result<String> {
        (**self).generate_text(request).await
    }

    async fn generate_structured(
        &self,
        request: &ModelRequest,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        (**self).generate_structured(request, schema).await
    }
}
