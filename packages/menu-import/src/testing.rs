//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the import library
//! without making real model calls.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{ImportError, Result};
use crate::traits::ai::{ModelRequest, Role, TextGenerator};

/// A mock text generator for testing.
///
/// Responses are queued and consumed in order, one per call. When the
/// queue is empty every call returns an empty menu. Clones share the
/// queue and the call log.
#[derive(Clone, Default)]
pub struct MockGenerator {
    responses: Arc<RwLock<VecDeque<MockResponse>>>,

    /// Whether `supports_structured_output` reports true
    structured_support: bool,

    /// Delay applied to every call (after it is recorded)
    delay: Option<Duration>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockGeneratorCall>>>,
}

/// A canned response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    Structured(Value),
    Fail(String),
}

/// Which trait method was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMode {
    Text,
    Structured,
}

/// Record of a call made to the mock generator.
#[derive(Debug, Clone)]
pub struct MockGeneratorCall {
    pub mode: MockMode,
    pub model: String,
    pub user_prompt: String,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a free-text response.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.push(MockResponse::Text(text.into()))
    }

    /// Queue a structured (JSON value) response.
    pub fn with_structured(self, value: Value) -> Self {
        self.push(MockResponse::Structured(value))
    }

    /// Queue a failing call.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(MockResponse::Fail(message.into()))
    }

    pub fn with_structured_support(mut self, supported: bool) -> Self {
        self.structured_support = supported;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockGeneratorCall> {
        self.calls.read().unwrap().clone()
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn push(self, response: MockResponse) -> Self {
        self.responses.write().unwrap().push_back(response);
        self
    }

    async fn respond(&self, mode: MockMode, request: &ModelRequest) -> MockResponse {
        self.calls.write().unwrap().push(MockGeneratorCall {
            mode,
            model: request.model.clone(),
            user_prompt: request.content_for(Role::User).to_string(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .write()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockResponse::Structured(empty_menu()))
    }
}

fn empty_menu() -> Value {
    json!({ "categories": [], "optionGroups": [], "confidence": 0.0 })
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn supports_structured_output(&self, _model: &str) -> bool {
        self.structured_support
    }

    async fn generate_text(&self, request: &ModelRequest) -> Result<String> {
        match self.respond(MockMode::Text, request).await {
            MockResponse::Text(text) => Ok(text),
            MockResponse::Structured(value) => Ok(value.to_string()),
            MockResponse::Fail(message) => Err(ImportError::ai(message)),
        }
    }

    async fn generate_structured(&self, request: &ModelRequest, _schema: &Value) -> Result<Value> {
        match self.respond(MockMode::Structured, request).await {
            MockResponse::Text(text) => Ok(serde_json::from_str(&text)?),
            MockResponse::Structured(value) => Ok(value),
            MockResponse::Fail(message) => Err(ImportError::ai(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_responses_are_consumed_in_order() {
        let generator = MockGenerator::new().with_text("first").with_failure("boom");
        let request = ModelRequest::new("gpt-4o", "system", "user prompt");

        assert_eq!(generator.generate_text(&request).await.unwrap(), "first");
        assert!(generator.generate_text(&request).await.is_err());

        // Queue exhausted: empty menu
        let fallback = generator.generate_structured(&request, &Value::Null).await.unwrap();
        assert_eq!(fallback["categories"], json!([]));

        let calls = generator.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].user_prompt, "user prompt");
        assert_eq!(calls[2].mode, MockMode::Structured);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let generator = MockGenerator::new().with_text("only once");
        let clone = generator.clone();
        let request = ModelRequest::new("m", "s", "u");

        clone.generate_text(&request).await.unwrap();
        assert_eq!(generator.calls().len(), 1);

        generator.clear_calls();
        assert!(clone.calls().is_empty());
    }
}
