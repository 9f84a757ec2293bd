//! OpenAI implementation of the text generator.
//!
//! Talks to the chat-completions endpoint directly. Structured mode sends a
//! strict `json_schema` response format.
//!
//! # Example
//!
//! ```rust,ignore
//! use menu_import::ai::OpenAiGenerator;
//!
//! let generator = OpenAiGenerator::new("sk-...");
//! let extractor = MenuExtractor::new(generator);
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ImportError, Result};
use crate::traits::ai::{ChatMessage, ModelRequest, TextGenerator};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Schema name sent with structured requests.
const SCHEMA_NAME: &str = "extracted_menu";

/// OpenAI-backed text generator.
#[derive(Clone)]
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    /// Model id prefixes that support strict structured output
    structured_models: Vec<String>,
}

impl OpenAiGenerator {
    /// Create a new generator with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            structured_models: vec![
                "gpt-4o".to_string(),
                "gpt-4.1".to_string(),
                "o3".to_string(),
                "o4".to_string(),
            ],
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ImportError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the model prefixes treated as structured-output capable.
    pub fn with_structured_models<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.structured_models = prefixes.into_iter().map(Into::into).collect();
        self
    }

    async fn post_chat(&self, body: &ChatRequest<'_>) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ImportError::Ai(e.to_string().into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ImportError::ai(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ImportError::Ai(e.to_string().into()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ImportError::ai("No response from OpenAI"))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'static str,
    strict: bool,
    schema: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn supports_structured_output(&self, model: &str) -> bool {
        self.structured_models
            .iter()
            .any(|prefix| model.starts_with(prefix.as_str()))
    }

    async fn generate_text(&self, request: &ModelRequest) -> Result<String> {
        let body = ChatRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: 0.0,
            response_format: None,
        };
        self.post_chat(&body).await
    }

    async fn generate_structured(
        &self,
        request: &ModelRequest,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let body = ChatRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: 0.0,
            response_format: Some(ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: SCHEMA_NAME,
                    strict: true,
                    schema,
                },
            }),
        };

        let content = self.post_chat(&body).await?;
        Ok(serde_json::from_str(&content)?)
    }
}
