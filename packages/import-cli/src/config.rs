use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use menu_import::{CallPolicy, ImportConfig};

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub model: String,
    pub structured_output: bool,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?,
            openai_base_url: env::var("OPENAI_BASE_URL").ok(),
            model: env::var("MENU_IMPORT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            structured_output: env::var("MENU_IMPORT_STRUCTURED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .context("MENU_IMPORT_STRUCTURED must be true or false")?,
            timeout: Duration::from_secs(
                env::var("MENU_IMPORT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()
                    .context("MENU_IMPORT_TIMEOUT_SECS must be a valid number")?,
            ),
            max_retries: env::var("MENU_IMPORT_MAX_RETRIES")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("MENU_IMPORT_MAX_RETRIES must be a valid number")?,
        })
    }

    /// Pipeline settings derived from this configuration
    pub fn import_config(&self) -> ImportConfig {
        ImportConfig::new()
            .with_model(&self.model)
            .with_structured_output(self.structured_output)
            .with_call_policy(CallPolicy {
                timeout: self.timeout,
                max_retries: self.max_retries,
                ..CallPolicy::default()
            })
    }
}
