//! Configuration types for the import pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard cap on extracted document text, in characters.
pub const MAX_TEXT_CHARS: usize = 200_000;

/// Configuration for the import pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Maximum characters kept from a decoded document.
    ///
    /// Longer text is truncated and flagged. Default: 200,000.
    pub max_text_chars: usize,

    /// Maximum characters per model call.
    ///
    /// Text longer than this is split on line boundaries. Default: 200,000.
    pub chunk_chars: usize,

    /// Model identifier passed to the text generator.
    pub model: String,

    /// Prefer schema-validated structured output when the model supports it.
    ///
    /// When false, or when the generator reports no support for the model,
    /// the chat call is used and its text parsed. Default: true.
    pub structured_output: bool,

    /// Timeout and retry behaviour for every model call.
    pub call_policy: CallPolicy,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_text_chars: MAX_TEXT_CHARS,
            chunk_chars: MAX_TEXT_CHARS,
            model: "gpt-4o".to_string(),
            structured_output: true,
            call_policy: CallPolicy::default(),
        }
    }
}

impl ImportConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Enable or disable structured output.
    pub fn with_structured_output(mut self, enabled: bool) -> Self {
        self.structured_output = enabled;
        self
    }

    /// Set the per-call chunk size.
    pub fn with_chunk_chars(mut self, chars: usize) -> Self {
        self.chunk_chars = chars.max(1);
        self
    }

    /// Set the document text cap.
    pub fn with_max_text_chars(mut self, chars: usize) -> Self {
        self.max_text_chars = chars;
        self
    }

    /// Set the model call policy.
    pub fn with_call_policy(mut self, policy: CallPolicy) -> Self {
        self.call_policy = policy;
        self
    }
}

/// Timeout and retry policy for model calls.
///
/// Each attempt is bounded by `timeout`. Timeouts and AI service errors
/// are retried up to `max_retries` times, sleeping `retry_backoff`
/// (doubled per attempt) in between.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl CallPolicy {
    /// A policy with no retries.
    pub fn no_retry(timeout: Duration) -> Self {
        Self {
            timeout,
            max_retries: 0,
            retry_backoff: Duration::ZERO,
        }
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_backoff.saturating_mul(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.max_text_chars, 200_000);
        assert_eq!(config.chunk_chars, 200_000);
        assert!(config.structured_output);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = CallPolicy {
            timeout: Duration::from_secs(1),
            max_retries: 3,
            retry_backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(400));
    }
}
