//! The menu extractor - turns document text into a validated extraction.

use std::future::Future;

use tracing::{debug, info, warn};

use crate::ai::schema::StrictSchema;
use crate::error::{ImportError, Result};
use crate::guard::{filter_extraction, sanitize_input};
use crate::traits::ai::{ModelRequest, TextGenerator};
use crate::types::config::ImportConfig;
use crate::types::menu::{ExtractedMenuData, KnownReferences, MatchingContext};

use super::chunk::split_into_chunks;
use super::context::ExtractionRun;
use super::merge::merge_chunks;
use super::normalize::{guard_references, normalize_extraction};
use super::parse::ModelResponse;
use super::prompts::{format_user_prompt, SYSTEM_PROMPT};

/// Runs the extraction pipeline against a text generator.
///
/// # Example
///
/// ```rust,ignore
/// let extractor = MenuExtractor::new(generator);
/// let mut run = ExtractionRun::detached();
/// let menu = extractor.extract(&document.text, Some(&context), &mut run).await?;
/// ```
pub struct MenuExtractor<G: TextGenerator> {
    generator: G,
    config: ImportConfig,
}

impl<G: TextGenerator> MenuExtractor<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            config: ImportConfig::default(),
        }
    }

    pub fn with_config(generator: G, config: ImportConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Whether calls go through schema-validated structured output.
    pub fn uses_structured_output(&self) -> bool {
        self.config.structured_output
            && self.generator.supports_structured_output(&self.config.model)
    }

    /// Extract a menu from `text`.
    ///
    /// Steps, in order: sanitize, chunk, one model call per chunk
    /// (sequential), decode, normalize, guard references, merge, then
    /// filter user-visible strings. Without a `context` every model-asserted
    /// reference is discarded.
    ///
    /// Malformed model output never fails the run; it contributes an empty
    /// zero-confidence chunk. Model call failures (after retries) do.
    pub async fn extract(
        &self,
        text: &str,
        context: Option<&MatchingContext>,
        run: &mut ExtractionRun,
    ) -> Result<ExtractedMenuData> {
        let sanitized = sanitize_input(text);
        run.suspicious_input = sanitized.suspicious;

        if sanitized.text.trim().is_empty() {
            info!(run_id = %run.run_id, "Document has no text, skipping model call");
            return Ok(ExtractedMenuData::empty());
        }

        let chunks = split_into_chunks(&sanitized.text, self.config.chunk_chars);
        run.chunk_count = chunks.len();

        let known = context
            .map(MatchingContext::known_references)
            .unwrap_or_else(KnownReferences::default);
        let structured = self.uses_structured_output();
        let schema = structured.then(ExtractedMenuData::strict_schema);

        info!(
            run_id = %run.run_id,
            chunks = chunks.len(),
            structured,
            model = %self.config.model,
            "Starting menu extraction"
        );

        let mut results = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            let request = ModelRequest::new(
                &self.config.model,
                SYSTEM_PROMPT,
                format_user_prompt(chunk, context, index, chunks.len()),
            );

            let response = match &schema {
                Some(schema) => {
                    let value = self
                        .call_with_policy(|| self.generator.generate_structured(&request, schema))
                        .await?;
                    ModelResponse::from_value(value)
                }
                None => {
                    let raw = self
                        .call_with_policy(|| self.generator.generate_text(&request))
                        .await?;
                    ModelResponse::from_text(&raw)
                }
            };

            if response.is_unparseable() {
                run.parse_failures += 1;
                warn!(run_id = %run.run_id, chunk = index, "Unparseable model output, using empty extraction");
            }

            let mut data = response.into_menu();
            normalize_extraction(&mut data);
            run.hallucinated_references += guard_references(&mut data, &known);

            debug!(
                run_id = %run.run_id,
                chunk = index,
                categories = data.categories.len(),
                items = data.item_count(),
                "Chunk extracted"
            );
            results.push(data);
        }

        let mut merged = merge_chunks(results);
        run.redacted_fields = filter_extraction(&mut merged);

        info!(
            run_id = %run.run_id,
            categories = merged.categories.len(),
            items = merged.item_count(),
            option_groups = merged.option_groups.len(),
            confidence = merged.confidence,
            parse_failures = run.parse_failures,
            hallucinated_references = run.hallucinated_references,
            elapsed_ms = run.elapsed_ms() as u64,
            "Menu extraction complete"
        );

        Ok(merged)
    }

    /// Run one model call under the configured timeout and retry policy.
    async fn call_with_policy<T, F, Fut>(&self, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let policy = &self.config.call_policy;
        let mut attempt: u32 = 0;

        loop {
            let outcome = match tokio::time::timeout(policy.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(ImportError::Timeout {
                    attempts: attempt + 1,
                    timeout: policy.timeout,
                }),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                    attempt += 1;
                    let backoff = policy.backoff_for(attempt);
                    warn!(
                        attempt,
                        max_retries = policy.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Model call failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
