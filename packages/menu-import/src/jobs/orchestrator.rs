//! Import job lifecycle.
//!
//! ```text
//! PROCESSING ──extract──▶ READY ──apply──▶ COMPLETED
//!      │                    │
//!      └──────▶ FAILED ◀────┘
//! ```
//!
//! Extraction failures are recorded on the job and swallowed. Apply
//! failures are recorded on the job and returned to the caller.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::diff::compare_menus;
use crate::document::extract_document;
use crate::error::{ImportError, Result};
use crate::pipeline::{ExtractionRun, MenuExtractor};
use crate::traits::ai::TextGenerator;
use crate::traits::store::{BlobStore, JobStore, MenuStore};
use crate::types::comparison::MenuComparisonData;
use crate::types::config::ImportConfig;
use crate::types::job::{ApplyResult, ApplySelection, FileType, ImportJob, JobStatus, JobStatusView};
use crate::types::menu::{vat_code_map, MatchingContext};

use super::apply::apply_selections;

/// Collaborators the orchestrator depends on.
#[derive(Clone)]
pub struct ImportDeps {
    pub blobs: Arc<dyn BlobStore>,
    pub menus: Arc<dyn MenuStore>,
    pub jobs: Arc<dyn JobStore>,
    pub generator: Arc<dyn TextGenerator>,
}

impl ImportDeps {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        menus: Arc<dyn MenuStore>,
        jobs: Arc<dyn JobStore>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            blobs,
            menus,
            jobs,
            generator,
        }
    }

    /// Use one store for blobs, menus and jobs.
    pub fn with_store<S>(store: Arc<S>, generator: Arc<dyn TextGenerator>) -> Self
    where
        S: BlobStore + MenuStore + JobStore + 'static,
    {
        Self {
            blobs: store.clone(),
            menus: store.clone(),
            jobs: store,
            generator,
        }
    }
}

/// Drives import jobs from upload to applied menu changes.
#[derive(Clone)]
pub struct ImportJobOrchestrator {
    deps: ImportDeps,
    config: ImportConfig,
}

impl ImportJobOrchestrator {
    pub fn new(deps: ImportDeps) -> Self {
        Self {
            deps,
            config: ImportConfig::default(),
        }
    }

    pub fn with_config(deps: ImportDeps, config: ImportConfig) -> Self {
        Self { deps, config }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Record a new job and start extraction in the background.
    ///
    /// Returns as soon as the job is stored; poll [`Self::job_status`]
    /// for the outcome. Must be called from within a Tokio runtime.
    pub async fn create_job(
        &self,
        store_id: &str,
        file_name: &str,
        file_type: &str,
        storage_key: &str,
    ) -> Result<Uuid> {
        let job = ImportJob::new(store_id, file_name, file_type, storage_key);
        let job_id = job.id;
        self.deps.jobs.insert_job(&job).await?;

        info!(job_id = %job_id, store_id, file_name, file_type, "Import job created");

        let orchestrator = self.clone();
        tokio::spawn(async move {
            if let Err(e) = orchestrator.run_extraction(job_id).await {
                error!(job_id = %job_id, error = %e, "Extraction task could not record its outcome");
            }
        });

        Ok(job_id)
    }

    /// Run the extraction phase for a job and persist the outcome.
    ///
    /// A job that is not `Processing` is left untouched. Any failure while
    /// extracting marks the job `Failed` with the error message; only a
    /// failure to load or save the job itself is returned.
    pub async fn run_extraction(&self, job_id: Uuid) -> Result<JobStatus> {
        let mut job = self
            .deps
            .jobs
            .get_job(job_id)
            .await?
            .ok_or(ImportError::JobNotFound { job_id })?;

        if job.status != JobStatus::Processing {
            warn!(job_id = %job_id, status = %job.status, "Extraction requested for job not in PROCESSING, ignoring");
            return Ok(job.status);
        }

        match self.extract_and_compare(&job).await {
            Ok(comparison) => {
                info!(
                    job_id = %job_id,
                    categories = comparison.summary.total_categories,
                    items = comparison.summary.total_items,
                    option_groups = comparison.summary.total_option_groups,
                    "Import job ready for review"
                );
                job.mark_ready(comparison);
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Import extraction failed");
                job.mark_failed(e.to_string());
            }
        }

        self.deps.jobs.update_job(&job).await?;
        Ok(job.status)
    }

    async fn extract_and_compare(&self, job: &ImportJob) -> Result<MenuComparisonData> {
        let file_type: FileType = job.file_type.parse()?;
        let bytes = self.deps.blobs.download(&job.storage_key).await?;
        let document = extract_document(&bytes, file_type, self.config.max_text_chars)?;

        let existing = self.deps.menus.menu_snapshot(&job.store_id).await?;
        let vat_groups = self.deps.menus.vat_groups(&job.store_id).await?;
        let context = MatchingContext::from_menu(&existing, &vat_groups);

        let extractor = MenuExtractor::with_config(self.deps.generator.clone(), self.config.clone());
        let mut run = ExtractionRun::new(Some(job.id));
        let extracted = extractor
            .extract(&document.text, Some(&context), &mut run)
            .await?;

        Ok(compare_menus(
            &extracted,
            &existing,
            &vat_code_map(&vat_groups),
        ))
    }

    /// Current status of a job, for polling.
    pub async fn job_status(&self, store_id: &str, job_id: Uuid) -> Result<JobStatusView> {
        Ok(self.load_owned(store_id, job_id).await?.status_view())
    }

    /// Apply the user's selections from a `Ready` job.
    ///
    /// On success the job becomes `Completed`. On failure it becomes
    /// `Failed` and the error is returned; writes made before the failure
    /// are kept.
    pub async fn apply_changes(
        &self,
        store_id: &str,
        job_id: Uuid,
        selections: &[ApplySelection],
    ) -> Result<ApplyResult> {
        let mut job = self.load_owned(store_id, job_id).await?;

        let comparison = match (&job.status, &job.comparison_data) {
            (JobStatus::Ready, Some(comparison)) => comparison.clone(),
            (status, _) => {
                return Err(ImportError::JobNotReady {
                    job_id,
                    status: *status,
                })
            }
        };

        match apply_selections(self.deps.menus.as_ref(), store_id, &comparison, selections).await {
            Ok(result) => {
                job.mark_completed();
                self.deps.jobs.update_job(&job).await?;
                info!(
                    job_id = %job_id,
                    categories = result.categories,
                    items = result.items,
                    option_groups = result.option_groups,
                    "Import applied"
                );
                Ok(result)
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Import apply failed, earlier writes are kept");
                job.mark_failed(e.to_string());
                if let Err(save_err) = self.deps.jobs.update_job(&job).await {
                    error!(job_id = %job_id, error = %save_err, "Failed to record apply failure");
                }
                Err(e)
            }
        }
    }

    async fn load_owned(&self, store_id: &str, job_id: Uuid) -> Result<ImportJob> {
        let job = self
            .deps
            .jobs
            .get_job(job_id)
            .await?
            .ok_or(ImportError::JobNotFound { job_id })?;

        if job.store_id != store_id {
            return Err(ImportError::StoreOwnershipMismatch {
                job_id,
                store_id: store_id.to_string(),
            });
        }
        Ok(job)
    }
}
