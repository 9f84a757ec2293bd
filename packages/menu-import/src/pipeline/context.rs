//! Per-run extraction context.

use std::time::Instant;

use uuid::Uuid;

/// State for one extraction run, threaded through every pipeline step.
///
/// Created by the caller (usually the job orchestrator) and dropped when
/// the run ends. The counters feed the summary log line.
#[derive(Debug, Clone)]
pub struct ExtractionRun {
    pub run_id: Uuid,
    pub job_id: Option<Uuid>,
    pub started: Instant,
    pub suspicious_input: bool,
    pub chunk_count: usize,
    pub parse_failures: usize,
    pub hallucinated_references: usize,
    pub redacted_fields: usize,
}

impl ExtractionRun {
    pub fn new(job_id: Option<Uuid>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            job_id,
            started: Instant::now(),
            suspicious_input: false,
            chunk_count: 0,
            parse_failures: 0,
            hallucinated_references: 0,
            redacted_fields: 0,
        }
    }

    /// A run not tied to a job (CLI dry runs, tests).
    pub fn detached() -> Self {
        Self::new(None)
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }
}
