//! Import job model and apply-phase input/output types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::comparison::MenuComparisonData;
use crate::error::ImportError;

// ============================================================================
// Enums
// ============================================================================

/// Lifecycle of an import job.
///
/// `Processing -> {Ready, Failed}` during extraction and
/// `Ready -> {Completed, Failed}` during apply. `Failed` and `Completed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[default]
    Processing,
    Ready,
    Failed,
    Completed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "PROCESSING",
            JobStatus::Ready => "READY",
            JobStatus::Failed => "FAILED",
            JobStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Xlsx,
    Csv,
    Json,
    Md,
    Txt,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Xlsx => "xlsx",
            FileType::Csv => "csv",
            FileType::Json => "json",
            FileType::Md => "md",
            FileType::Txt => "txt",
        }
    }

    /// Infer the type from a file name's extension.
    pub fn from_file_name(name: &str) -> Result<Self, ImportError> {
        let extension = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        extension.parse()
    }
}

impl FromStr for FileType {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(FileType::Xlsx),
            "csv" => Ok(FileType::Csv),
            "json" => Ok(FileType::Json),
            "md" | "markdown" => Ok(FileType::Md),
            "txt" | "text" => Ok(FileType::Txt),
            _ => Err(ImportError::UnsupportedFileType {
                file_type: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Job Model
// ============================================================================

/// Durable record of one import attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    pub id: Uuid,
    pub store_id: String,
    pub file_name: String,
    /// Declared type as uploaded; validated when extraction runs
    pub file_type: String,
    pub storage_key: String,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub comparison_data: Option<MenuComparisonData>,
    pub created_at: DateTime<Utc>,
}

impl ImportJob {
    /// Create a new job in `Processing`.
    pub fn new(
        store_id: impl Into<String>,
        file_name: impl Into<String>,
        file_type: impl Into<String>,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_id: store_id.into(),
            file_name: file_name.into(),
            file_type: file_type.into(),
            storage_key: storage_key.into(),
            status: JobStatus::Processing,
            error_message: None,
            comparison_data: None,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn mark_ready(&mut self, comparison: MenuComparisonData) {
        self.status = JobStatus::Ready;
        self.error_message = None;
        self.comparison_data = Some(comparison);
    }

    pub(crate) fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error_message = Some(message.into());
    }

    pub(crate) fn mark_completed(&mut self) {
        self.status = JobStatus::Completed;
    }

    /// The polling view of this job.
    pub fn status_view(&self) -> JobStatusView {
        JobStatusView {
            id: self.id,
            status: self.status,
            error_message: self.error_message.clone(),
            comparison_data: self.comparison_data.clone(),
        }
    }
}

/// What a requester sees when polling a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_data: Option<MenuComparisonData>,
}

// ============================================================================
// Apply selections
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionType {
    Category,
    Item,
    OptionGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionAction {
    Apply,
    Skip,
}

/// A user's decision about one compared entity.
///
/// Matched to a comparison entry by `(type, extracted_name)`, exact and
/// case-sensitive against the normalized extracted name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplySelection {
    #[serde(rename = "type")]
    pub selection_type: SelectionType,
    pub extracted_name: String,
    pub action: SelectionAction,
    /// Existing entity the user matched this to, overriding the diff's match
    #[serde(default)]
    pub matched_entity_id: Option<String>,
}

impl ApplySelection {
    pub fn apply(selection_type: SelectionType, extracted_name: impl Into<String>) -> Self {
        Self {
            selection_type,
            extracted_name: extracted_name.into(),
            action: SelectionAction::Apply,
            matched_entity_id: None,
        }
    }

    pub fn skip(selection_type: SelectionType, extracted_name: impl Into<String>) -> Self {
        Self {
            selection_type,
            extracted_name: extracted_name.into(),
            action: SelectionAction::Skip,
            matched_entity_id: None,
        }
    }

    pub fn with_matched_entity(mut self, id: impl Into<String>) -> Self {
        self.matched_entity_id = Some(id.into());
        self
    }
}

/// Counts of entities actually written by an apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    pub categories: usize,
    pub items: usize,
    pub option_groups: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_parsing() {
        assert_eq!("XLSX".parse::<FileType>().unwrap(), FileType::Xlsx);
        assert_eq!("markdown".parse::<FileType>().unwrap(), FileType::Md);
        assert!(matches!(
            "pdf".parse::<FileType>(),
            Err(ImportError::UnsupportedFileType { .. })
        ));
    }

    #[test]
    fn test_file_type_from_file_name() {
        assert_eq!(FileType::from_file_name("menu.final.csv").unwrap(), FileType::Csv);
        assert!(FileType::from_file_name("menu").is_err());
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
        assert!(JobStatus::Completed.is_terminal());
        assert!(!JobStatus::Ready.is_terminal());
    }

    #[test]
    fn test_selection_wire_format() {
        let selection: ApplySelection = serde_json::from_str(
            r#"{"type": "optionGroup", "extractedName": "Toppings", "action": "apply"}"#,
        )
        .unwrap();
        assert_eq!(selection.selection_type, SelectionType::OptionGroup);
        assert_eq!(selection.action, SelectionAction::Apply);
        assert!(selection.matched_entity_id.is_none());
    }

    #[test]
    fn test_new_job_is_processing() {
        let job = ImportJob::new("store-1", "menu.csv", "csv", "uploads/menu.csv");
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.error_message.is_none());
        assert!(job.comparison_data.is_none());
    }
}
