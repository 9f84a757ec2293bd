//! Restaurant Menu Import Library
//!
//! Turns an uploaded menu document (xlsx, csv, json, md, txt) into a
//! reviewable change-set against a merchant's current menu, then applies
//! the changes the merchant accepts.
//!
//! # Design Philosophy
//!
//! - The model reads the document; the library decides what to trust
//! - Every model-asserted id is checked against ground truth before use
//! - Malformed model output degrades to an empty extraction, never a panic
//! - Diffing is a pure function
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use menu_import::{ImportDeps, ImportJobOrchestrator, MemoryStore};
//! use menu_import::testing::MockGenerator;
//!
//! let store = Arc::new(MemoryStore::new());
//! store.put_blob("uploads/menu.csv", csv_bytes);
//!
//! let deps = ImportDeps::with_store(store, Arc::new(MockGenerator::new()));
//! let orchestrator = ImportJobOrchestrator::new(deps);
//!
//! let job_id = orchestrator
//!     .create_job("store-1", "menu.csv", "csv", "uploads/menu.csv")
//!     .await?;
//! let status = orchestrator.job_status("store-1", job_id).await?;
//! ```
//!
//! # Modules
//!
//! - [`document`] - Bytes to text, per file type, with a global size cap
//! - [`guard`] - Injection sanitizer (input) and content filter (output)
//! - [`pipeline`] - Chunked model extraction, normalization, reference guard, merge
//! - [`diff`] - Create/update/skip classification against the existing menu
//! - [`jobs`] - Job lifecycle and the apply phase
//! - [`traits`] - Collaborator abstractions (TextGenerator, stores)
//! - [`stores`] - In-memory store implementation
//! - [`ai`] - Structured-output schemas and the OpenAI generator
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod diff;
pub mod document;
pub mod error;
pub mod guard;
pub mod jobs;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ImportError, Result};
pub use traits::{
    ai::{ChatMessage, ModelRequest, Role, TextGenerator},
    store::{BlobStore, CategoryWrite, ItemWrite, JobStore, MenuStore, OptionGroupWrite},
};
pub use types::{
    comparison::{
        CategoryComparison, ComparisonSummary, FieldChange, ImportAction, ItemComparison,
        MenuComparisonData, OptionGroupComparison,
    },
    config::{CallPolicy, ImportConfig, MAX_TEXT_CHARS},
    job::{
        ApplyResult, ApplySelection, FileType, ImportJob, JobStatus, JobStatusView,
        SelectionAction, SelectionType,
    },
    menu::{
        vat_code_map, ExistingCategory, ExistingItem, ExistingMenuData, ExistingOptionGroup,
        ExtractedCategory, ExtractedItem, ExtractedMenuData, ExtractedOptionGroup, MatchingContext,
        OptionChoice, OptionGroupType, VatGroup,
    },
};

pub use diff::compare_menus;
pub use document::{extract_document, extract_text, DocumentMetadata, ExtractedDocument};
pub use guard::{filter_extraction, sanitize_input};
pub use jobs::{ImportDeps, ImportJobOrchestrator};
pub use pipeline::{ExtractionRun, MenuExtractor};
pub use stores::MemoryStore;

#[cfg(feature = "openai")]
pub use ai::OpenAiGenerator;
