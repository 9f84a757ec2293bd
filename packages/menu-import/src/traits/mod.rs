//! Core trait abstractions for the import pipeline.
//!
//! - [`ai::TextGenerator`] - the model call
//! - [`store::BlobStore`] - uploaded file bytes
//! - [`store::MenuStore`] - menu snapshot and entity writes
//! - [`store::JobStore`] - import job records

pub mod ai;
pub mod store;
