//! Extraction pipeline - document text in, validated menu out.
//!
//! The pipeline orchestrates:
//! - Injection sanitizing of the input text
//! - Line-bounded chunking
//! - One model call per chunk (structured or chat mode)
//! - Decoding, normalization and the reference guard
//! - Merging chunk results and filtering the output

pub mod chunk;
pub mod context;
pub mod extract;
pub mod merge;
pub mod normalize;
pub mod parse;
pub mod prompts;

pub use chunk::split_into_chunks;
pub use context::ExtractionRun;
pub use extract::MenuExtractor;
pub use merge::merge_chunks;
pub use normalize::{guard_references, normalize_extraction, title_case};
pub use parse::{strip_code_fences, ModelResponse};
pub use prompts::{format_user_prompt, SYSTEM_PROMPT};
