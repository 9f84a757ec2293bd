//! Input and output guards around the model call.
//!
//! Both are pattern based, best-effort and never fail: on an internal
//! problem they pass text through unmodified and log a warning.

pub mod content;
pub mod injection;

pub use content::{filter_extraction, filter_text, REDACTION_MARKER};
pub use injection::{sanitize_input, SanitizedText, INJECTION_PLACEHOLDER};
