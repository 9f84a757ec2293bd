//! Import jobs: lifecycle, apply phase and category ordering.

mod apply;
pub mod orchestrator;
pub mod sort_key;

pub use orchestrator::{ImportDeps, ImportJobOrchestrator};
pub use sort_key::{next_sort_key, INITIAL_SORT_KEY};
