//! Storage implementations for the import library.
//!
//! Available backends:
//! - `MemoryStore` - In-memory blobs, menus and jobs (always available)

pub mod memory;

pub use memory::{MemoryStore, StoredOptionGroup};
