//! Model provider implementations.

pub mod schema;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAiGenerator;
pub use schema::StrictSchema;
