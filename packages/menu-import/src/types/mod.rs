//! Data types for the import pipeline.

pub mod comparison;
pub mod config;
pub mod job;
pub mod menu;
