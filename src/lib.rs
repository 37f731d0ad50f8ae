#![deny(missing_docs)]

//! Core library for docsift: persona-driven section ranking over PDF collections.

/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Per-page PDF text extraction.
pub mod extraction;
/// Input configuration loading and validation.
pub mod input;
/// Structured logging and tracing setup.
pub mod logging;
/// Run metrics helpers.
pub mod metrics;
/// Result assembly and atomic serialization.
pub mod output;
/// Heading detection, ranking, and refinement pipeline.
pub mod processing;
