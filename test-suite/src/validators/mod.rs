//! Content Validators
//!
//! This module contains validators that replay content streams and corpora
//! against the parser and summarize the outcome.

pub mod content_validator;
pub mod corpus_validator;

pub use content_validator::{ContentValidationReport, ContentValidator};
pub use corpus_validator::{ConformanceReport, CorpusValidator, FixtureFailure};
