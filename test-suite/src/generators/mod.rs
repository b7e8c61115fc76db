//! Content Stream Generators
//!
//! This module provides utilities for generating test content streams
//! programmatically, both well-formed and deliberately broken.

pub mod content_builder;
pub mod malformed;

pub use content_builder::ContentBuilder;
pub use malformed::Mutation;
