//! Error listeners
//!
//! A listener is owned by the caller and lent to a [`ContentParser`]. The
//! parser calls it once for a failed parse, with the error that aborted it.
//!
//! [`ContentParser`]: super::ContentParser

use super::ParseError;

/// Receives the error that aborted a parse
pub trait ErrorListener {
    fn syntax_error(&mut self, error: &ParseError);
}

/// Keeps every reported error for later inspection
#[derive(Debug, Default, Clone)]
pub struct ErrorCollector {
    errors: Vec<ParseError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }
}

impl ErrorListener for ErrorCollector {
    fn syntax_error(&mut self, error: &ParseError) {
        self.errors.push(error.clone());
    }
}

/// Emits a `tracing` warning for every reported error
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorListener;

impl ErrorListener for TracingErrorListener {
    fn syntax_error(&mut self, error: &ParseError) {
        tracing::warn!(
            kind = ?error.kind(),
            offset = error.offset(),
            "invalid content stream: {error}"
        );
    }
}
