//! PDF Content Stream Parser Module
//!
//! This module implements a strict, grammar-driven validator for the operator
//! language of PDF content streams (ISO 32000-1 Section 7.8 and Annex A).
//!
//! The pipeline is `bytes -> lexer -> tokens -> grammar -> parse tree`. The
//! grammar consults the static [`operators`] catalog for every invocation, and
//! the first violation anywhere in the stream aborts the parse.

pub mod grammar;
pub mod lexer;
pub mod listener;
pub mod operands;
pub mod operators;
pub mod stack_safe;
pub mod tree;

pub use self::grammar::ContentParser;
pub use self::lexer::{tokenize, ContentTokenizer, Token, TokenKind};
pub use self::listener::{ErrorCollector, ErrorListener, TracingErrorListener};
pub use self::operands::{Operand, PdfString};
pub use self::operators::{Arity, OperandType, OperatorCategory, OperatorSpec};
pub use self::tree::{walk, ContentStream, Group, Invocation, Node, Production, TreeListener};

use std::fmt;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Half-open byte range `[start, end)` into the content stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Discriminant of a [`ParseError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    Lexical,
    Grammar,
    Arity,
    Type,
}

/// Content stream parse errors
///
/// Every variant is terminal for the stream being parsed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Lexical error at byte {}: {message}", span.start)]
    Lexical { span: Span, message: String },

    #[error("Syntax error at byte {}: expected {expected}, found {found}", span.start)]
    Grammar {
        span: Span,
        expected: String,
        found: String,
    },

    #[error(
        "Operator '{operator}' at byte {} expects {expected} operand(s), found {found}",
        span.start
    )]
    Arity {
        span: Span,
        operator: String,
        expected: String,
        found: usize,
    },

    #[error(
        "Operand {index} of '{operator}' at byte {}: expected {expected}, found {found}",
        span.start
    )]
    Type {
        span: Span,
        operator: String,
        index: usize,
        expected: String,
        found: String,
    },
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Lexical { .. } => ErrorKind::Lexical,
            ParseError::Grammar { .. } => ErrorKind::Grammar,
            ParseError::Arity { .. } => ErrorKind::Arity,
            ParseError::Type { .. } => ErrorKind::Type,
        }
    }

    /// Span of the offending token(s)
    pub fn span(&self) -> Span {
        match self {
            ParseError::Lexical { span, .. }
            | ParseError::Grammar { span, .. }
            | ParseError::Arity { span, .. }
            | ParseError::Type { span, .. } => *span,
        }
    }

    /// Byte offset where the violation starts
    pub fn offset(&self) -> usize {
        self.span().start
    }

    pub(crate) fn lexical(offset: usize, message: impl Into<String>) -> Self {
        ParseError::Lexical {
            span: Span::new(offset, offset + 1),
            message: message.into(),
        }
    }

    pub(crate) fn grammar(
        span: Span,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        ParseError::Grammar {
            span,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Options that tune how strictly a content stream is validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nesting of groups (`q`/`BT`/`BMC`/`BX`) and operand arrays or dictionaries
    pub max_nesting_depth: usize,
    /// Accept unknown operators inside `BX`...`EX` compatibility sections
    pub allow_compatibility_operators: bool,
    /// Implicitly close `q` blocks still open at end of stream
    pub allow_unclosed_state_blocks: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: 28,
            allow_compatibility_operators: true,
            allow_unclosed_state_blocks: false,
        }
    }
}

impl ParseOptions {
    /// Archival profile: undefined operators are never accepted
    pub fn strict() -> Self {
        Self {
            allow_compatibility_operators: false,
            ..Self::default()
        }
    }

    /// Tolerant profile for streams split across several page content streams
    pub fn lenient() -> Self {
        Self {
            max_nesting_depth: stack_safe::MAX_RECURSION_DEPTH,
            allow_compatibility_operators: true,
            allow_unclosed_state_blocks: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ParseError::Arity {
            span: Span::new(6, 7),
            operator: "c".to_string(),
            expected: "6".to_string(),
            found: 3,
        };
        assert_eq!(
            error.to_string(),
            "Operator 'c' at byte 6 expects 6 operand(s), found 3"
        );
        assert_eq!(error.kind(), ErrorKind::Arity);
        assert_eq!(error.offset(), 6);
    }

    #[test]
    fn test_grammar_error_display() {
        let error = ParseError::grammar(Span::new(0, 6), "'Do'", "'Scooby'");
        assert_eq!(
            error.to_string(),
            "Syntax error at byte 0: expected 'Do', found 'Scooby'"
        );
        assert_eq!(error.kind(), ErrorKind::Grammar);
    }

    #[test]
    fn test_span_union() {
        let span = Span::new(4, 6).to(Span::new(0, 2));
        assert_eq!(span, Span::new(0, 6));
        assert_eq!(span.len(), 6);
        assert!(!span.is_empty());
        assert_eq!(span.to_string(), "0..6");
    }

    #[test]
    fn test_option_profiles() {
        let default = ParseOptions::default();
        assert_eq!(default.max_nesting_depth, 28);
        assert!(default.allow_compatibility_operators);
        assert!(!default.allow_unclosed_state_blocks);

        assert!(!ParseOptions::strict().allow_compatibility_operators);

        let lenient = ParseOptions::lenient();
        assert!(lenient.allow_unclosed_state_blocks);
        assert!(lenient.max_nesting_depth > default.max_nesting_depth);
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParseError>();
    }
}
