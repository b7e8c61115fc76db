//! # pdfcop
//!
//! Syntactic validation of PDF content streams, the front end of a PDF
//! standards-compliance checker.
//!
//! Content streams are the operator/operand language inside page and form
//! objects (`0 0 m 10 10 l S`, `/F1 12 Tf`, `/Im1 Do`). Before any semantic
//! compliance rule can run, the stream must be a syntactically valid sequence
//! of operators with correctly counted, correctly typed operands. A single
//! malformed operator anywhere invalidates the whole stream.
//!
//! ## Features
//!
//! - **Lexer**: numbers, names, literal and hex strings, arrays, inline
//!   dictionaries, comments and inline image data
//! - **Operator Catalog**: every operator of ISO 32000-1 Annex A with its
//!   category, arity and operand types
//! - **Grammar**: recursive descent with one entry point per production
//! - **Typed Errors**: lexical, grammar, arity and type errors with byte spans
//! - **Parse Tree**: grouped invocations with positional operand accessors
//! - **Batch Validation**: independent streams validated in parallel
//!
//! ## Quick Start
//!
//! ```rust
//! use pdfcop::parser::{ContentParser, ErrorKind, Production};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = ContentParser::parse(b"q 1 0 0 1 50 50 cm 0 0 m 100 100 l S Q")?;
//! assert_eq!(stream.operator_count(), 6);
//!
//! for invocation in stream.invocations() {
//!     println!("{} ({} operands)", invocation.operator(), invocation.operands().len());
//! }
//!
//! // A single production can be run on its own
//! let node = ContentParser::parse_as(b"0 1 0 0 K", Production::Cmyk)?;
//! assert_eq!(node.as_invocation().and_then(|k| k.number(1)), Some(1.0));
//!
//! // The first violation aborts the parse
//! let error = ContentParser::parse(b"0 1 2 c").unwrap_err();
//! assert_eq!(error.kind(), ErrorKind::Arity);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod error;
pub mod parser;

pub use batch::{validate_all, BatchOptions, BatchResult};
pub use error::{PdfCopError, Result};
pub use parser::{
    ContentParser, ContentStream, ErrorCollector, ErrorListener, Invocation, Node, Operand,
    ParseError, ParseOptions, Production,
};

/// Current version of pdfcop
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Validates a whole content stream with default options
pub fn validate(content: &[u8]) -> parser::ParseResult<ContentStream> {
    ContentParser::parse(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(validate(b"0 0 m 0 0 l S").is_ok());
        assert!(validate(b"0 0 m 0 0 l N").is_err());
    }
}
