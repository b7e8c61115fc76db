//! Malformed Content Generators
//!
//! Derives deliberately broken streams from valid ones for error handling
//! tests. Each mutation records the error class the parser must report.

use pdfcop::parser::{tokenize, ErrorKind, TokenKind};

/// A single way of breaking a valid stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Remove the last operand before the first fixed-arity operator with operands
    DropOperand,
    /// Add one numeric operand before the first operator that takes none
    ExtraOperand,
    /// Replace the first operator with an undefined keyword
    UnknownOperator,
    /// Cut the stream inside a literal string
    TruncateString,
    /// Append operands with no operator
    TrailingOperands,
}

impl Mutation {
    pub fn all() -> [Mutation; 5] {
        [
            Mutation::DropOperand,
            Mutation::ExtraOperand,
            Mutation::UnknownOperator,
            Mutation::TruncateString,
            Mutation::TrailingOperands,
        ]
    }

    pub fn expected_error(&self) -> ErrorKind {
        match self {
            Mutation::DropOperand | Mutation::ExtraOperand => ErrorKind::Arity,
            Mutation::UnknownOperator | Mutation::TrailingOperands => ErrorKind::Grammar,
            Mutation::TruncateString => ErrorKind::Lexical,
        }
    }

    /// Apply the mutation, or `None` when the stream has no suitable site
    pub fn apply(&self, content: &[u8]) -> Option<Vec<u8>> {
        match self {
            Mutation::DropOperand => drop_operand(content),
            Mutation::ExtraOperand => extra_operand(content),
            Mutation::UnknownOperator => unknown_operator(content),
            Mutation::TruncateString => truncate_string(content),
            Mutation::TrailingOperands => {
                let mut out = content.to_vec();
                out.extend_from_slice(b"\n1 2 3");
                Some(out)
            }
        }
    }
}

/// Operators whose operand count is fixed and whose operands are plain numbers
const NUMERIC_FIXED: &[&str] = &[
    "m", "l", "c", "v", "y", "re", "w", "g", "G", "rg", "RG", "k", "K", "cm", "Td", "TL", "Tc",
    "Tw", "Tz", "Ts",
];

/// Operators taking no operands that may appear at page level
const NULLARY: &[&str] = &["q", "Q", "S", "s", "f", "F", "B", "b", "n", "h", "BT", "ET", "EMC"];

fn splice(content: &[u8], start: usize, end: usize, replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + replacement.len());
    out.extend_from_slice(&content[..start]);
    out.extend_from_slice(replacement);
    out.extend_from_slice(&content[end..]);
    out
}

fn drop_operand(content: &[u8]) -> Option<Vec<u8>> {
    let tokens = tokenize(content).ok()?;
    let position = tokens.iter().position(|t| {
        matches!(&t.kind, TokenKind::Operator(k) if NUMERIC_FIXED.contains(&k.as_str()))
    })?;
    let operand = tokens.get(position.checked_sub(1)?)?;
    Some(splice(content, operand.span.start, operand.span.end, b""))
}

fn extra_operand(content: &[u8]) -> Option<Vec<u8>> {
    let tokens = tokenize(content).ok()?;
    let operator = tokens
        .iter()
        .find(|t| matches!(&t.kind, TokenKind::Operator(k) if NULLARY.contains(&k.as_str())))?;
    let start = operator.span.start;
    Some(splice(content, start, start, b"0 "))
}

fn unknown_operator(content: &[u8]) -> Option<Vec<u8>> {
    let tokens = tokenize(content).ok()?;
    let operator = tokens
        .iter()
        .find(|t| matches!(t.kind, TokenKind::Operator(_)))?;
    Some(splice(content, operator.span.start, operator.span.end, b"Zz"))
}

fn truncate_string(content: &[u8]) -> Option<Vec<u8>> {
    let tokens = tokenize(content).ok()?;
    let string = tokens
        .iter()
        .find(|t| matches!(t.kind, TokenKind::LiteralString(_)))?;
    // Keep the opening parenthesis and at most one byte of the body
    let cut = (string.span.start + 2).min(string.span.end - 1);
    Some(content[..cut].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_operand() {
        let mutated = Mutation::DropOperand.apply(b"0 0 m 1 1 l S").unwrap();
        assert_eq!(mutated, b"0  m 1 1 l S");
    }

    #[test]
    fn test_extra_operand() {
        let mutated = Mutation::ExtraOperand.apply(b"q 0 g Q").unwrap();
        assert_eq!(mutated, b"0 q 0 g Q");
    }

    #[test]
    fn test_unknown_operator() {
        let mutated = Mutation::UnknownOperator.apply(b"/F1 12 Tf").unwrap();
        assert_eq!(mutated, b"/F1 12 Zz");
    }

    #[test]
    fn test_truncate_string() {
        let mutated = Mutation::TruncateString.apply(b"BT (Hello) Tj ET").unwrap();
        assert_eq!(mutated, b"BT (H");
        assert!(Mutation::TruncateString.apply(b"0 g").is_none());
    }
}
