//! Stack-safe parsing utilities
//!
//! The grammar is recursive: every nested group (`q`, `BT`, `BMC`, `BX`) and
//! every nested operand array or dictionary costs a stack frame. This module
//! bounds that recursion so hostile input fails with a syntax error instead of
//! overflowing the stack.

use super::{ParseError, ParseResult, Span};

/// Hard ceiling for any nesting limit
///
/// Must fit a 2 MB thread stack (the spawned-thread default) in unoptimized
/// builds.
pub const MAX_RECURSION_DEPTH: usize = 100;

/// Nesting depth tracker for one kind of recursive construct
#[derive(Debug, Clone)]
pub struct StackSafeContext {
    /// Current recursion depth
    pub depth: usize,
    /// Maximum allowed depth
    pub max_depth: usize,
    what: &'static str,
}

impl StackSafeContext {
    /// Context allowing `max_depth` nested levels of `what` (clamped to [`MAX_RECURSION_DEPTH`])
    pub fn new(what: &'static str, max_depth: usize) -> Self {
        Self {
            depth: 0,
            max_depth: max_depth.min(MAX_RECURSION_DEPTH),
            what,
        }
    }

    /// Enter a new nesting level opened at `span`
    pub fn enter(&mut self, span: Span) -> ParseResult<()> {
        if self.depth + 1 > self.max_depth {
            return Err(ParseError::grammar(
                span,
                format!("at most {} nested {}", self.max_depth, self.what),
                format!("nesting depth {}", self.depth + 1),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Exit a nesting level
    pub fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
