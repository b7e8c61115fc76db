//! Content Stream Validator
//!
//! Validates a content stream with the parser and collects usage statistics
//! from the resulting tree.

use std::collections::BTreeMap;

use pdfcop::parser::{
    ContentParser, ErrorCollector, Group, Invocation, ParseOptions, Production, TreeListener,
};
use serde::Serialize;

/// Validator for PDF content streams
pub struct ContentValidator {
    options: ParseOptions,
    /// Group nesting above which a warning is reported
    warn_nesting_depth: usize,
}

impl ContentValidator {
    /// Create a new content validator with the default parser profile
    pub fn new() -> Self {
        Self {
            options: ParseOptions::default(),
            warn_nesting_depth: 16,
        }
    }

    /// Strict mode - undefined operators are errors even inside BX/EX
    pub fn strict(mut self) -> Self {
        self.options = ParseOptions::strict();
        self
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn warn_above_depth(mut self, depth: usize) -> Self {
        self.warn_nesting_depth = depth;
        self
    }

    /// Validate a content stream
    pub fn validate(&self, content: &[u8]) -> ContentValidationReport {
        let mut report = ContentValidationReport::default();
        let mut collector = ErrorCollector::new();

        let result = {
            let mut parser =
                ContentParser::with_listener(content, self.options.clone(), &mut collector);
            parser.content()
        };

        let stream = match result {
            Ok(stream) => stream,
            Err(_) => {
                for error in collector.errors() {
                    report.add_error(&error.to_string());
                }
                return report;
            }
        };

        let mut stats = UsageListener::default();
        stream.walk(&mut stats);

        report.operator_count = stats.operators;
        report.operator_usage = stats.usage;
        report.max_nesting_depth = stats.max_depth;

        if stats.unknown_operators > 0 {
            report.add_warning(&format!(
                "{} undefined operator(s) inside compatibility sections",
                stats.unknown_operators
            ));
        }
        if stats.max_depth > self.warn_nesting_depth {
            report.add_warning(&format!(
                "Group nesting depth {} exceeds {}",
                stats.max_depth, self.warn_nesting_depth
            ));
        }

        report
    }
}

impl Default for ContentValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Groups that count towards the nesting limit
fn is_nesting_level(production: Production) -> bool {
    matches!(
        production,
        Production::GraphicsStateBlock
            | Production::TextObject
            | Production::MarkedContent
            | Production::Compatibility
    )
}

/// Gathers operator statistics while walking a parse tree
#[derive(Default)]
struct UsageListener {
    operators: usize,
    unknown_operators: usize,
    usage: BTreeMap<String, usize>,
    depth: usize,
    max_depth: usize,
}

impl TreeListener for UsageListener {
    fn enter_group(&mut self, group: &Group) {
        if is_nesting_level(group.production()) {
            self.depth += 1;
            self.max_depth = self.max_depth.max(self.depth);
        }
    }

    fn exit_group(&mut self, group: &Group) {
        if is_nesting_level(group.production()) {
            self.depth = self.depth.saturating_sub(1);
        }
    }

    fn visit_invocation(&mut self, invocation: &Invocation) {
        self.operators += 1;
        if invocation.production() == Production::UnknownOperator {
            self.unknown_operators += 1;
        }
        *self
            .usage
            .entry(invocation.operator().to_string())
            .or_insert(0) += 1;
    }
}

/// Content validation report
#[derive(Debug, Default, Serialize)]
pub struct ContentValidationReport {
    /// Validation errors (the stream is rejected)
    pub errors: Vec<String>,
    /// Validation warnings (the stream is valid but unusual)
    pub warnings: Vec<String>,
    /// Total operator count
    pub operator_count: usize,
    /// Operator usage statistics
    pub operator_usage: BTreeMap<String, usize>,
    /// Deepest nesting of `q`, `BT`, marked content and `BX` groups
    pub max_nesting_depth: usize,
}

impl ContentValidationReport {
    fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
