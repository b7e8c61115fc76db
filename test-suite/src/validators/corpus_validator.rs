//! Corpus Validator
//!
//! Replays every fixture of a [`ContentCorpus`] against the parser under the
//! fixture's profile and compares the outcome with the expectation.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use pdfcop::parser::ContentParser;
use serde::Serialize;

use crate::corpus::{ContentCorpus, ContentFixture, ExpectedOutcome, TestCategory};
use crate::utils::preview;

/// A fixture whose outcome did not match its expectation
#[derive(Debug, Clone, Serialize)]
pub struct FixtureFailure {
    pub name: String,
    pub category: TestCategory,
    pub content: String,
    pub expected: ExpectedOutcome,
    /// What the parser actually did
    pub actual: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategorySummary {
    pub passed: usize,
    pub failed: usize,
}

/// Result of replaying a corpus
#[derive(Debug, Default, Serialize)]
pub struct ConformanceReport {
    pub total: usize,
    pub passed: usize,
    pub failures: Vec<FixtureFailure>,
    pub by_category: BTreeMap<TestCategory, CategorySummary>,
    #[serde(skip)]
    pub duration: Duration,
}

impl ConformanceReport {
    pub fn is_conformant(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.passed as f64 / self.total as f64 * 100.0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn record(&mut self, fixture: &ContentFixture, failure: Option<String>) {
        self.total += 1;
        let summary = self.by_category.entry(fixture.category).or_default();
        match failure {
            None => {
                self.passed += 1;
                summary.passed += 1;
            }
            Some(actual) => {
                summary.failed += 1;
                self.failures.push(FixtureFailure {
                    name: fixture.name.clone(),
                    category: fixture.category,
                    content: preview(&fixture.content),
                    expected: fixture.expected.clone(),
                    actual,
                });
            }
        }
    }
}

impl std::fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Content Stream Conformance")?;
        writeln!(f, "==========================")?;
        writeln!(f, "Fixtures:  {}", self.total)?;
        writeln!(f, "Passed:    {} ({:.1}%)", self.passed, self.pass_rate())?;
        writeln!(f, "Failed:    {}", self.failures.len())?;
        for (category, summary) in &self.by_category {
            writeln!(
                f,
                "  {:<10} {} passed, {} failed",
                format!("{category:?}"),
                summary.passed,
                summary.failed
            )?;
        }
        for failure in &self.failures {
            writeln!(f, "FAIL {}: {}", failure.name, failure.actual)?;
        }
        Ok(())
    }
}

/// Replays corpora against the parser
#[derive(Debug, Default)]
pub struct CorpusValidator {
    category: Option<TestCategory>,
}

impl CorpusValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only replay fixtures of one category
    pub fn only(mut self, category: TestCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn run(&self, corpus: &ContentCorpus) -> ConformanceReport {
        let start = Instant::now();
        let mut report = ConformanceReport::default();

        for fixture in corpus.iter() {
            if self.category.is_some_and(|c| c != fixture.category) {
                continue;
            }
            let failure = check_fixture(fixture);
            if let Some(actual) = &failure {
                tracing::warn!(fixture = %fixture.name, "{actual}");
            } else {
                tracing::debug!(fixture = %fixture.name, "passed");
            }
            report.record(fixture, failure);
        }

        report.duration = start.elapsed();
        tracing::info!(
            total = report.total,
            passed = report.passed,
            duration_ms = report.duration.as_millis() as u64,
            "corpus replay finished"
        );
        report
    }
}

/// Returns a description of the mismatch, or `None` when the fixture behaved as expected
pub fn check_fixture(fixture: &ContentFixture) -> Option<String> {
    let result = ContentParser::parse_with_options(&fixture.content, fixture.profile.options());

    match (&fixture.expected, result) {
        (ExpectedOutcome::Valid { operator_count }, Ok(stream)) => match operator_count {
            Some(expected) if *expected != stream.operator_count() => Some(format!(
                "valid, but with {} operators instead of {expected}",
                stream.operator_count()
            )),
            _ => None,
        },
        (ExpectedOutcome::Valid { .. }, Err(error)) => Some(format!("rejected: {error}")),
        (ExpectedOutcome::Invalid { .. }, Ok(stream)) => Some(format!(
            "accepted with {} operators",
            stream.operator_count()
        )),
        (ExpectedOutcome::Invalid { error, offset }, Err(actual)) => {
            if *error != actual.kind() {
                return Some(format!(
                    "expected {error:?} error, got {:?}: {actual}",
                    actual.kind()
                ));
            }
            match offset {
                Some(offset) if *offset != actual.offset() => Some(format!(
                    "error at byte {} instead of {offset}: {actual}",
                    actual.offset()
                )),
                _ => None,
            }
        }
    }
}
