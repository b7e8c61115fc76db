//! Test Suite for pdfcop
//!
//! This module provides the conformance corpus, content stream generators and
//! corpus validators used to check the content stream parser against
//! ISO 32000-1 Annex A.

pub mod corpus;
pub mod generators;
pub mod validators;

pub use corpus::{ContentCorpus, ContentFixture, ExpectedOutcome, TestCategory};
pub use generators::ContentBuilder;
pub use validators::{ConformanceReport, ContentValidator, CorpusValidator};

/// Common test utilities
pub mod utils {
    use std::fs;
    use std::path::Path;
    use std::sync::Once;

    use anyhow::Context;

    use crate::corpus::ContentCorpus;

    static INIT: Once = Once::new();

    /// Install a test-friendly tracing subscriber once per process
    ///
    /// Honors `RUST_LOG`; output goes through the libtest capture.
    pub fn init_test_logging() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }

    /// Load a JSON corpus written by [`ContentCorpus::to_json`]
    pub fn load_corpus<P: AsRef<Path>>(path: P) -> anyhow::Result<ContentCorpus> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus {}", path.display()))?;
        ContentCorpus::from_json(&json)
            .with_context(|| format!("Invalid corpus {}", path.display()))
    }

    /// Write a corpus as JSON
    pub fn save_corpus<P: AsRef<Path>>(corpus: &ContentCorpus, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        fs::write(path, corpus.to_json()?)
            .with_context(|| format!("Failed to write corpus {}", path.display()))
    }

    /// Render bytes for assertion messages
    pub fn preview(content: &[u8]) -> String {
        const MAX: usize = 60;
        let text = String::from_utf8_lossy(content);
        if text.chars().count() > MAX {
            format!("{}...", text.chars().take(MAX).collect::<String>())
        } else {
            text.into_owned()
        }
    }
}
