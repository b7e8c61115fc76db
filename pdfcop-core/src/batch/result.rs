//! Results and summaries for batch validation

use crate::parser::{ContentStream, ParseError};
use std::fmt;
use std::time::Duration;

/// Outcome of validating one content stream
#[derive(Debug, Clone)]
pub enum StreamResult {
    /// The stream parsed completely
    Valid {
        index: usize,
        duration: Duration,
        stream: ContentStream,
    },

    /// The stream was rejected
    Invalid {
        index: usize,
        duration: Duration,
        error: ParseError,
    },
}

impl StreamResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, StreamResult::Valid { .. })
    }

    /// Position of the stream in the batch input
    pub fn index(&self) -> usize {
        match self {
            StreamResult::Valid { index, .. } | StreamResult::Invalid { index, .. } => *index,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            StreamResult::Valid { duration, .. } | StreamResult::Invalid { duration, .. } => {
                *duration
            }
        }
    }

    pub fn stream(&self) -> Option<&ContentStream> {
        match self {
            StreamResult::Valid { stream, .. } => Some(stream),
            StreamResult::Invalid { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ParseError> {
        match self {
            StreamResult::Invalid { error, .. } => Some(error),
            StreamResult::Valid { .. } => None,
        }
    }
}

impl fmt::Display for StreamResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamResult::Valid {
                index,
                duration,
                stream,
            } => write!(
                f,
                "#{index}: valid, {} operators ({:.2}ms)",
                stream.operator_count(),
                duration.as_secs_f64() * 1000.0
            ),
            StreamResult::Invalid {
                index,
                duration,
                error,
            } => write!(
                f,
                "#{index}: invalid, {error} ({:.2}ms)",
                duration.as_secs_f64() * 1000.0
            ),
        }
    }
}

/// Per-stream outcomes of a batch, in input order
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub results: Vec<StreamResult>,
    pub total_duration: Duration,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.is_valid()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.successful()
    }

    /// True when every stream is valid (vacuously true for an empty batch)
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(StreamResult::is_valid)
    }

    /// Lowest-index rejected stream and its error
    pub fn first_failure(&self) -> Option<(usize, &ParseError)> {
        self.results
            .iter()
            .find_map(|r| r.error().map(|error| (r.index(), error)))
    }

    /// Operators across all valid streams
    pub fn operator_count(&self) -> usize {
        self.results
            .iter()
            .filter_map(StreamResult::stream)
            .map(ContentStream::operator_count)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamResult> {
        self.results.iter()
    }
}

impl fmt::Display for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batch Validation Summary")?;
        writeln!(f, "========================")?;
        writeln!(f, "Streams:    {}", self.total())?;
        writeln!(f, "Valid:      {}", self.successful())?;
        writeln!(f, "Invalid:    {}", self.failed())?;
        writeln!(f, "Operators:  {}", self.operator_count())?;
        write!(f, "Duration:   {:.2}s", self.total_duration.as_secs_f64())?;

        if let Some((index, error)) = self.first_failure() {
            write!(f, "\nFirst failure: stream #{index}: {error}")?;
        }
        Ok(())
    }
}
