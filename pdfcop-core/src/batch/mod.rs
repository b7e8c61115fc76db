//! Batch validation of independent content streams
//!
//! Pages of a document carry independent content streams. They share nothing
//! but the read-only operator catalog, so they can be validated on separate
//! threads. Results always come back in input order.
//!
//! # Example
//!
//! ```rust
//! use pdfcop::batch::{validate_all, BatchOptions};
//!
//! # fn main() -> pdfcop::Result<()> {
//! let pages = ["0 0 m 10 10 l S", "/Im1 Do", "0 1 2 c"];
//! let options = BatchOptions::default().with_parallelism(2);
//!
//! let result = validate_all(&pages, &options)?;
//! assert_eq!(result.successful(), 2);
//! assert_eq!(result.first_failure().map(|(index, _)| index), Some(2));
//! # Ok(())
//! # }
//! ```

use crate::error::{PdfCopError, Result};
use crate::parser::{ContentParser, ParseOptions};
use std::thread;
use std::time::Instant;

pub mod result;

pub use result::{BatchResult, StreamResult};

/// Options for batch validation
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Number of worker threads
    pub parallelism: usize,
    /// Options applied to every stream
    pub parse: ParseOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallelism: num_cpus::get().min(8),
            parse: ParseOptions::default(),
        }
    }
}

impl BatchOptions {
    /// Set the number of worker threads
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }
}

fn validate_one(index: usize, content: &[u8], options: &ParseOptions) -> StreamResult {
    let start = Instant::now();
    match ContentParser::with_options(content, options.clone()).content() {
        Ok(stream) => StreamResult::Valid {
            index,
            duration: start.elapsed(),
            stream,
        },
        Err(error) => StreamResult::Invalid {
            index,
            duration: start.elapsed(),
            error,
        },
    }
}

fn validate_chunk<S: AsRef<[u8]>>(
    offset: usize,
    chunk: &[S],
    options: &ParseOptions,
) -> Vec<StreamResult> {
    chunk
        .iter()
        .enumerate()
        .map(|(i, content)| validate_one(offset + i, content.as_ref(), options))
        .collect()
}

/// Validates every stream, spreading the work over scoped worker threads
///
/// A rejected stream does not stop the batch; its error is kept in the
/// corresponding [`StreamResult`]. Only a worker panic fails the whole call.
pub fn validate_all<S>(streams: &[S], options: &BatchOptions) -> Result<BatchResult>
where
    S: AsRef<[u8]> + Sync,
{
    let start = Instant::now();
    if streams.is_empty() {
        return Ok(BatchResult::default());
    }

    let workers = options.parallelism.max(1).min(streams.len());
    tracing::debug!(streams = streams.len(), workers, "starting batch validation");

    let results = if workers == 1 {
        validate_chunk(0, streams, &options.parse)
    } else {
        let chunk_size = streams.len().div_ceil(workers);
        thread::scope(|scope| {
            let handles: Vec<_> = streams
                .chunks(chunk_size)
                .enumerate()
                .map(|(worker, chunk)| {
                    let parse = &options.parse;
                    scope.spawn(move || validate_chunk(worker * chunk_size, chunk, parse))
                })
                .collect();

            // Join every worker before reporting a panic
            let joined: Vec<_> = handles.into_iter().map(|handle| handle.join()).collect();

            let mut results = Vec::with_capacity(streams.len());
            for (worker, outcome) in joined.into_iter().enumerate() {
                let chunk = outcome.map_err(|_| {
                    tracing::warn!(worker, "validation worker panicked");
                    PdfCopError::WorkerPanicked(worker)
                })?;
                tracing::trace!(worker, streams = chunk.len(), "worker finished");
                results.extend(chunk);
            }
            Ok::<_, PdfCopError>(results)
        })?
    };

    let result = BatchResult {
        results,
        total_duration: start.elapsed(),
    };
    tracing::debug!(
        valid = result.successful(),
        invalid = result.failed(),
        "batch validation finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ErrorKind;

    fn pages() -> Vec<String> {
        (0..20)
            .map(|i| {
                if i % 5 == 3 {
                    format!("{i} 0 m {i} S")
                } else {
                    format!("q {i} 0 0 {i} 0 0 cm /Im{i} Do Q")
                }
            })
            .collect()
    }

    #[test]
    fn test_empty_batch() {
        let streams: Vec<Vec<u8>> = Vec::new();
        let result = validate_all(&streams, &BatchOptions::default()).unwrap();
        assert_eq!(result.total(), 0);
        assert!(result.is_valid());
        assert!(result.first_failure().is_none());
    }

    #[test]
    fn test_results_keep_input_order() {
        let pages = pages();
        let options = BatchOptions::default().with_parallelism(4);
        let result = validate_all(&pages, &options).unwrap();

        assert_eq!(result.total(), pages.len());
        for (i, stream) in result.iter().enumerate() {
            assert_eq!(stream.index(), i);
            assert_eq!(stream.is_valid(), i % 5 != 3, "stream {i}");
        }
        assert_eq!(result.failed(), 4);
        let (index, error) = result.first_failure().unwrap();
        assert_eq!(index, 3);
        assert_eq!(error.kind(), ErrorKind::Arity);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let pages = pages();
        let sequential =
            validate_all(&pages, &BatchOptions::default().with_parallelism(1)).unwrap();
        let parallel = validate_all(&pages, &BatchOptions::default().with_parallelism(8)).unwrap();

        let outcome =
            |r: &BatchResult| -> Vec<bool> { r.iter().map(StreamResult::is_valid).collect() };
        assert_eq!(outcome(&sequential), outcome(&parallel));
        assert_eq!(sequential.operator_count(), parallel.operator_count());
    }

    #[test]
    fn test_parse_options_are_applied() {
        let streams = [b"BX foo EX".as_slice()];
        let lenient = validate_all(&streams, &BatchOptions::default()).unwrap();
        assert!(lenient.is_valid());

        let strict = BatchOptions::default().with_parse_options(ParseOptions::strict());
        assert!(!validate_all(&streams, &strict).unwrap().is_valid());
    }

    #[test]
    fn test_summary_display() {
        let streams = ["0 g", "Scooby Do"];
        let result = validate_all(&streams, &BatchOptions::default()).unwrap();
        let summary = result.to_string();
        assert!(summary.contains("Valid:      1"));
        assert!(summary.contains("First failure: stream #1"));
    }
}
