use crate::parser::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfCopError {
    #[error("Invalid content stream: {0}")]
    Parse(#[from] ParseError),

    #[error("Validation worker {0} panicked")]
    WorkerPanicked(usize),
}

pub type Result<T> = std::result::Result<T, PdfCopError>;
