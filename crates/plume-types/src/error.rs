use thiserror::Error;

/// Failures parsing ids and keys from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("not hex: {0}")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
