//! Error types for stress balance evaluation.

use ice_core::error::IceError;
use thiserror::Error;

/// Errors raised at the validation boundary, before any numerics run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] IceError),

    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },
}

pub type StreamResult<T> = Result<T, StreamError>;

impl From<StreamError> for IceError {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::DimensionMismatch { what, .. } => IceError::InvalidArg { what },
            StreamError::InvalidInput(inner) => inner,
            StreamError::NotSupported { what } => IceError::InvalidArg { what },
        }
    }
}

/// Checks that a vector or matrix dimension matches the grid size.
pub(crate) fn ensure_len(what: &'static str, expected: usize, actual: usize) -> StreamResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(StreamError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}
