use thiserror::Error;

pub type IceResult<T> = Result<T, IceError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IceError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Non-finite entry in {what} at index {index}: {value}")]
    NonFiniteEntry {
        what: &'static str,
        index: usize,
        value: f64,
    },

    #[error("Expected a positive value for {what}, got {value}")]
    NotPositive { what: &'static str, value: f64 },

    #[error("Expected a nonzero value for {what}")]
    Zero { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
