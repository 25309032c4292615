use thiserror::Error;

/// Errors raised when constructing pixel buffers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("Frame has a zero dimension ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },
    #[error("Data size mismatch: expected {expected} bytes, got {actual}")]
    DataSizeMismatch { expected: usize, actual: usize },
}
