//! Error types for the Firebird client.

use std::io;
use thiserror::Error;

/// Result type alias for Firebird operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Firebird client operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error surfaced through the blob stream adapters.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A native call returned an error-class status.
    #[error("{message}")]
    Native { code: i64, message: String },

    /// Column index outside `[0, count)`.
    #[error("Index out of bound: {index} (columns: {count})")]
    IndexOutOfBounds { index: usize, count: usize },

    /// A null column was read through a non-null accessor.
    #[error("Field is null: {index}")]
    NullField { index: usize },

    /// The accessor is incompatible with the column's wire type.
    #[error("Data type conversion error ({index})")]
    TypeConversion { index: usize },

    /// The value does not fit in the column.
    #[error("String truncation: {index}")]
    Truncation { index: usize },

    /// Column bytes are not valid UTF-8.
    #[error("Malformed string data in column {index}")]
    InvalidEncoding { index: usize },

    /// A rescale needed a division with a nonzero remainder.
    #[error("Cannot rescale {value} to scale {scale} without losing digits")]
    ArithmeticRescale { value: String, scale: i64 },

    /// Fixed-point scales are never positive.
    #[error("Invalid scale {scale}")]
    InvalidScale { scale: i64 },

    /// Operation attempted on a zeroed or freed handle.
    #[error("Invalid Handle value")]
    InvalidHandle,

    /// Value kind with no column mapping.
    #[error("Unsupported: {message}")]
    Unsupported { message: String },

    /// Malformed info reply from the client library.
    #[error("Protocol error: {message}")]
    Protocol { message: String },
}

impl Error {
    /// Create a native status error.
    pub fn native(code: i64, message: impl Into<String>) -> Self {
        Self::Native {
            code,
            message: message.into(),
        }
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create an unsupported-value error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Raw status code for native errors.
    pub fn status_code(&self) -> Option<i64> {
        match self {
            Error::Native { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::TypeConversion { index: 3 }.to_string(),
            "Data type conversion error (3)"
        );
        assert_eq!(Error::Truncation { index: 1 }.to_string(), "String truncation: 1");
        assert_eq!(Error::InvalidHandle.to_string(), "Invalid Handle value");
        assert_eq!(Error::native(335544344, "I/O error").to_string(), "I/O error");
    }

    #[test]
    fn test_status_code() {
        assert_eq!(Error::native(42, "x").status_code(), Some(42));
        assert_eq!(Error::InvalidHandle.status_code(), None);
    }
}
