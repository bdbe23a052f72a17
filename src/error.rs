//! Error handling for the huffpack codec.
//!
//! Every failure surfaces as a [`CodecError`] carrying its kind and enough context
//! to report it. Nothing in the core retries.

use thiserror::Error;

use crate::min_heap::HeapErr;

/// Main error type for encode and decode sessions
#[derive(Error, Debug)]
pub enum CodecError {
    /// Source is not something the codec can read (missing, not a regular file, ...)
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input
        message: String,
    },

    /// A tree cannot be built from an empty frequency table
    #[error("Empty input: no symbols to build a tree from")]
    EmptyInput,

    /// A byte showed up during packing that the scan pass never saw
    #[error("Missing code entry for byte 0x{byte:02x}")]
    MissingCodeEntry {
        /// The byte without a code
        byte: u8,
    },

    /// The source produced a different number of packed bits than pass 1 predicted
    #[error("Source changed between passes: expected {expected} bits, packed {actual}")]
    SourceChanged {
        /// Bit count recorded in the header
        expected: u64,
        /// Bit count actually packed
        actual: u64,
    },

    /// Header could not be parsed or describes an impossible code
    #[error("Malformed table: {message}")]
    MalformedTable {
        /// What was wrong with the table
        message: String,
    },

    /// Payload ended before every recorded bit was decoded
    #[error("Truncated payload: {message}")]
    TruncatedPayload {
        /// Where the payload ran out
        message: String,
    },

    /// Payload bits do not form valid codes for the table
    #[error("Corrupt payload: {message}")]
    CorruptPayload {
        /// What was wrong with the payload
        message: String,
    },

    /// Configuration or parameter errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },

    /// Internal priority queue misuse during tree construction
    #[error("Heap error: {0}")]
    Heap(#[from] HeapErr),

    /// I/O failure on the source or the sink
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    /// Create a malformed table error
    pub fn malformed_table<S: Into<String>>(message: S) -> Self {
        Self::MalformedTable { message: message.into() }
    }

    /// Create a truncated payload error
    pub fn truncated<S: Into<String>>(message: S) -> Self {
        Self::TruncatedPayload { message: message.into() }
    }

    /// Create a corrupt payload error
    pub fn corrupt<S: Into<String>>(message: S) -> Self {
        Self::CorruptPayload { message: message.into() }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// True for errors caused by the encoded data rather than the environment
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedTable { .. } | Self::TruncatedPayload { .. } | Self::CorruptPayload { .. }
        )
    }
}

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
