//! Codec configuration.

use crate::error::{CodecError, Result};

/// Default read size for both passes.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Default cap on the serialized header. A full 256-symbol table fits comfortably.
pub const DEFAULT_MAX_HEADER_LEN: usize = 64 * 1024;

/// Largest read size accepted by [`CodecConfig::validate`].
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Largest header cap accepted by [`CodecConfig::validate`].
pub const MAX_HEADER_LEN: usize = 16 * 1024 * 1024;

const MIN_HEADER_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Bytes requested from the source per read.
    pub chunk_size: usize,
    /// Longest header accepted when decoding.
    pub max_header_len: usize,
}

impl CodecConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_header_len(mut self, max_header_len: usize) -> Self {
        self.max_header_len = max_header_len;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(CodecError::configuration("chunk_size must be greater than zero"));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(CodecError::configuration(format!(
                "chunk_size must be at most {} bytes, got {}",
                MAX_CHUNK_SIZE, self.chunk_size
            )));
        }
        if !(MIN_HEADER_LEN..=MAX_HEADER_LEN).contains(&self.max_header_len) {
            return Err(CodecError::configuration(format!(
                "max_header_len must be between {} and {} bytes, got {}",
                MIN_HEADER_LEN, MAX_HEADER_LEN, self.max_header_len
            )));
        }
        Ok(())
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_header_len: DEFAULT_MAX_HEADER_LEN,
        }
    }
}
