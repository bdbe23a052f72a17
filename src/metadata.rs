//! Encoded file header.
//!
//! ```text
//! {"original_length":4,"bit_count":6,"codes":{"97":"0","98":"10","99":"11"}}*<payload>
//! ```
//!
//! The header is JSON followed by a single `*`. The JSON can only contain digits,
//! `0`/`1` strings and punctuation, so the first `*` always ends it.

use std::io::{self, BufRead, Read, Write};

use serde::{Deserialize, Serialize};

use crate::code_table::CodeTable;
use crate::error::{CodecError, Result};
use crate::frequency::FrequencyTable;

/// Separates the header from the payload.
pub const DELIMITER: u8 = b'*';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingMetaData {
    /// Bytes in the source.
    pub original_length: u64,
    /// Meaningful bits in the payload; the rest of the last byte is padding.
    pub bit_count: u64,
    pub codes: CodeTable,
}

impl EncodingMetaData {
    /// Header for a source with the given frequencies and code table.
    pub fn new(frequencies: &FrequencyTable, codes: CodeTable) -> Result<Self> {
        let bit_count = codes.encoded_bit_count(frequencies)?;
        Ok(EncodingMetaData {
            original_length: frequencies.total(),
            bit_count,
            codes,
        })
    }

    /// Header for an empty source.
    pub fn empty() -> Self {
        EncodingMetaData {
            original_length: 0,
            bit_count: 0,
            codes: CodeTable::new(),
        }
    }

    /// Payload size in bytes.
    pub fn payload_len(&self) -> u64 {
        self.bit_count.div_ceil(8)
    }

    /// Check that the header describes a decodable payload.
    pub(crate) fn validate(&self) -> Result<()> {
        let empty_table = self.codes.is_empty();
        let empty_source = self.original_length == 0;
        if empty_table != empty_source || (empty_source && self.bit_count != 0) {
            return Err(CodecError::malformed_table(format!(
                "{} codes cannot describe {} bytes in {} bits",
                self.codes.len(),
                self.original_length,
                self.bit_count
            )));
        }
        if self.bit_count < self.original_length {
            return Err(CodecError::malformed_table(format!(
                "{} bits cannot hold {} symbols",
                self.bit_count, self.original_length
            )));
        }
        self.codes.validate_prefix_free()
    }
}

/// Write the header and delimiter, returning the bytes written.
pub fn write_header<W: Write>(writer: &mut W, meta: &EncodingMetaData) -> io::Result<usize> {
    let json = serde_json::to_vec(meta)?;
    writer.write_all(&json)?;
    writer.write_all(&[DELIMITER])?;
    Ok(json.len() + 1)
}

/// Read the header and its delimiter, leaving `reader` at the first payload byte.
///
/// Gives up with `MalformedTable` if no delimiter shows up within `max_len` bytes.
pub fn read_header<R: BufRead>(reader: &mut R, max_len: usize) -> Result<EncodingMetaData> {
    read_header_with_len(reader, max_len).map(|(meta, _)| meta)
}

/// Like [`read_header`], also returning the bytes consumed, delimiter included.
pub fn read_header_with_len<R: BufRead>(
    reader: &mut R,
    max_len: usize,
) -> Result<(EncodingMetaData, usize)> {
    let mut raw = Vec::new();
    reader
        .by_ref()
        .take((max_len as u64).saturating_add(1))
        .read_until(DELIMITER, &mut raw)?;

    if raw.last() != Some(&DELIMITER) {
        return Err(if raw.is_empty() {
            CodecError::malformed_table("missing header")
        } else if raw.len() > max_len {
            CodecError::malformed_table(format!("no header delimiter within {} bytes", max_len))
        } else {
            CodecError::malformed_table("header delimiter missing before end of input")
        });
    }
    let consumed = raw.len();
    raw.pop();

    let meta: EncodingMetaData =
        serde_json::from_slice(&raw).map_err(|e| CodecError::malformed_table(e.to_string()))?;
    meta.validate()?;
    Ok((meta, consumed))
}
