use std::io::{self, Cursor, Read};

use crate::error::{CodecError, Result};
use crate::metadata::{read_header, write_header, EncodingMetaData};

/// A whole encoded file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedData {
    pub meta: EncodingMetaData,
    pub payload: Vec<u8>,
}

impl CompressedData {
    pub fn original_length(&self) -> u64 {
        self.meta.original_length
    }

    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.payload.len() + 64);
        write_header(&mut bytes, &self.meta)?;
        bytes.extend_from_slice(&self.payload);
        Ok(bytes)
    }

    /// Parse an encoded file, checking the payload length against the header.
    pub fn deserialize(bytes: &[u8], max_header_len: usize) -> Result<CompressedData> {
        let mut cursor = Cursor::new(bytes);
        let meta = read_header(&mut cursor, max_header_len)?;
        let mut payload = Vec::new();
        cursor.read_to_end(&mut payload)?;

        let data = CompressedData { meta, payload };
        data.validate()?;
        Ok(data)
    }

    /// Check the header and that the payload is exactly as long as it says.
    pub fn validate(&self) -> Result<()> {
        self.meta.validate()?;

        let expected = self.meta.payload_len();
        let actual = self.payload.len() as u64;
        if actual < expected {
            return Err(CodecError::truncated(format!(
                "expected {} payload bytes, found {}",
                expected, actual
            )));
        }
        if actual > expected {
            return Err(CodecError::corrupt(format!(
                "{} trailing bytes after the payload",
                actual - expected
            )));
        }
        Ok(())
    }
}
