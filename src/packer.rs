use crate::code_table::{BitCode, CodeTable};
use crate::error::{CodecError, Result};

/// Streaming bit packer.
///
/// Codes are appended MSB-first. Whole bytes are emitted as soon as they fill
/// and the remaining 0 to 7 bits wait for the next chunk.
#[derive(Debug, Default)]
pub struct BitPacker {
    acc: u8,
    pending: u8,
    bits_packed: u64,
}

impl BitPacker {
    pub fn new() -> Self {
        BitPacker::default()
    }

    /// Pack one chunk, returning the bytes it completed.
    pub fn pack(&mut self, chunk: &[u8], table: &CodeTable) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(chunk.len());
        self.pack_into(chunk, table, &mut out)?;
        Ok(out)
    }

    /// Like [`pack`](Self::pack) but appends to `out`.
    ///
    /// On error the bytes completed before the offending byte are already in `out`.
    pub fn pack_into(&mut self, chunk: &[u8], table: &CodeTable, out: &mut Vec<u8>) -> Result<()> {
        for &byte in chunk {
            let code = table.get(byte).ok_or(CodecError::MissingCodeEntry { byte })?;
            self.push_code(code, out);
        }
        Ok(())
    }

    fn push_code(&mut self, code: &BitCode, out: &mut Vec<u8>) {
        for bit in code.bits() {
            self.acc = (self.acc << 1) | bit as u8;
            self.pending += 1;
            if self.pending == 8 {
                out.push(self.acc);
                self.acc = 0;
                self.pending = 0;
            }
        }
        self.bits_packed += code.len() as u64;
    }

    /// Emit the pending bits zero-padded to a full byte, if there are any.
    /// Leaves the packer empty, so a second call returns `None`.
    pub fn flush(&mut self) -> Option<u8> {
        if self.pending == 0 {
            return None;
        }
        let byte = self.acc << (8 - self.pending);
        self.acc = 0;
        self.pending = 0;
        Some(byte)
    }

    /// Bits still waiting for a full byte.
    pub fn pending_bits(&self) -> u8 {
        self.pending
    }

    /// Total meaningful bits packed so far, padding excluded.
    pub fn bits_packed(&self) -> u64 {
        self.bits_packed
    }
}
