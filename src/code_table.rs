//! Byte to bit-code mapping.
//!
//! Codes are stored MSB-first in a `u128`, so the first bit of the code is the
//! first one written to the stream. On disk a code is its `0`/`1` string.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};
use crate::frequency::FrequencyTable;

/// Longest code the table can hold.
pub const MAX_CODE_LEN: u8 = 128;

/// A variable-length bit code of 1 to [`MAX_CODE_LEN`] bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BitCode {
    bits: u128,
    len: u8,
}

impl BitCode {
    /// The zero-length code at the root of a tree. Never stored in a table.
    pub(crate) const ROOT: BitCode = BitCode { bits: 0, len: 0 };

    /// Extend the code by one bit, `None` past [`MAX_CODE_LEN`].
    pub fn child(self, bit: bool) -> Option<BitCode> {
        if self.len >= MAX_CODE_LEN {
            return None;
        }
        Some(BitCode {
            bits: (self.bits << 1) | bit as u128,
            len: self.len + 1,
        })
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw code value; only the low `len` bits are meaningful.
    pub fn value(&self) -> u128 {
        self.bits
    }

    /// Bit `i`, counting from the first bit of the code.
    pub fn bit(&self, i: u8) -> bool {
        debug_assert!(i < self.len);
        (self.bits >> (self.len - 1 - i)) & 1 == 1
    }

    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.bit(i))
    }

    pub fn is_prefix_of(&self, other: &BitCode) -> bool {
        if self.len == 0 {
            return true;
        }
        self.len <= other.len && (other.bits >> (other.len - self.len)) == self.bits
    }
}

impl fmt::Display for BitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for BitCode {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(CodecError::malformed_table("empty code"));
        }
        let mut code = BitCode::ROOT;
        for c in s.chars() {
            let bit = match c {
                '0' => false,
                '1' => true,
                other => {
                    return Err(CodecError::malformed_table(format!(
                        "invalid character {:?} in code {:?}",
                        other, s
                    )))
                }
            };
            code = code.child(bit).ok_or_else(|| {
                CodecError::malformed_table(format!("code longer than {} bits", MAX_CODE_LEN))
            })?;
        }
        Ok(code)
    }
}

impl TryFrom<String> for BitCode {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<BitCode> for String {
    fn from(code: BitCode) -> String {
        code.to_string()
    }
}

/// Mapping from byte value to its code. Serializes as a JSON object keyed by
/// the decimal byte value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeTable {
    codes: BTreeMap<u8, BitCode>,
}

impl CodeTable {
    pub fn new() -> Self {
        CodeTable { codes: BTreeMap::new() }
    }

    pub fn insert(&mut self, byte: u8, code: BitCode) -> Option<BitCode> {
        self.codes.insert(byte, code)
    }

    pub fn get(&self, byte: u8) -> Option<&BitCode> {
        self.codes.get(&byte)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &BitCode)> + '_ {
        self.codes.iter().map(|(&byte, code)| (byte, code))
    }

    pub fn max_code_len(&self) -> u8 {
        self.codes.values().map(BitCode::len).max().unwrap_or(0)
    }

    /// Number of payload bits needed to encode a source with these frequencies.
    pub fn encoded_bit_count(&self, frequencies: &FrequencyTable) -> Result<u64> {
        frequencies.iter().try_fold(0u64, |total, (byte, count)| {
            let code = self.get(byte).ok_or(CodecError::MissingCodeEntry { byte })?;
            Ok(total + count * code.len() as u64)
        })
    }

    /// Check that no code is a prefix of another.
    pub fn validate_prefix_free(&self) -> Result<()> {
        let mut entries: Vec<(Vec<bool>, u8)> = self
            .iter()
            .map(|(byte, code)| (code.bits().collect(), byte))
            .collect();
        entries.sort();

        for pair in entries.windows(2) {
            let (shorter, a) = &pair[0];
            let (longer, b) = &pair[1];
            if longer.starts_with(shorter) {
                return Err(CodecError::malformed_table(format!(
                    "code for byte {} is a prefix of the code for byte {}",
                    a, b
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<(u8, BitCode)> for CodeTable {
    fn from_iter<I: IntoIterator<Item = (u8, BitCode)>>(iter: I) -> Self {
        CodeTable { codes: iter.into_iter().collect() }
    }
}
