//! Decode direction: turns packed bytes back into symbols.
//!
//! The code table is rebuilt into a trie held in a flat arena. The unpacker
//! walks it one bit at a time and keeps its position between chunks, so a
//! code may straddle any number of reads.

use crate::code_table::CodeTable;
use crate::error::{CodecError, Result};

const ROOT: usize = 0;

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: [Option<usize>; 2],
    symbol: Option<u8>,
}

/// Decode trie built from a [`CodeTable`].
#[derive(Debug, Clone)]
pub struct DecodeTrie {
    nodes: Vec<TrieNode>,
}

impl DecodeTrie {
    /// Build the trie, rejecting tables where one code is a prefix of another.
    pub fn from_table(table: &CodeTable) -> Result<Self> {
        let mut nodes = vec![TrieNode::default()];

        for (byte, code) in table.iter() {
            if code.is_empty() {
                return Err(CodecError::malformed_table(format!("empty code for byte {}", byte)));
            }
            let mut at = ROOT;
            for bit in code.bits() {
                if nodes[at].symbol.is_some() {
                    return Err(prefix_conflict(byte));
                }
                at = match nodes[at].children[bit as usize] {
                    Some(next) => next,
                    None => {
                        nodes.push(TrieNode::default());
                        let next = nodes.len() - 1;
                        nodes[at].children[bit as usize] = Some(next);
                        next
                    }
                };
            }
            let leaf = &mut nodes[at];
            if leaf.symbol.is_some() || leaf.children.iter().any(Option::is_some) {
                return Err(prefix_conflict(byte));
            }
            leaf.symbol = Some(byte);
        }

        Ok(DecodeTrie { nodes })
    }

    pub fn symbol_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.symbol.is_some()).count()
    }
}

fn prefix_conflict(byte: u8) -> CodecError {
    CodecError::malformed_table(format!("code for byte {} collides with another code's prefix", byte))
}

/// Streaming bit unpacker.
///
/// Consumes exactly `bit_count` payload bits. The unused low bits of the last
/// byte are padding and must be zero; any byte after it is an error.
#[derive(Debug)]
pub struct BitUnpacker {
    trie: DecodeTrie,
    cursor: usize,
    bit_count: u64,
    remaining: u64,
    symbols: u64,
}

impl BitUnpacker {
    pub fn new(table: &CodeTable, bit_count: u64) -> Result<Self> {
        Ok(BitUnpacker {
            trie: DecodeTrie::from_table(table)?,
            cursor: ROOT,
            bit_count,
            remaining: bit_count,
            symbols: 0,
        })
    }

    /// Decode one chunk, returning the symbols it completed.
    pub fn unpack(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(chunk.len() * 2);
        self.unpack_into(chunk, &mut out)?;
        Ok(out)
    }

    /// Like [`unpack`](Self::unpack) but appends to `out`.
    pub fn unpack_into(&mut self, chunk: &[u8], out: &mut Vec<u8>) -> Result<()> {
        for &byte in chunk {
            if self.remaining == 0 {
                return Err(CodecError::corrupt("trailing bytes after the final payload byte"));
            }
            let take = self.remaining.min(8) as u32;
            for i in 0..take {
                let bit = (byte >> (7 - i)) & 1;
                self.step(bit as usize, out)?;
            }
            self.remaining -= take as u64;

            if take < 8 && byte & (0xff >> take) != 0 {
                return Err(CodecError::corrupt("non-zero padding bits in the final byte"));
            }
        }
        Ok(())
    }

    fn step(&mut self, bit: usize, out: &mut Vec<u8>) -> Result<()> {
        let next = self.trie.nodes[self.cursor].children[bit].ok_or_else(|| {
            CodecError::corrupt(format!(
                "bit sequence matches no code at bit {}",
                self.bit_count - self.remaining
            ))
        })?;
        match self.trie.nodes[next].symbol {
            Some(symbol) => {
                out.push(symbol);
                self.symbols += 1;
                self.cursor = ROOT;
            }
            None => self.cursor = next,
        }
        Ok(())
    }

    /// Check that every recorded bit arrived and the last code was complete.
    pub fn finish(&self) -> Result<()> {
        if self.remaining > 0 {
            return Err(CodecError::truncated(format!(
                "{} of {} payload bits missing",
                self.remaining, self.bit_count
            )));
        }
        if self.cursor != ROOT {
            return Err(CodecError::truncated("payload ends in the middle of a code"));
        }
        Ok(())
    }

    /// Symbols decoded so far.
    pub fn symbols_decoded(&self) -> u64 {
        self.symbols
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::code_table::BitCode;

    fn table(entries: &[(u8, &str)]) -> CodeTable {
        entries
            .iter()
            .map(|&(b, c)| (b, c.parse::<BitCode>().unwrap()))
            .collect()
    }

    fn abc() -> CodeTable {
        table(&[(b'a', "0"), (b'b', "10"), (b'c', "11")])
    }

    #[test]
    fn test_unpack_aabc() {
        let mut unpacker = BitUnpacker::new(&abc(), 6).unwrap();
        assert_eq!(unpacker.unpack(&[0b0010_1100]).unwrap(), b"aabc".to_vec());
        assert!(unpacker.finish().is_ok());
        assert_eq!(unpacker.symbols_decoded(), 4);
    }

    #[test]
    fn test_code_straddles_chunks() {
        let t = table(&[(1, "101"), (2, "0")]);
        let mut unpacker = BitUnpacker::new(&t, 11).unwrap();

        let mut out = unpacker.unpack(&[0b1011_0110]).unwrap();
        assert_eq!(out, vec![1, 1]);
        out.extend(unpacker.unpack(&[0b1000_0000]).unwrap());
        assert_eq!(out, vec![1, 1, 1, 2, 2]);
        assert!(unpacker.finish().is_ok());
    }

    #[test]
    fn test_padding_is_not_decoded() {
        // 'a' is "0", so zero padding would decode as extra 'a's without the bit count
        let mut unpacker = BitUnpacker::new(&abc(), 2).unwrap();
        assert_eq!(unpacker.unpack(&[0]).unwrap(), b"aa".to_vec());
        assert!(unpacker.finish().is_ok());
    }

    #[test]
    fn test_truncated() {
        let mut unpacker = BitUnpacker::new(&abc(), 14).unwrap();
        unpacker.unpack(&[0b0010_1100]).unwrap();
        assert!(matches!(unpacker.finish(), Err(CodecError::TruncatedPayload { .. })));
    }

    #[test]
    fn test_bit_count_ending_mid_code() {
        let mut unpacker = BitUnpacker::new(&abc(), 3).unwrap();
        assert_eq!(unpacker.unpack(&[0b0010_0000]).unwrap(), b"aa".to_vec());
        assert!(matches!(unpacker.finish(), Err(CodecError::TruncatedPayload { .. })));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut unpacker = BitUnpacker::new(&abc(), 6).unwrap();
        let err = unpacker.unpack(&[0b0010_1100, 0]).unwrap_err();
        assert!(matches!(err, CodecError::CorruptPayload { .. }));
    }

    #[test]
    fn test_nonzero_padding() {
        let mut unpacker = BitUnpacker::new(&abc(), 6).unwrap();
        let err = unpacker.unpack(&[0b0010_1101]).unwrap_err();
        assert!(matches!(err, CodecError::CorruptPayload { .. }));
    }

    #[test]
    fn test_single_symbol_rejects_one_bits() {
        let t = table(&[(b'x', "0")]);
        let mut unpacker = BitUnpacker::new(&t, 3).unwrap();
        let err = unpacker.unpack(&[0b0100_0000]).unwrap_err();
        assert!(matches!(err, CodecError::CorruptPayload { .. }));

        let mut unpacker = BitUnpacker::new(&t, 3).unwrap();
        assert_eq!(unpacker.unpack(&[0]).unwrap(), b"xxx".to_vec());
        assert!(unpacker.finish().is_ok());
    }

    #[test]
    fn test_empty_table() {
        let mut unpacker = BitUnpacker::new(&CodeTable::new(), 0).unwrap();
        assert!(unpacker.unpack(&[]).unwrap().is_empty());
        assert!(unpacker.finish().is_ok());
        assert!(unpacker.unpack(&[0]).is_err());
    }

    #[test]
    fn test_trie_rejects_prefix_tables() {
        let bad = table(&[(1, "0"), (2, "01")]);
        assert!(matches!(
            DecodeTrie::from_table(&bad),
            Err(CodecError::MalformedTable { .. })
        ));

        let bad = table(&[(1, "01"), (2, "0")]);
        assert!(DecodeTrie::from_table(&bad).is_err());

        let trie = DecodeTrie::from_table(&abc()).unwrap();
        assert_eq!(trie.symbol_count(), 3);
    }
}
