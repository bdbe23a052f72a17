//! # huffpack
//!
//! A two-pass Huffman file codec. The first pass counts byte frequencies, the
//! code table is written as a small JSON header, and the second pass re-reads
//! the source and packs each byte's code into a bitstream.
//!
//! ## Quick Start
//!
//! ```no_run
//! use huffpack::HuffmanCodec;
//! use std::path::Path;
//!
//! let codec = HuffmanCodec::new();
//!
//! // Compress a file
//! codec.encode_file(Path::new("input.txt"), Path::new("input.txt.huff"))?;
//!
//! // Decompress it again
//! codec.decode_file(Path::new("input.txt.huff"), Path::new("restored.txt"))?;
//! # Ok::<(), huffpack::CodecError>(())
//! ```
//!
//! In memory:
//!
//! ```
//! use huffpack::HuffmanCodec;
//!
//! let codec = HuffmanCodec::new();
//! let encoded = codec.encode_bytes(b"aabc")?;
//! assert_eq!(codec.decode_bytes(&encoded)?, b"aabc");
//! # Ok::<(), huffpack::CodecError>(())
//! ```

pub mod code_table;
pub mod compressed_data;
pub mod config;
pub mod error;
pub mod frequency;
pub mod huffman_codec;
pub mod hufftree;
pub mod metadata;
pub mod packer;
pub mod paths;
pub mod progress;
pub mod source;
pub mod unpacker;

// Internal modules - not part of public API
mod min_heap;

// Re-export main types for convenience
pub use code_table::{BitCode, CodeTable};
pub use compressed_data::CompressedData;
pub use config::CodecConfig;
pub use error::{CodecError, Result};
pub use frequency::FrequencyTable;
pub use huffman_codec::{DecodeSummary, EncodeSummary, HuffmanCodec};
pub use hufftree::{HuffNode, HuffmanTree};
pub use metadata::EncodingMetaData;
pub use min_heap::HeapErr;
pub use packer::BitPacker;
pub use progress::{NoProgress, Progress, Stage};
pub use source::{ChunkSource, ReaderSource, SliceSource};
pub use unpacker::{BitUnpacker, DecodeTrie};
