use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::compressed_data::CompressedData;
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::frequency::FrequencyTable;
use crate::hufftree::HuffmanTree;
use crate::metadata::{read_header_with_len, write_header, EncodingMetaData};
use crate::packer::BitPacker;
use crate::paths;
use crate::progress::{NoProgress, Progress, Stage};
use crate::source::{ChunkSource, ReaderSource, SliceSource};
use crate::unpacker::BitUnpacker;

/// What an encode session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSummary {
    pub original_length: u64,
    pub header_len: u64,
    pub payload_len: u64,
    pub bit_count: u64,
    pub symbols: usize,
}

impl EncodeSummary {
    pub fn encoded_len(&self) -> u64 {
        self.header_len + self.payload_len
    }

    /// Encoded size over original size; 0 for an empty source.
    pub fn ratio(&self) -> f64 {
        if self.original_length == 0 {
            return 0.0;
        }
        self.encoded_len() as f64 / self.original_length as f64
    }
}

/// What a decode session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeSummary {
    pub original_length: u64,
    pub header_len: u64,
    pub payload_len: u64,
}

/// Drives encode and decode sessions.
///
/// The codec only holds configuration. Every call builds its own frequency
/// table, tree, code table and bit accumulator, so one codec can serve any
/// number of threads.
#[derive(Debug, Clone, Default)]
pub struct HuffmanCodec {
    config: CodecConfig,
}

impl HuffmanCodec {
    pub fn new() -> Self {
        HuffmanCodec::default()
    }

    pub fn with_config(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(HuffmanCodec { config })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Pass 1: count every byte of `source`.
    pub fn scan<S: ChunkSource>(&self, source: &mut S) -> Result<FrequencyTable> {
        self.scan_with_progress(source, &mut NoProgress)
    }

    fn scan_with_progress<S, P>(&self, source: &mut S, progress: &mut P) -> Result<FrequencyTable>
    where
        S: ChunkSource,
        P: Progress + ?Sized,
    {
        let mut frequencies = FrequencyTable::new();
        let mut processed = 0u64;
        while let Some(chunk) = source.next_chunk()? {
            frequencies.accumulate(chunk);
            processed += chunk.len() as u64;
            progress.advance(Stage::Scan, processed);
        }
        Ok(frequencies)
    }

    /// Build the header for a scanned source. An empty source gets an empty table.
    pub fn plan(frequencies: &FrequencyTable) -> Result<EncodingMetaData> {
        let tree = match HuffmanTree::build(frequencies) {
            Ok(tree) => tree,
            Err(CodecError::EmptyInput) => {
                debug!("empty source, writing an empty table");
                return Ok(EncodingMetaData::empty());
            }
            Err(e) => return Err(e),
        };
        trace!("{}", tree);

        let codes = tree.generate_table()?;
        let meta = EncodingMetaData::new(frequencies, codes)?;
        debug!(
            symbols = meta.codes.len(),
            original_length = meta.original_length,
            bit_count = meta.bit_count,
            max_code_len = meta.codes.max_code_len(),
            "code table ready"
        );
        Ok(meta)
    }

    /// Pass 2: pack `source` with the planned table and write the payload.
    fn pack_pass<S, W, P>(
        &self,
        source: &mut S,
        meta: &EncodingMetaData,
        sink: &mut W,
        progress: &mut P,
    ) -> Result<u64>
    where
        S: ChunkSource,
        W: Write,
        P: Progress + ?Sized,
    {
        let mut packer = BitPacker::new();
        let mut out = Vec::with_capacity(self.config.chunk_size);
        let mut processed = 0u64;
        let mut written = 0u64;

        while let Some(chunk) = source.next_chunk()? {
            out.clear();
            packer.pack_into(chunk, &meta.codes, &mut out)?;
            sink.write_all(&out)?;
            written += out.len() as u64;
            processed += chunk.len() as u64;
            progress.advance(Stage::Pack, processed);
        }
        if let Some(last) = packer.flush() {
            sink.write_all(&[last])?;
            written += 1;
        }

        if packer.bits_packed() != meta.bit_count {
            return Err(CodecError::SourceChanged {
                expected: meta.bit_count,
                actual: packer.bits_packed(),
            });
        }
        Ok(written)
    }

    /// Encode `reader` into `sink`: scan, write the header, rewind, pack.
    pub fn encode<R, W>(&self, reader: R, sink: W) -> Result<EncodeSummary>
    where
        R: Read + Seek,
        W: Write,
    {
        self.encode_with_progress(reader, sink, &mut NoProgress)
    }

    pub fn encode_with_progress<R, W, P>(
        &self,
        mut reader: R,
        mut sink: W,
        progress: &mut P,
    ) -> Result<EncodeSummary>
    where
        R: Read + Seek,
        W: Write,
        P: Progress + ?Sized,
    {
        let start = reader.stream_position()?;
        let frequencies = {
            let mut source = ReaderSource::new(&mut reader, self.config.chunk_size);
            self.scan_with_progress(&mut source, progress)?
        };
        debug!(bytes = frequencies.total(), symbols = frequencies.len(), "scan pass done");

        let meta = Self::plan(&frequencies)?;
        let header_len = write_header(&mut sink, &meta)? as u64;

        // an empty table still needs pass 2 to see that the source stayed empty
        reader.seek(SeekFrom::Start(start))?;
        let payload_len = {
            let mut source = ReaderSource::new(&mut reader, self.config.chunk_size);
            self.pack_pass(&mut source, &meta, &mut sink, progress)?
        };
        sink.flush()?;
        debug!(header_len, payload_len, "pack pass done");

        Ok(EncodeSummary {
            original_length: meta.original_length,
            header_len,
            payload_len,
            bit_count: meta.bit_count,
            symbols: meta.codes.len(),
        })
    }

    /// Decode an encoded stream from `reader` into `sink`.
    pub fn decode<R, W>(&self, reader: R, sink: W) -> Result<DecodeSummary>
    where
        R: Read,
        W: Write,
    {
        self.decode_with_progress(reader, sink, &mut NoProgress)
    }

    pub fn decode_with_progress<R, W, P>(
        &self,
        reader: R,
        mut sink: W,
        progress: &mut P,
    ) -> Result<DecodeSummary>
    where
        R: Read,
        W: Write,
        P: Progress + ?Sized,
    {
        let mut reader = BufReader::with_capacity(self.config.chunk_size, reader);
        let (meta, header_len) = read_header_with_len(&mut reader, self.config.max_header_len)?;
        let header_len = header_len as u64;
        debug!(
            symbols = meta.codes.len(),
            original_length = meta.original_length,
            bit_count = meta.bit_count,
            "header read"
        );

        let mut unpacker = BitUnpacker::new(&meta.codes, meta.bit_count)?;
        let mut source = ReaderSource::new(&mut reader, self.config.chunk_size);
        let mut out = Vec::with_capacity(self.config.chunk_size.saturating_mul(2));
        let mut processed = 0u64;

        while let Some(chunk) = source.next_chunk()? {
            out.clear();
            unpacker.unpack_into(chunk, &mut out)?;
            sink.write_all(&out)?;
            processed += chunk.len() as u64;
            progress.advance(Stage::Unpack, header_len + processed);
        }
        unpacker.finish()?;
        check_length(&meta, unpacker.symbols_decoded())?;
        sink.flush()?;

        Ok(DecodeSummary {
            original_length: meta.original_length,
            header_len,
            payload_len: processed,
        })
    }

    /// Encode the file at `src` into a new file at `dst`.
    ///
    /// `dst` must not exist yet. If the session fails, whatever was written to
    /// `dst` is removed before the error is returned.
    pub fn encode_file(&self, src: &Path, dst: &Path) -> Result<EncodeSummary> {
        self.encode_file_with_progress(src, dst, &mut NoProgress)
    }

    pub fn encode_file_with_progress<P>(
        &self,
        src: &Path,
        dst: &Path,
        progress: &mut P,
    ) -> Result<EncodeSummary>
    where
        P: Progress + ?Sized,
    {
        paths::validate_source(src)?;
        let input = File::open(src)?;
        with_new_file(dst, |output| self.encode_with_progress(input, BufWriter::new(output), progress))
    }

    /// Decode the file at `src` into a new file at `dst`, with the same cleanup
    /// guarantees as [`encode_file`](Self::encode_file).
    pub fn decode_file(&self, src: &Path, dst: &Path) -> Result<DecodeSummary> {
        self.decode_file_with_progress(src, dst, &mut NoProgress)
    }

    pub fn decode_file_with_progress<P>(
        &self,
        src: &Path,
        dst: &Path,
        progress: &mut P,
    ) -> Result<DecodeSummary>
    where
        P: Progress + ?Sized,
    {
        paths::validate_source(src)?;
        let input = File::open(src)?;
        with_new_file(dst, |output| self.decode_with_progress(input, BufWriter::new(output), progress))
    }

    /// Encode a buffer into an in-memory [`CompressedData`].
    pub fn compress(&self, data: &[u8]) -> Result<CompressedData> {
        let frequencies = self.scan(&mut SliceSource::new(data, self.config.chunk_size))?;
        let meta = Self::plan(&frequencies)?;

        let mut payload = Vec::with_capacity(meta.payload_len() as usize);
        let mut source = SliceSource::new(data, self.config.chunk_size);
        self.pack_pass(&mut source, &meta, &mut payload, &mut NoProgress)?;

        Ok(CompressedData { meta, payload })
    }

    pub fn decompress(&self, compressed: &CompressedData) -> Result<Vec<u8>> {
        compressed.validate()?;
        let meta = &compressed.meta;
        let mut unpacker = BitUnpacker::new(&meta.codes, meta.bit_count)?;

        let bound = (compressed.payload.len() as u64).saturating_mul(8);
        let mut result = Vec::with_capacity(meta.original_length.min(bound) as usize);

        let mut source = SliceSource::new(&compressed.payload, self.config.chunk_size);
        while let Some(chunk) = source.next_chunk()? {
            unpacker.unpack_into(chunk, &mut result)?;
        }
        unpacker.finish()?;
        check_length(meta, unpacker.symbols_decoded())?;

        Ok(result)
    }

    /// Encode a buffer into the on-disk format.
    pub fn encode_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode(Cursor::new(data), &mut out)?;
        Ok(out)
    }

    /// Decode a buffer holding the on-disk format.
    pub fn decode_bytes(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.decode(encoded, &mut out)?;
        Ok(out)
    }
}

fn check_length(meta: &EncodingMetaData, decoded: u64) -> Result<()> {
    if decoded != meta.original_length {
        return Err(CodecError::corrupt(format!(
            "expected {} bytes, decoded {}",
            meta.original_length, decoded
        )));
    }
    Ok(())
}

/// Run `session` against a freshly created `dst`, deleting `dst` if it fails.
fn with_new_file<T, F>(dst: &Path, session: F) -> Result<T>
where
    F: FnOnce(&mut File) -> Result<T>,
{
    let mut output = OpenOptions::new().write(true).create_new(true).open(dst)?;
    let result = session(&mut output);
    drop(output);

    if let Err(e) = &result {
        debug!(path = %dst.display(), error = %e, "session failed, removing partial output");
        if let Err(rm) = fs::remove_file(dst) {
            warn!(path = %dst.display(), error = %rm, "could not remove partial output");
        }
    }
    result
}
