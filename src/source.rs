//! Chunked byte sources for the codec passes.

use std::io::{self, Read};

use crate::config::MAX_CHUNK_SIZE;

/// A byte source consumed one chunk at a time. `None` marks the end of the stream.
pub trait ChunkSource {
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>>;
}

/// Reads a [`Read`] in chunks of up to `chunk_size` bytes, capped at [`MAX_CHUNK_SIZE`].
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        ReaderSource {
            reader,
            buf: vec![0; chunk_size.clamp(1, MAX_CHUNK_SIZE)],
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ChunkSource for ReaderSource<R> {
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(&self.buf[..n])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Serves an in-memory buffer in fixed-size chunks.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    chunk_size: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8], chunk_size: usize) -> Self {
        SliceSource {
            data,
            chunk_size: chunk_size.max(1),
        }
    }
}

impl ChunkSource for SliceSource<'_> {
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        if self.data.is_empty() {
            return Ok(None);
        }
        let n = self.chunk_size.min(self.data.len());
        let (chunk, rest) = self.data.split_at(n);
        self.data = rest;
        Ok(Some(chunk))
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;

    fn drain<S: ChunkSource>(mut source: S) -> Vec<Vec<u8>> {
        let mut chunks = Vec::new();
        while let Some(chunk) = source.next_chunk().unwrap() {
            chunks.push(chunk.to_vec());
        }
        chunks
    }

    #[test]
    fn test_slice_source_chunks() {
        let chunks = drain(SliceSource::new(b"abcdefg", 3));
        assert_eq!(chunks, vec![b"abc".to_vec(), b"def".to_vec(), b"g".to_vec()]);
        assert!(drain(SliceSource::new(b"", 3)).is_empty());
    }

    #[test]
    fn test_reader_source_chunks() {
        let chunks = drain(ReaderSource::new(Cursor::new(b"abcdefg".to_vec()), 4));
        assert_eq!(chunks.concat(), b"abcdefg".to_vec());
        assert!(chunks.iter().all(|c| c.len() <= 4 && !c.is_empty()));
    }

    #[test]
    fn test_reader_source_caps_its_buffer() {
        let chunks = drain(ReaderSource::new(Cursor::new(b"abc".to_vec()), usize::MAX));
        assert_eq!(chunks, vec![b"abc".to_vec()]);
    }
}
