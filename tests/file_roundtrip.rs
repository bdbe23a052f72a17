//! File-level encode/decode sessions: cleanup on failure, corrupt inputs,
//! and independent concurrent sessions.

use std::fs;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use huffpack::{CodecConfig, CodecError, HuffmanCodec, Stage};

const TEXT: &str = "It was the best of times, it was the worst of times, it was the age of \
                    wisdom, it was the age of foolishness, it was the epoch of belief, it was \
                    the epoch of incredulity, it was the season of Light, it was the season of \
                    Darkness.";

fn binary_blob(len: usize) -> Vec<u8> {
    // skewed distribution over the whole byte range
    let mut state = 0x2545_f491u32;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let r = state % 1000;
            if r < 200 {
                r as u8
            } else {
                (r % 16) as u8
            }
        })
        .collect()
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("text.txt");
    let encoded = dir.path().join("text.txt.huff");
    let restored = dir.path().join("restored.txt");
    fs::write(&src, TEXT).unwrap();

    let codec = HuffmanCodec::with_config(CodecConfig::default().with_chunk_size(7)).unwrap();
    let summary = codec.encode_file(&src, &encoded).unwrap();
    assert_eq!(summary.original_length, TEXT.len() as u64);
    assert_eq!(fs::metadata(&encoded).unwrap().len(), summary.encoded_len());

    let decoded = codec.decode_file(&encoded, &restored).unwrap();
    assert_eq!(decoded.original_length, TEXT.len() as u64);
    assert_eq!(fs::read_to_string(&restored).unwrap(), TEXT);
}

#[test]
fn test_binary_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("blob.bin");
    let encoded = dir.path().join("blob.bin.huff");
    let restored = dir.path().join("blob.out");
    let data = binary_blob(200_000);
    fs::write(&src, &data).unwrap();

    let codec = HuffmanCodec::new();
    let summary = codec.encode_file(&src, &encoded).unwrap();
    assert!(summary.encoded_len() < data.len() as u64);

    codec.decode_file(&encoded, &restored).unwrap();
    assert_eq!(fs::read(&restored).unwrap(), data);
}

#[test]
fn test_empty_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("empty");
    let encoded = dir.path().join("empty.huff");
    let restored = dir.path().join("empty.out");
    fs::write(&src, b"").unwrap();

    let codec = HuffmanCodec::new();
    let summary = codec.encode_file(&src, &encoded).unwrap();
    assert_eq!(summary.payload_len, 0);
    assert_eq!(summary.symbols, 0);

    codec.decode_file(&encoded, &restored).unwrap();
    assert!(fs::read(&restored).unwrap().is_empty());
}

#[test]
fn test_existing_destination_is_not_touched() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("a.txt");
    let dst = dir.path().join("a.txt.huff");
    fs::write(&src, TEXT).unwrap();
    fs::write(&dst, b"keep me").unwrap();

    let err = HuffmanCodec::new().encode_file(&src, &dst).unwrap_err();
    assert!(matches!(err, CodecError::Io(ref e) if e.kind() == io::ErrorKind::AlreadyExists));
    assert_eq!(fs::read(&dst).unwrap(), b"keep me".to_vec());
}

#[test]
fn test_invalid_source() {
    let dir = tempfile::tempdir().unwrap();
    let codec = HuffmanCodec::new();

    let err = codec
        .encode_file(&dir.path().join("missing"), &dir.path().join("missing.huff"))
        .unwrap_err();
    assert!(matches!(err, CodecError::InvalidInput { .. }));

    let err = codec.encode_file(dir.path(), &dir.path().join("dir.huff")).unwrap_err();
    assert!(matches!(err, CodecError::InvalidInput { .. }));
    assert!(!dir.path().join("dir.huff").exists());
}

#[test]
fn test_failed_decode_removes_partial_output() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("t.txt");
    let encoded = dir.path().join("t.txt.huff");
    let restored = dir.path().join("t.out");
    fs::write(&src, TEXT).unwrap();

    let codec = HuffmanCodec::with_config(CodecConfig::default().with_chunk_size(4)).unwrap();
    codec.encode_file(&src, &encoded).unwrap();

    let mut bytes = fs::read(&encoded).unwrap();
    bytes.truncate(bytes.len() - 3);
    fs::write(&encoded, &bytes).unwrap();

    let err = codec.decode_file(&encoded, &restored).unwrap_err();
    assert!(matches!(err, CodecError::TruncatedPayload { .. }));
    assert!(!restored.exists());
}

/// Serves different bytes on the second pass, like a file edited mid-encode.
struct ShiftingSource {
    first: Cursor<Vec<u8>>,
    second: Cursor<Vec<u8>>,
    rewound: bool,
}

impl Read for ShiftingSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.rewound {
            self.second.read(buf)
        } else {
            self.first.read(buf)
        }
    }
}

impl Seek for ShiftingSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        // stream_position() seeks from Current, so only the rewind lands here
        if pos == SeekFrom::Start(0) {
            self.rewound = true;
        }
        self.first.seek(pos)
    }
}

fn shifting(first: &[u8], second: &[u8]) -> ShiftingSource {
    ShiftingSource {
        first: Cursor::new(first.to_vec()),
        second: Cursor::new(second.to_vec()),
        rewound: false,
    }
}

#[test]
fn test_source_gaining_a_new_byte_fails() {
    let err = HuffmanCodec::new()
        .encode(shifting(b"aabc", b"aabd"), Vec::new())
        .unwrap_err();
    assert!(matches!(err, CodecError::MissingCodeEntry { byte: b'd' }));
}

#[test]
fn test_empty_source_growing_between_passes_fails() {
    let err = HuffmanCodec::new()
        .encode(shifting(b"", b"new"), Vec::new())
        .unwrap_err();
    assert!(matches!(err, CodecError::MissingCodeEntry { byte: b'n' }));
}

#[test]
fn test_source_changing_length_fails() {
    let err = HuffmanCodec::new()
        .encode(shifting(b"aabc", b"aabcc"), Vec::new())
        .unwrap_err();
    assert!(matches!(err, CodecError::SourceChanged { expected: 6, actual: 8 }));
}

#[test]
fn test_file_edited_between_passes_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("live.txt");
    let dst = dir.path().join("live.txt.huff");
    fs::write(&src, b"aabc").unwrap();

    // same length, so the scan pass still ends at offset 4
    let mut edited = false;
    let err = HuffmanCodec::new()
        .encode_file_with_progress(&src, &dst, &mut |stage: Stage, n: u64| {
            if stage == Stage::Scan && n == 4 && !edited {
                fs::write(&src, b"aabd").unwrap();
                edited = true;
            }
        })
        .unwrap_err();

    assert!(edited);
    assert!(matches!(err, CodecError::MissingCodeEntry { byte: b'd' }));
    assert!(!dst.exists());
}

#[test]
fn test_corrupt_inputs() {
    let codec = HuffmanCodec::new();
    let good = codec.encode_bytes(TEXT.as_bytes()).unwrap();

    let mut trailing = good.clone();
    trailing.push(0);
    assert!(matches!(codec.decode_bytes(&trailing), Err(CodecError::CorruptPayload { .. })));

    let truncated = &good[..good.len() - 1];
    assert!(matches!(codec.decode_bytes(truncated), Err(CodecError::TruncatedPayload { .. })));

    let header_only = &good[..good.iter().position(|&b| b == b'*').unwrap()];
    assert!(matches!(codec.decode_bytes(header_only), Err(CodecError::MalformedTable { .. })));

    assert!(matches!(codec.decode_bytes(b"garbage"), Err(CodecError::MalformedTable { .. })));
    assert!(codec.decode_bytes(b"").unwrap_err().is_format_error());
}

fn encode_path(codec: &HuffmanCodec, path: &Path) -> Vec<u8> {
    let mut out = Vec::new();
    codec.encode(fs::File::open(path).unwrap(), &mut out).unwrap();
    out
}

#[test]
fn test_concurrent_sessions_match_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let inputs: Vec<_> = (0..6)
        .map(|i| {
            let path = dir.path().join(format!("in{}.bin", i));
            let mut data = binary_blob(10_000 + i * 3_000);
            data.extend_from_slice(TEXT.as_bytes());
            fs::write(&path, &data).unwrap();
            path
        })
        .collect();

    let codec = HuffmanCodec::with_config(CodecConfig::default().with_chunk_size(1024)).unwrap();
    let sequential: Vec<Vec<u8>> = inputs.iter().map(|p| encode_path(&codec, p)).collect();

    let concurrent: Vec<Vec<u8>> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|p| {
                let codec = &codec;
                scope.spawn(move || encode_path(codec, p))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, concurrent);
    for (path, encoded) in inputs.iter().zip(&concurrent) {
        assert_eq!(codec.decode_bytes(encoded).unwrap(), fs::read(path).unwrap());
    }
}
