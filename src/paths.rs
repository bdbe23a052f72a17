//! Filesystem helpers for the command-line tool: source checks, target
//! directories and output names that never overwrite an existing file.

use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CodecError, Result};

/// Extension given to encoded files.
pub const ENCODED_EXTENSION: &str = "huff";

/// Extension given to decoded files whose name has no `.huff` suffix to strip.
pub const DECODED_EXTENSION: &str = "out";

/// Check that `path` is an existing, readable regular file.
pub fn validate_source(path: &Path) -> Result<()> {
    let meta = fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            CodecError::invalid_input(format!("{} does not exist", path.display()))
        }
        _ => CodecError::invalid_input(format!("cannot access {}: {}", path.display(), e)),
    })?;
    if !meta.is_file() {
        return Err(CodecError::invalid_input(format!("{} is not a file", path.display())));
    }
    File::open(path)
        .map_err(|e| CodecError::invalid_input(format!("cannot read {}: {}", path.display(), e)))?;
    Ok(())
}

/// Make sure `dir` exists and is a writable directory, creating it if needed.
pub fn prepare_target_dir(dir: &Path) -> Result<()> {
    match fs::metadata(dir) {
        Ok(meta) if !meta.is_dir() => Err(CodecError::invalid_input(format!(
            "{} is not a directory",
            dir.display()
        ))),
        Ok(meta) if meta.permissions().readonly() => Err(CodecError::invalid_input(format!(
            "{} is not writable",
            dir.display()
        ))),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Return `path` if nothing exists there, otherwise the first free
/// `<stem>_<n><rest>` next to it, where the stem ends at the first dot.
///
/// `notes.tar.gz` becomes `notes_0.tar.gz`, then `notes_1.tar.gz`, and so on.
/// Names that are not valid UTF-8 are split on their raw bytes.
pub fn non_colliding_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let name = path.file_name().unwrap_or_default();
    let bytes = name.as_encoded_bytes();
    let split = bytes
        .iter()
        .skip(1)
        .position(|&b| b == b'.')
        .map_or(bytes.len(), |i| i + 1);
    let (stem, rest) = split_name(name, split);

    (0u64..)
        .map(|i| {
            let mut candidate = stem.to_os_string();
            candidate.push(format!("_{}", i));
            candidate.push(rest);
            path.with_file_name(candidate)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Split `name` at byte `at`, which must sit right before an ASCII byte or at the end.
fn split_name(name: &OsStr, at: usize) -> (&OsStr, &OsStr) {
    let bytes = name.as_encoded_bytes();
    debug_assert!(at == bytes.len() || bytes[at].is_ascii());
    // SAFETY: both halves are split immediately before an ASCII character or at
    // the end of the string, which keeps each half a valid encoded OsStr.
    unsafe {
        (
            OsStr::from_encoded_bytes_unchecked(&bytes[..at]),
            OsStr::from_encoded_bytes_unchecked(&bytes[at..]),
        )
    }
}

/// `<dir>/<source name>.huff`, before collision handling.
pub fn encoded_path(source: &Path, dir: &Path) -> PathBuf {
    let mut name: OsString = source.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(ENCODED_EXTENSION);
    dir.join(name)
}

/// `<dir>/<source name without .huff>`, or `<source name>.out` when there is
/// no suffix to strip.
pub fn decoded_path(source: &Path, dir: &Path) -> PathBuf {
    let name = source.file_name().unwrap_or_default();
    let bytes = name.as_encoded_bytes();
    let suffix = format!(".{}", ENCODED_EXTENSION);

    if bytes.len() > suffix.len() && bytes.ends_with(suffix.as_bytes()) {
        let (stem, _) = split_name(name, bytes.len() - suffix.len());
        return dir.join(stem);
    }
    let mut fallback = name.to_os_string();
    fallback.push(".");
    fallback.push(DECODED_EXTENSION);
    dir.join(fallback)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate_source() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("input.txt");
        fs::write(&file, b"data").unwrap();

        assert!(validate_source(&file).is_ok());
        assert!(matches!(
            validate_source(&dir.path().join("missing.txt")),
            Err(CodecError::InvalidInput { .. })
        ));
        assert!(matches!(validate_source(dir.path()), Err(CodecError::InvalidInput { .. })));
    }

    #[test]
    fn test_prepare_target_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        prepare_target_dir(&nested).unwrap();
        assert!(nested.is_dir());
        prepare_target_dir(&nested).unwrap();

        let file = dir.path().join("plain");
        fs::write(&file, b"").unwrap();
        assert!(matches!(prepare_target_dir(&file), Err(CodecError::InvalidInput { .. })));
    }

    #[test]
    fn test_non_colliding_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("notes.tar.gz");
        assert_eq!(non_colliding_path(&target), target);

        fs::write(&target, b"").unwrap();
        assert_eq!(non_colliding_path(&target), dir.path().join("notes_0.tar.gz"));

        fs::write(dir.path().join("notes_0.tar.gz"), b"").unwrap();
        assert_eq!(non_colliding_path(&target), dir.path().join("notes_1.tar.gz"));

        let plain = dir.path().join("README");
        fs::write(&plain, b"").unwrap();
        assert_eq!(non_colliding_path(&plain), dir.path().join("README_0"));

        let hidden = dir.path().join(".env");
        fs::write(&hidden, b"").unwrap();
        assert_eq!(non_colliding_path(&hidden), dir.path().join(".env_0"));
    }

    #[test]
    fn test_output_names() {
        let out = Path::new("/out");
        assert_eq!(encoded_path(Path::new("/src/a.txt"), out), PathBuf::from("/out/a.txt.huff"));
        assert_eq!(decoded_path(Path::new("/src/a.txt.huff"), out), PathBuf::from("/out/a.txt"));
        assert_eq!(decoded_path(Path::new("/src/blob"), out), PathBuf::from("/out/blob.out"));
        assert_eq!(decoded_path(Path::new("/src/.huff"), out), PathBuf::from("/out/.huff.out"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_keep_their_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(OsStr::from_bytes(b"caf\xe9.txt"));
        fs::write(&target, b"").unwrap();

        assert_eq!(
            non_colliding_path(&target),
            dir.path().join(OsStr::from_bytes(b"caf\xe9_0.txt"))
        );
        assert_eq!(
            decoded_path(Path::new(OsStr::from_bytes(b"/src/\xff.huff")), Path::new("/out")),
            Path::new("/out").join(OsStr::from_bytes(b"\xff"))
        );
    }
}
