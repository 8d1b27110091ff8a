use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Reads a whole file and decodes it as UTF-8.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and
/// [`Error::InvalidUtf8`] if its bytes are not valid UTF-8.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::read(path, e))?;
    String::from_utf8(bytes).map_err(|_| Error::invalid_utf8(path))
}

/// Counts lines the way editors do: a trailing newline does not open a new line.
#[must_use]
pub(crate) fn line_count(text: &str) -> usize {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return 0;
    }

    let newlines = memchr::memchr_iter(b'\n', bytes).count();
    if bytes.ends_with(b"\n") {
        newlines
    } else {
        newlines + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_read_text() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("main.go");
        file.write_str("package main\n").unwrap();

        assert_eq!(read_text(file.path()).unwrap(), "package main\n");
    }

    #[test]
    fn test_read_text_preserves_bytes() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("crlf.py");
        file.write_str("a = 1\r\n\tb = 'é'\r\n").unwrap();

        assert_eq!(read_text(file.path()).unwrap(), "a = 1\r\n\tb = 'é'\r\n");
    }

    #[test]
    fn test_read_text_invalid_utf8() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("blob.go");
        file.write_binary(&[0x66, 0x6f, 0xff, 0xfe, 0x00]).unwrap();

        assert!(read_text(file.path()).unwrap_err().is_invalid_utf8());
    }

    #[test]
    fn test_read_text_missing_file() {
        let temp = assert_fs::TempDir::new().unwrap();

        let err = read_text(&temp.path().join("gone.go")).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(""), 0);
        assert_eq!(line_count("one"), 1);
        assert_eq!(line_count("one\n"), 1);
        assert_eq!(line_count("one\ntwo"), 2);
        assert_eq!(line_count("one\ntwo\n\n"), 3);
    }
}
