//! Audit banner extraction.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Upper bound on the bytes inspected for the banner.
pub const BANNER_LIMIT: u64 = 256;

/// Reads the first line of `path`.
///
/// At most [`BANNER_LIMIT`] bytes are read. Invalid UTF-8 is replaced and
/// the trailing line terminator is removed.
///
/// # Errors
///
/// Returns the underlying I/O error when the file cannot be opened or read.
pub fn read_first_line(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file.take(BANNER_LIMIT));
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line)?;
    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.pop();
    }
    Ok(String::from_utf8_lossy(&line).into_owned())
}
