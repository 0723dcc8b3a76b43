//! Shared line-oriented parsing helper for the MOFF and BALLS readers, grounded on the
//! original `get_next_relevant_line`: strip a `//` comment, trim the remainder, and skip the
//! line entirely if nothing is left.

use std::io::BufRead;

use crate::error::{Error, Result};

/// The relevant (non-comment, non-blank) lines of a text skeleton file, each paired with its
/// 1-based line number for error messages.
pub(crate) fn relevant_lines(path: &std::path::Path) -> Result<Vec<(usize, String)>> {
    let file = std::fs::File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = std::io::BufReader::new(file);
    let mut lines = Vec::new();
    for (number, raw) in reader.lines().enumerate() {
        let raw = raw.map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let without_comment = match raw.find("//") {
            Some(at) => &raw[..at],
            None => raw.as_str(),
        };
        let trimmed = without_comment.trim();
        if !trimmed.is_empty() {
            lines.push((number + 1, trimmed.to_string()));
        }
    }
    Ok(lines)
}

pub(crate) fn parse_error(path: &std::path::Path, format: &'static str, line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        format,
        message: format!("line {line}: {}", message.into()),
    }
}
