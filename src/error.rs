//! Crate-wide error type.
//!
//! All fallible entry points in `chario` return [`Error`]. The variants mirror the error
//! categories from the design document: malformed input, numbers JSON cannot represent,
//! running out of input mid-value, caller misuse, and failures bubbled up from the
//! underlying byte/character source.

use std::fmt;
use std::io;
use std::sync::Arc;

use thiserror::Error;

/// A 1-based line/column position, optionally paired with a byte offset into the chunk
/// that was being scanned when the error occurred.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Position {
    /// 1-based line number, or `0` if the source doesn't track lines (raw CSV tokenizer).
    pub line: usize,
    /// 1-based column number, or `0` if unknown.
    pub column: usize,
    /// Byte offset within the chunk currently being scanned, if available.
    pub chunk_offset: Option<usize>,
}

impl Position {
    /// A position with no line/column information (e.g. binary CSV tokenizing without a
    /// [`crate::LineNumberReader`] front-end).
    pub const UNKNOWN: Position = Position { line: 0, column: 0, chunk_offset: None };

    /// Creates a position at the given 1-based line/column.
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column, chunk_offset: None }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 && self.column == 0 {
            write!(f, "<unknown position>")
        } else {
            write!(f, "line {} column {}", self.line, self.column)
        }
    }
}

/// Errors produced while reading or writing CSV/JSON through `chario`.
#[derive(Error, Clone, Debug)]
pub enum Error {
    /// Malformed CSV or JSON input: unexpected token, unterminated quote, invalid escape,
    /// non-string object key, trailing comma, empty array/object entry, and similar.
    #[error("malformed input at {position}: {message}")]
    InputShape {
        /// Human-readable description of what was wrong.
        message: String,
        /// Where in the input the problem was found.
        position: Position,
    },

    /// The JSON writer was asked to emit `NaN` or `±Infinity`, which JSON cannot represent.
    #[error("cannot encode non-finite number {value} as JSON")]
    NumericRange {
        /// `Display` form of the offending value, for the error message only.
        value: String,
    },

    /// The reader reached end-of-input while a value (or the remainder of a structure) was
    /// still required. Distinct from [`Error::InputShape`] so callers can special-case
    /// "just ran out of data" (e.g. to decide whether to request more input).
    #[error("unexpected end of input at {position}")]
    EndOfInput {
        /// Where the input ran out.
        position: Position,
    },

    /// Caller misuse: a single-character option was given a multi-character value,
    /// pushback was attempted twice in a row, a buffer size was too small for the
    /// configured queue depth, and similar programmer errors.
    #[error("invalid usage: {0}")]
    Usage(String),

    /// An error surfaced from the underlying character/byte source (file, socket, pipe).
    /// Wrapped in an `Arc` so `Error` stays `Clone`, which the async producer/consumer path
    /// needs in order to store one error in a shared envelope and hand a copy back to the
    /// consumer.
    #[error("I/O error: {0}")]
    UpstreamIo(#[from] ArcIoError),
}

impl Error {
    /// Shorthand for constructing an [`Error::InputShape`].
    pub fn input_shape(message: impl Into<String>, position: Position) -> Self {
        Error::InputShape { message: message.into(), position }
    }

    /// Shorthand for constructing an [`Error::Usage`].
    pub fn usage(message: impl Into<String>) -> Self {
        Error::Usage(message.into())
    }

    /// True if this error represents a clean end-of-input rather than malformed data.
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, Error::EndOfInput { .. })
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::UpstreamIo(ArcIoError(Arc::new(err)))
    }
}

/// A [`std::io::Error`] wrapped so it can be cloned; see [`Error::UpstreamIo`].
#[derive(Clone, Debug)]
pub struct ArcIoError(pub Arc<io::Error>);

impl fmt::Display for ArcIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ArcIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_input_detection() {
        let err = Error::EndOfInput { position: Position::new(3, 1) };
        assert!(err.is_end_of_input());
        let err = Error::usage("bad option");
        assert!(!err.is_end_of_input());
    }

    #[test]
    fn position_display_unknown() {
        assert_eq!(Position::UNKNOWN.to_string(), "<unknown position>");
        assert_eq!(Position::new(2, 5).to_string(), "line 2 column 5");
    }

    #[test]
    fn io_error_roundtrips_through_from() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "boom");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::UpstreamIo(_)));
        assert!(err.to_string().contains("boom"));
    }
}
