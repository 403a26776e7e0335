//! Normalizes CR / LF / CRLF line endings to LF while tracking 1-based line/column
//! coordinates, with its own one-character pushback layered on top of [`CharReader`]'s.
//!
//! This sits in front of [`CharReader`] only when position reporting is wanted (the JSON
//! reader uses it for "unexpected character at line L column C" messages); the CSV tokenizer
//! reads raw chunks directly and does its own CR/CRLF handling inline on the hot path.

use crate::char_reader::CharReader;
use crate::error::{Position, Result};
use crate::supplier::BufferSupplier;

/// The (line, column) coordinates of a single character, saved so a pushback can restore the
/// reader to exactly the state it was in before that character was read.
#[derive(Copy, Clone, Debug)]
struct Saved {
    c: char,
    line: usize,
    column: usize,
    last_column: usize,
}

/// Wraps a [`CharReader`], normalizing `\r`, `\n`, and `\r\n` to `\n` and tracking position.
pub struct LineNumberReader<S> {
    inner: CharReader<S>,
    line: usize,
    column: usize,
    /// The column value just before the most recent line break, so pushing back a `\n`
    /// restores the column the cursor had before that break.
    last_column: usize,
    repush: Option<Saved>,
    last_read: Option<Saved>,
    eos: bool,
}

impl<S: BufferSupplier> LineNumberReader<S> {
    /// Wraps `inner`, starting position tracking at line 1, column 1.
    pub fn new(inner: CharReader<S>) -> Self {
        LineNumberReader { inner, line: 1, column: 1, last_column: 1, repush: None, last_read: None, eos: false }
    }

    /// The coordinates of the character most recently returned by [`LineNumberReader::read`].
    /// Intended for error messages ("unexpected character X at {here}").
    pub fn last_position(&self) -> Position {
        match self.last_read {
            Some(saved) => Position::new(saved.line, saved.column),
            None => Position::new(self.line, self.column),
        }
    }

    /// The coordinates of the character that the next [`LineNumberReader::read`] call will
    /// return, useful for reporting the position of end-of-input.
    pub fn current_position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn raw_read_normalized(&mut self) -> Result<Option<char>> {
        let Some(c) = self.inner.read()? else {
            return Ok(None);
        };
        if c == '\r' {
            match self.inner.read()? {
                Some('\n') => {}
                Some(_) => self.inner.pushback()?,
                None => {}
            }
            Ok(Some('\n'))
        } else {
            Ok(Some(c))
        }
    }

    /// Reads the next normalized character, or `None` at end of stream. Once `None` has been
    /// observed, subsequent calls keep returning `None`.
    pub fn read(&mut self) -> Result<Option<char>> {
        if let Some(saved) = self.repush.take() {
            self.line = saved.line;
            self.column = saved.column;
            self.last_column = saved.last_column;
            self.advance(saved.c);
            self.last_read = Some(saved);
            return Ok(Some(saved.c));
        }

        if self.eos {
            return Ok(None);
        }

        let before = Saved { c: '\0', line: self.line, column: self.column, last_column: self.last_column };
        match self.raw_read_normalized()? {
            Some(c) => {
                let saved = Saved { c, ..before };
                self.advance(c);
                self.last_read = Some(saved);
                Ok(Some(c))
            }
            None => {
                self.eos = true;
                Ok(None)
            }
        }
    }

    fn advance(&mut self, c: char) {
        if c == '\n' {
            self.last_column = self.column;
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Un-reads the most recently returned character. A silent no-op once end-of-stream has
    /// been observed (matching the design document's EOS semantics), and a usage error if
    /// called twice in a row without an intervening read.
    pub fn pushback(&mut self) -> Result<()> {
        if self.eos {
            return Ok(());
        }
        let Some(saved) = self.last_read.take() else {
            return Err(crate::error::Error::usage("pushback called without a preceding read, or twice in a row"));
        };
        self.line = saved.line;
        self.column = saved.column;
        self.last_column = saved.last_column;
        self.repush = Some(saved);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supplier::{AllocatingSupplier, StrSource};

    fn make(s: &str) -> LineNumberReader<AllocatingSupplier<StrSource<'_>>> {
        LineNumberReader::new(CharReader::new(AllocatingSupplier::new(StrSource::new(s), 4).unwrap()))
    }

    #[test]
    fn normalizes_crlf_and_lone_cr_to_lf() {
        let mut r = make("a\r\nb\rc\nd");
        let mut out = String::new();
        while let Some(c) = r.read().unwrap() {
            out.push(c);
        }
        assert_eq!(out, "a\nb\nc\nd");
    }

    #[test]
    fn tracks_line_and_column() {
        let mut r = make("ab\ncd");
        assert_eq!(r.read().unwrap(), Some('a'));
        assert_eq!(r.last_position(), Position::new(1, 1));
        assert_eq!(r.read().unwrap(), Some('b'));
        assert_eq!(r.last_position(), Position::new(1, 2));
        assert_eq!(r.read().unwrap(), Some('\n'));
        assert_eq!(r.last_position(), Position::new(1, 3));
        assert_eq!(r.read().unwrap(), Some('c'));
        assert_eq!(r.last_position(), Position::new(2, 1));
    }

    #[test]
    fn pushback_restores_column_across_newline() {
        let mut r = make("a\nb");
        r.read().unwrap(); // 'a' at (1,1)
        r.read().unwrap(); // '\n' at (1,2)
        assert_eq!(r.current_position(), Position::new(2, 1));
        r.pushback().unwrap();
        assert_eq!(r.current_position(), Position::new(1, 2));
        assert_eq!(r.read().unwrap(), Some('\n'));
        assert_eq!(r.current_position(), Position::new(2, 1));
    }

    #[test]
    fn pushback_after_eos_is_silent_noop() {
        let mut r = make("a");
        assert_eq!(r.read().unwrap(), Some('a'));
        assert_eq!(r.read().unwrap(), None);
        r.pushback().unwrap();
        assert_eq!(r.read().unwrap(), None);
    }

    #[test]
    fn crlf_split_across_chunk_boundary_is_still_one_newline() {
        // buffer size is 4, so "ab\r\ncd" puts the '\n' right at a chunk edge with the '\r'
        // preceding it in the same chunk in some splits and not others depending on size;
        // exercise a couple of sizes to make sure the lookahead crosses correctly.
        for size in [1usize, 2, 3, 4, 8] {
            let sup = AllocatingSupplier::new(StrSource::new("ab\r\ncd"), size).unwrap();
            let mut r = LineNumberReader::new(CharReader::new(sup));
            let mut out = String::new();
            while let Some(c) = r.read().unwrap() {
                out.push(c);
            }
            assert_eq!(out, "ab\ncd", "mismatch at buffer size {size}");
        }
    }
}
