//! Growable character accumulator used as the scratchpad for decoded field/string values.
//!
//! `CharBuffer` is the generalization of the teacher crate's "dequote on demand" idea
//! (`Cell::try_as_str`): instead of always borrowing a byte range and only allocating when a
//! quoted cell needs unescaping, `chario`'s tokenizers sometimes must *build* the value
//! character-by-character (escape sequences, cross-chunk fields). `CharBuffer` makes that
//! path cheap by growing geometrically and supporting a zero-copy fast path when nothing was
//! ever appended to it.

use crate::intern::CanonicalStringTable;

/// Unicode-whitespace test used by the trim policies below. Matches the common ASCII
/// whitespace set plus the few non-ASCII separators Rust's `char::is_whitespace` already
/// classifies as such.
#[inline]
fn is_ws(c: char) -> bool {
    c.is_whitespace()
}

/// A growable `char` accumulator with optional leading/trailing trim and empty-to-`None`
/// policy.
///
/// Cloning a `CharBuffer` is deliberately not derived: buffers are scratch space owned by a
/// single tokenizer and are never meant to be duplicated.
#[derive(Debug, Default)]
pub struct CharBuffer {
    data: Vec<char>,
    trim_leading: bool,
    trim_trailing: bool,
    nil_on_empty: bool,
}

impl CharBuffer {
    /// Creates an empty buffer with the given trim/nil policy.
    pub fn new(trim_leading: bool, trim_trailing: bool, nil_on_empty: bool) -> Self {
        CharBuffer { data: Vec::new(), trim_leading, trim_trailing, nil_on_empty }
    }

    /// Creates an empty buffer with a pre-reserved capacity.
    pub fn with_capacity(cap: usize, trim_leading: bool, trim_trailing: bool, nil_on_empty: bool) -> Self {
        CharBuffer { data: Vec::with_capacity(cap), trim_leading, trim_trailing, nil_on_empty }
    }

    /// Appends a single character, growing the backing storage geometrically if needed.
    #[inline]
    pub fn append(&mut self, c: char) {
        self.data.push(c);
    }

    /// Appends a slice of characters.
    #[inline]
    pub fn append_slice(&mut self, chars: &[char]) {
        self.data.extend_from_slice(chars);
    }

    /// Appends the characters of a `&str`.
    #[inline]
    pub fn append_str(&mut self, s: &str) {
        self.data.extend(s.chars());
    }

    /// Resets the logical length to zero without shrinking the backing allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Number of characters currently accumulated.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if nothing has been appended since the last [`CharBuffer::clear`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True if the raw (untrimmed) accumulated content is empty or consists entirely of
    /// whitespace — used to tell a genuinely blank line apart from a field whose trimmed
    /// value just happens to be empty (e.g. a quoted `""`).
    #[inline]
    pub fn is_whitespace_or_empty(&self) -> bool {
        self.data.iter().all(|c| is_ws(*c))
    }

    fn trim_bounds(&self) -> (usize, usize) {
        let mut start = 0;
        let mut end = self.data.len();
        if self.trim_leading {
            while start < end && is_ws(self.data[start]) {
                start += 1;
            }
        }
        if self.trim_trailing {
            while end > start && is_ws(self.data[end - 1]) {
                end -= 1;
            }
        }
        (start, end)
    }

    /// Materializes the accumulated content into a string, honoring the configured trim and
    /// nil-on-empty policy. Returns `None` when `nil_on_empty` is set and the post-trim
    /// content is empty.
    pub fn to_string_opt(&self) -> Option<String> {
        let (start, end) = self.trim_bounds();
        if start == end {
            if self.nil_on_empty {
                return None;
            }
            return Some(String::new());
        }
        Some(self.data[start..end].iter().collect())
    }

    /// Like [`CharBuffer::to_string_opt`], but interns the result through a canonical string
    /// table instead of allocating a fresh `String` when an equal one already exists.
    pub fn to_string_interned(&self, table: &mut CanonicalStringTable) -> Option<std::rc::Rc<str>> {
        let (start, end) = self.trim_bounds();
        if start == end {
            return if self.nil_on_empty { None } else { Some(table.intern_chars(&[])) };
        }
        Some(table.intern_chars(&self.data[start..end]))
    }

    /// Fast path for when the buffer is empty: builds (or interns) a string directly from an
    /// external character slice without copying through `self`. Used when a field/string
    /// fits entirely within one chunk and needed no escape processing.
    ///
    /// # Panics
    /// Panics (as a programmer-error guard) if the buffer is not empty; callers must `clear`
    /// or construct a fresh buffer first.
    pub fn to_string_external_opt(&self, external: &[char]) -> Option<String> {
        debug_assert!(self.is_empty(), "to_string_external_opt called on a non-empty CharBuffer");
        let mut start = 0;
        let mut end = external.len();
        if self.trim_leading {
            while start < end && is_ws(external[start]) {
                start += 1;
            }
        }
        if self.trim_trailing {
            while end > start && is_ws(external[end - 1]) {
                end -= 1;
            }
        }
        if start == end {
            if self.nil_on_empty {
                return None;
            }
            return Some(String::new());
        }
        Some(external[start..end].iter().collect())
    }

    /// External-chars counterpart of [`CharBuffer::to_string_interned`].
    pub fn to_string_external_interned(
        &self,
        external: &[char],
        table: &mut CanonicalStringTable,
    ) -> Option<std::rc::Rc<str>> {
        debug_assert!(self.is_empty(), "to_string_external_interned called on a non-empty CharBuffer");
        let mut start = 0;
        let mut end = external.len();
        if self.trim_leading {
            while start < end && is_ws(external[start]) {
                start += 1;
            }
        }
        if self.trim_trailing {
            while end > start && is_ws(external[end - 1]) {
                end -= 1;
            }
        }
        if start == end {
            return if self.nil_on_empty { None } else { Some(table.intern_chars(&[])) };
        }
        Some(table.intern_chars(&external[start..end]))
    }
}
