//! CSV row tokenizer and reader.
//!
//! The tokenizer state machine mirrors the design document's §4.9 CSV states
//! (`row-start` / `in-field` / `in-quoted` / `post-quote` / `in-comment`), but — unlike the
//! teacher crate, which scans a single borrowed `&[u8]` slice with `memchr3` — it scans one
//! [`crate::CharReader`] character at a time, since the reader's job is precisely to let that
//! scan resume across arbitrarily many chunk boundaries (mid-field, mid-quote, or right after
//! a lone `\r`).

use std::rc::Rc;

use crate::char_buffer::CharBuffer;
use crate::char_reader::CharReader;
use crate::csv::options::{ColumnFilter, CsvOptions, RowProfile};
use crate::error::{Error, Position, Result};
use crate::intern::CanonicalStringTable;
use crate::supplier::BufferSupplier;

/// One CSV field: present text, or absent when `nil_on_empty` collapsed an empty field.
pub type Field = Option<String>;

/// One lexical unit produced by [`CsvReader::next_token`].
#[derive(Debug, PartialEq, Eq)]
pub enum Token {
    Eof,
    Eol,
    FieldSep,
    CommentMark,
}

/// Low-level CSV tokenizer over a [`CharReader`]. Most callers want [`RowReader`] instead;
/// `CsvReader` is exposed for callers who want token-at-a-time control (e.g. to stop at the
/// first field of every row without materializing the rest). After [`CsvReader::next_token`]
/// returns [`Token::FieldSep`], [`Token::Eol`], or [`Token::Eof`], call
/// [`CsvReader::take_field`] to retrieve the field text that token just terminated; on
/// [`Token::CommentMark`], call [`CsvReader::drain_comment_line`] to skip the rest of the
/// comment line before tokenizing again.
pub struct CsvReader<S> {
    reader: CharReader<S>,
    options: CsvOptions,
    field_buf: CharBuffer,
    enable_comment: bool,
    field_was_quoted: bool,
    skip_bom: bool,
}

impl<S: BufferSupplier> CsvReader<S> {
    /// Creates a tokenizer over `reader` with the given dialect options.
    pub fn new(reader: CharReader<S>, options: CsvOptions) -> Self {
        let field_buf = CharBuffer::new(options.trim_leading, options.trim_trailing, options.nil_on_empty);
        CsvReader { reader, options, field_buf, enable_comment: true, field_was_quoted: false, skip_bom: true }
    }

    /// Drains the remainder of a comment line (after a [`Token::CommentMark`]) without
    /// materializing it.
    pub fn drain_comment_line(&mut self) -> Result<()> {
        loop {
            match self.reader.read()? {
                None => return Ok(()),
                Some('\n') => return Ok(()),
                Some('\r') => {
                    if let Some(c2) = self.reader.read()? {
                        if c2 != '\n' {
                            self.reader.pushback()?;
                        }
                    }
                    return Ok(());
                }
                Some(_) => continue,
            }
        }
    }

    /// Retrieves the field text terminated by the token [`CsvReader::next_token`] just
    /// returned, applying the configured trim/nil-on-empty policy.
    pub fn take_field(&mut self) -> Field {
        self.field_buf.to_string_opt()
    }

    /// True if the field just terminated was wrapped in quotes (even if the quoted content
    /// was empty) rather than left bare — distinguishes an explicit `""` from a field that
    /// simply never accumulated any non-whitespace content.
    pub fn field_was_quoted(&self) -> bool {
        self.field_was_quoted
    }

    fn strip_leading_bom(&mut self) -> Result<()> {
        if !self.skip_bom {
            return Ok(());
        }
        self.skip_bom = false;
        if let Some(c) = self.reader.read()? {
            if c != '\u{FEFF}' {
                self.reader.pushback()?;
            }
        }
        Ok(())
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.strip_leading_bom()?;
        self.field_buf.clear();
        self.field_was_quoted = false;
        let mut at_field_start = true;
        let mut in_quotes = false;

        loop {
            if in_quotes {
                match self.reader.read()? {
                    None => {
                        return Err(Error::input_shape("unterminated quoted CSV field", Position::UNKNOWN));
                    }
                    Some(c) if c == self.options.quote => match self.reader.read()? {
                        Some(c2) if c2 == self.options.quote => {
                            self.field_buf.append(self.options.quote);
                        }
                        Some(_) => {
                            self.reader.pushback()?;
                            in_quotes = false;
                        }
                        None => {
                            in_quotes = false;
                        }
                    },
                    Some(c) => self.field_buf.append(c),
                }
                continue;
            }

            let Some(c) = self.reader.read()? else {
                return Ok(Token::Eof);
            };

            if at_field_start && self.enable_comment && self.options.comment == Some(c) {
                return Ok(Token::CommentMark);
            }

            if at_field_start && c == self.options.quote {
                in_quotes = true;
                at_field_start = false;
                self.enable_comment = false;
                self.field_was_quoted = true;
                continue;
            }

            if let Some(escape) = self.options.escape {
                if c == escape {
                    match self.reader.read()? {
                        Some(c2) => {
                            self.field_buf.append(c2);
                            at_field_start = false;
                            self.enable_comment = false;
                            continue;
                        }
                        None => {
                            return Err(Error::input_shape(
                                "escape character at end of input",
                                Position::UNKNOWN,
                            ));
                        }
                    }
                }
            }

            if c == self.options.separator {
                return Ok(Token::FieldSep);
            }

            if c == '\n' {
                return Ok(Token::Eol);
            }

            if c == '\r' {
                match self.reader.read()? {
                    Some('\n') => {}
                    Some(_) => self.reader.pushback()?,
                    None => {}
                }
                return Ok(Token::Eol);
            }

            self.field_buf.append(c);
            at_field_start = false;
            self.enable_comment = false;
        }
    }
}

/// Reads whole CSV rows by looping the tokenizer, applying trim/nil-on-empty and an optional
/// column filter. State-free across rows: nothing but the column mask (once resolved) carries
/// over from one row to the next.
pub struct RowReader<S> {
    csv: CsvReader<S>,
    table: Option<CanonicalStringTable>,
    mask: Option<Vec<bool>>,
    done: bool,
}

impl<S: BufferSupplier> RowReader<S> {
    /// Creates a row reader over `reader` with the given dialect/profile options.
    pub fn new(reader: CharReader<S>, options: CsvOptions) -> Self {
        let profile = options.profile;
        let table = match profile {
            RowProfile::Mutable => Some(CanonicalStringTable::new()),
            RowProfile::Immutable => None,
        };
        RowReader { csv: CsvReader::new(reader, options), table, mask: None, done: false }
    }

    fn field_value(&mut self) -> Field {
        match &mut self.table {
            Some(table) => self.csv.field_buf.to_string_interned(table).map(|rc| rc.to_string()),
            None => self.csv.field_buf.to_string_opt(),
        }
    }

    fn interned_field_value(&mut self, table: &mut CanonicalStringTable) -> Option<Rc<str>> {
        self.csv.field_buf.to_string_interned(table)
    }

    fn ensure_mask(&mut self, header: &[Field]) {
        if self.mask.is_some() {
            return;
        }
        let Some(filter) = self.csv.options.columns.clone() else {
            return;
        };
        let n = header.len();
        let mask = match filter {
            ColumnFilter::AllowIndices(set) => (0..n).map(|i| set.contains(&i)).collect(),
            ColumnFilter::BlockIndices(set) => (0..n).map(|i| !set.contains(&i)).collect(),
            ColumnFilter::AllowNames(names) => header
                .iter()
                .map(|h| h.as_deref().is_some_and(|h| names.iter().any(|n| n == h)))
                .collect(),
            ColumnFilter::BlockNames(names) => header
                .iter()
                .map(|h| h.as_deref().is_none_or(|h| !names.iter().any(|n| n == h)))
                .collect(),
        };
        self.mask = Some(mask);
    }

    fn apply_mask(&self, row: Vec<Field>) -> Vec<Field> {
        match &self.mask {
            None => row,
            Some(mask) => row
                .into_iter()
                .enumerate()
                .filter(|(i, _)| mask.get(*i).copied().unwrap_or(true))
                .map(|(_, v)| v)
                .collect(),
        }
    }

    /// True if the row-in-progress is still empty and the field just terminated was a bare
    /// (unquoted) run of whitespace or nothing at all — i.e. this is a blank/whitespace-only
    /// line, not a genuine one-column value. An explicitly quoted empty field (`""`) is never
    /// blank by this definition.
    fn at_blank_line(&self, row_so_far_is_empty: bool) -> bool {
        row_so_far_is_empty && !self.csv.field_was_quoted() && self.csv.field_buf.is_whitespace_or_empty()
    }

    /// Reads the next row, or `None` once no more rows remain.
    ///
    /// A blank or whitespace-only line — including a file consisting solely of such lines —
    /// is skipped entirely rather than reported as a one-column row; a leading UTF-8 BOM is
    /// stripped before the first token. A row made of a single empty field at end-of-input is
    /// likewise reported as "no more rows", distinguishing a genuinely empty tail from one
    /// that simply ends with a trailing newline.
    pub fn next_row(&mut self) -> Result<Option<Vec<Field>>> {
        if self.done {
            return Ok(None);
        }

        let mut row = Vec::new();
        loop {
            let token = self.csv.next_token()?;
            match token {
                Token::CommentMark => {
                    self.csv.drain_comment_line()?;
                    self.csv.enable_comment = true;
                    if row.is_empty() {
                        continue;
                    }
                }
                Token::FieldSep => {
                    let v = self.field_value();
                    row.push(v);
                }
                Token::Eol => {
                    if self.at_blank_line(row.is_empty()) {
                        self.csv.enable_comment = true;
                        continue;
                    }
                    let v = self.field_value();
                    row.push(v);
                    self.csv.enable_comment = true;
                    self.ensure_mask(&row);
                    return Ok(Some(self.apply_mask(row)));
                }
                Token::Eof => {
                    if self.at_blank_line(row.is_empty()) {
                        self.done = true;
                        return Ok(None);
                    }
                    let v = self.field_value();
                    row.push(v);
                    self.done = true;
                    self.ensure_mask(&row);
                    return Ok(Some(self.apply_mask(row)));
                }
            }
        }
    }

    /// Like [`RowReader::next_row`], but materializes each field through an interning table
    /// the caller owns, avoiding a fresh heap allocation for any field value already seen.
    /// Most useful with [`RowProfile::Mutable`], which this reader was configured with, but
    /// works regardless of profile since interning is orthogonal to the trim/nil policy.
    pub fn next_row_interned(&mut self, table: &mut CanonicalStringTable) -> Result<Option<Vec<Option<Rc<str>>>>> {
        if self.done {
            return Ok(None);
        }

        let mut row: Vec<Option<Rc<str>>> = Vec::new();
        loop {
            let token = self.csv.next_token()?;
            match token {
                Token::CommentMark => {
                    self.csv.drain_comment_line()?;
                    self.csv.enable_comment = true;
                    if row.is_empty() {
                        continue;
                    }
                }
                Token::FieldSep => {
                    let v = self.interned_field_value(table);
                    row.push(v);
                }
                Token::Eol => {
                    if self.at_blank_line(row.is_empty()) {
                        self.csv.enable_comment = true;
                        continue;
                    }
                    let v = self.interned_field_value(table);
                    row.push(v);
                    self.csv.enable_comment = true;
                    return Ok(Some(row));
                }
                Token::Eof => {
                    if self.at_blank_line(row.is_empty()) {
                        self.done = true;
                        return Ok(None);
                    }
                    let v = self.interned_field_value(table);
                    row.push(v);
                    self.done = true;
                    return Ok(Some(row));
                }
            }
        }
    }

    /// Reads every remaining row eagerly. Convenience wrapper; prefer
    /// [`RowReader::next_row`] in a loop for large inputs.
    pub fn read_all(&mut self) -> Result<Vec<Vec<Field>>> {
        let mut out = Vec::new();
        while let Some(row) = self.next_row()? {
            out.push(row);
        }
        Ok(out)
    }

    /// Closes the underlying character reader (and, transitively, its supplier).
    pub fn close(&mut self) -> Result<()> {
        self.csv.reader.close()
    }
}

/// Convenience constructor for reading an entire in-memory CSV string.
pub fn read_str(input: &str, options: CsvOptions) -> Result<Vec<Vec<Field>>> {
    use crate::supplier::{AllocatingSupplier, StrSource};
    let supplier = AllocatingSupplier::new(StrSource::new(input), crate::supplier::DEFAULT_BUFFER_SIZE)?;
    let reader = CharReader::new(supplier);
    let mut rows = RowReader::new(reader, options);
    rows.read_all()
}

/// Parses a single CSV row from a string, for tests and small one-off calls. Returns
/// borrowed [`Rc<str>`]-free owned strings, matching [`RowReader::next_row`]'s element type.
#[cfg(test)]
fn parse_row(input: &str, options: CsvOptions) -> Vec<Field> {
    read_str(input, options).unwrap().into_iter().next().unwrap_or_default()
}
