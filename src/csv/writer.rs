//! CSV row writer: per-field quoting decision, doubled-quote escaping, configurable newline.
//!
//! Grounded on the quoting-predicate shape of BurntSushi's `csv` writer: a field is quoted
//! only when it actually contains a character that would otherwise be ambiguous, and that
//! check is short-circuited by first comparing against the min/max of the critical
//! characters before scanning the field byte-by-byte.

use std::io::Write;

use crate::error::Result;

/// Line terminator emitted after each row.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum NewlineStyle {
    #[default]
    Lf,
    Cr,
    CrLf,
}

impl NewlineStyle {
    fn as_str(self) -> &'static str {
        match self {
            NewlineStyle::Lf => "\n",
            NewlineStyle::Cr => "\r",
            NewlineStyle::CrLf => "\r\n",
        }
    }
}

/// Decides whether a field needs quoting.
#[derive(Clone, Default)]
pub enum QuotePolicy {
    /// Quote a field only if it contains the separator, the quote character, `\r`, or `\n`.
    #[default]
    Necessary,
    /// Never quote (caller is responsible for ensuring fields contain no critical characters).
    Never,
    /// Always quote every field.
    Always,
}

/// Writes CSV rows to an underlying byte sink.
pub struct CsvWriter<W> {
    inner: W,
    separator: char,
    quote: char,
    newline: NewlineStyle,
    policy: QuotePolicy,
    comment: Option<char>,
    min_critical: char,
    max_critical: char,
}

impl<W: Write> CsvWriter<W> {
    /// Creates a writer with `,` separator, `"` quote, `Necessary` quoting, `Lf` newlines, and
    /// `#` as the active comment marker — matching [`crate::csv::CsvOptions::new`]'s reader
    /// defaults, so a field that would otherwise be misread as a comment on the way back in
    /// is quoted on the way out.
    pub fn new(inner: W) -> Self {
        CsvWriter::with_options(inner, ',', '"', NewlineStyle::Lf, QuotePolicy::Necessary, Some('#'))
    }

    /// Creates a writer with fully explicit dialect options. `comment`, if set, is the
    /// character a [`crate::csv::RowReader`] would treat as starting a comment line; a field
    /// in the first column that starts with it is quoted even under
    /// [`QuotePolicy::Necessary`], so `parseRow(writeRow(row)) == row` continues to hold.
    pub fn with_options(
        inner: W,
        separator: char,
        quote: char,
        newline: NewlineStyle,
        policy: QuotePolicy,
        comment: Option<char>,
    ) -> Self {
        let min_critical = ['\r', '\n', separator, quote].into_iter().min().unwrap();
        let max_critical = ['\r', '\n', separator, quote].into_iter().max().unwrap();
        CsvWriter { inner, separator, quote, newline, policy, comment, min_critical, max_critical }
    }

    /// Sets (or disables, via `None`) the comment marker the writer quotes around in the
    /// first column.
    pub fn with_comment(mut self, comment: Option<char>) -> Self {
        self.comment = comment;
        self
    }

    fn needs_quoting(&self, field: &str, is_first_column: bool) -> bool {
        match self.policy {
            QuotePolicy::Never => false,
            QuotePolicy::Always => true,
            QuotePolicy::Necessary => {
                if is_first_column {
                    if let Some(comment) = self.comment {
                        if field.starts_with(comment) {
                            return true;
                        }
                    }
                }
                field.chars().any(|c| {
                    if c < self.min_critical || c > self.max_critical {
                        return false;
                    }
                    c == '\r' || c == '\n' || c == self.separator || c == self.quote
                })
            }
        }
    }

    fn write_field(&mut self, field: &str, is_first_column: bool) -> Result<()> {
        if self.needs_quoting(field, is_first_column) {
            let mut buf = String::with_capacity(field.len() + 2);
            buf.push(self.quote);
            for c in field.chars() {
                if c == self.quote {
                    buf.push(self.quote);
                }
                buf.push(c);
            }
            buf.push(self.quote);
            self.inner.write_all(buf.as_bytes())?;
        } else {
            self.inner.write_all(field.as_bytes())?;
        }
        Ok(())
    }

    /// Writes one row, separating fields with the configured separator and terminating with
    /// the configured newline style. `None` fields (nil-on-empty) are written as an empty,
    /// unquoted field.
    pub fn write_row<'a, I>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut first = true;
        for field in fields {
            if !first {
                let mut sep = [0u8; 4];
                self.inner.write_all(self.separator.encode_utf8(&mut sep).as_bytes())?;
            }
            self.write_field(field.unwrap_or(""), first)?;
            first = false;
        }
        self.inner.write_all(self.newline.as_str().as_bytes())?;
        Ok(())
    }

    /// Streams rows produced by a reducing function, so a caller can drive the writer from a
    /// fold/generator without materializing every row up front. `next` returns `Ok(None)` to
    /// signal it has no more rows.
    pub fn write_rows_while<F>(&mut self, mut next: F) -> Result<()>
    where
        F: FnMut() -> Result<Option<Vec<Option<String>>>>,
    {
        while let Some(row) = next()? {
            self.write_row(row.iter().map(|f| f.as_deref()))?;
        }
        Ok(())
    }

    /// Flushes the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Consumes the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_rows(rows: &[Vec<&str>]) -> String {
        let mut w = CsvWriter::new(Vec::new());
        for row in rows {
            w.write_row(row.iter().map(|f| Some(*f))).unwrap();
        }
        String::from_utf8(w.into_inner()).unwrap()
    }

    #[test]
    fn unquoted_fields_pass_through() {
        assert_eq!(write_rows(&[vec!["a", "b", "c"]]), "a,b,c\n");
    }

    #[test]
    fn quotes_field_containing_separator() {
        assert_eq!(write_rows(&[vec!["a,b", "c"]]), "\"a,b\",c\n");
    }

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(write_rows(&[vec!["say \"hi\""]]), "\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn quotes_field_containing_newline() {
        assert_eq!(write_rows(&[vec!["a\nb"]]), "\"a\nb\"\n");
    }

    #[test]
    fn crlf_newline_style() {
        let mut w = CsvWriter::with_options(Vec::new(), ',', '"', NewlineStyle::CrLf, QuotePolicy::Necessary, Some('#'));
        w.write_row([Some("a"), Some("b")]).unwrap();
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), "a,b\r\n");
    }

    #[test]
    fn always_quote_policy() {
        let mut w = CsvWriter::with_options(Vec::new(), ',', '"', NewlineStyle::Lf, QuotePolicy::Always, Some('#'));
        w.write_row([Some("a"), Some("b")]).unwrap();
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), "\"a\",\"b\"\n");
    }

    #[test]
    fn quotes_first_field_starting_with_comment_marker() {
        assert_eq!(write_rows(&[vec!["#x", "y"]]), "\"#x\",y\n");
    }

    #[test]
    fn does_not_quote_comment_marker_outside_first_column() {
        assert_eq!(write_rows(&[vec!["y", "#x"]]), "y,#x\n");
    }

    #[test]
    fn comment_marker_round_trips_through_reader() {
        use crate::csv::options::CsvOptions;
        use crate::csv::reader::read_str;

        let rows = vec![vec!["#x", "y"], vec!["z", "w"]];
        let mut w = CsvWriter::new(Vec::new());
        for row in &rows {
            w.write_row(row.iter().map(|f| Some(*f))).unwrap();
        }
        let text = String::from_utf8(w.into_inner()).unwrap();
        let parsed = read_str(&text, CsvOptions::new()).unwrap();
        let parsed: Vec<Vec<&str>> = parsed.iter().map(|r| r.iter().map(|f| f.as_deref().unwrap_or("")).collect()).collect();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn nil_field_writes_as_empty() {
        let mut w = CsvWriter::new(Vec::new());
        w.write_row([Some("a"), None, Some("c")]).unwrap();
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), "a,,c\n");
    }

    #[test]
    fn write_rows_while_streams_from_a_reducer() {
        let mut remaining = vec![vec![Some("1".to_string())], vec![Some("2".to_string())]];
        let mut w = CsvWriter::new(Vec::new());
        w.write_rows_while(|| Ok(remaining.pop())).unwrap();
        let out = String::from_utf8(w.into_inner()).unwrap();
        assert_eq!(out, "2\n1\n");
    }

    #[test]
    fn round_trip_with_always_quote_matches_original_rows() {
        use crate::csv::options::CsvOptions;
        use crate::csv::reader::read_str;

        let rows = vec![vec!["a,b", "say \"hi\"", "plain"], vec!["x\ny", "z", ""]];
        let mut w = CsvWriter::with_options(Vec::new(), ',', '"', NewlineStyle::Lf, QuotePolicy::Always, Some('#'));
        for row in &rows {
            w.write_row(row.iter().map(|f| Some(*f))).unwrap();
        }
        let text = String::from_utf8(w.into_inner()).unwrap();

        let parsed = read_str(&text, CsvOptions::new().with_trim_leading(false).with_trim_trailing(false)).unwrap();
        let parsed: Vec<Vec<&str>> = parsed.iter().map(|r| r.iter().map(|f| f.as_deref().unwrap_or("")).collect()).collect();
        assert_eq!(parsed, rows);
    }
}
