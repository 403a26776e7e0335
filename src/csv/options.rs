//! CSV dialect/options builder.
//!
//! Generalizes the teacher crate's `Csv::with_separator` single-argument builder into a full
//! options struct, since the expanded dialect surface (trim policy, escape/comment
//! characters, column filters, row materialization profile) no longer fits one constructor
//! argument.

use std::collections::HashSet;

use crate::error::{Error, Result};

/// Selects how a [`crate::csv::RowReader`] materializes each row.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum RowProfile {
    /// Each row is a freshly allocated `Vec<String>` — simple, allocates per row.
    #[default]
    Immutable,
    /// Each row reuses a caller-supplied `Vec` and interns field text through a
    /// [`crate::CanonicalStringTable`], avoiding per-row allocation of the outer container.
    Mutable,
}

/// Which columns a [`crate::csv::RowReader`] emits, resolved either by 0-based index or (once
/// a header row has been read) by name.
#[derive(Clone, Debug)]
pub enum ColumnFilter {
    /// Only emit columns at these 0-based indices.
    AllowIndices(HashSet<usize>),
    /// Emit every column except these 0-based indices.
    BlockIndices(HashSet<usize>),
    /// Only emit columns whose header name is in this list.
    AllowNames(Vec<String>),
    /// Emit every column except those whose header name is in this list.
    BlockNames(Vec<String>),
}

/// CSV dialect and row-materialization options.
#[derive(Clone, Debug)]
pub struct CsvOptions {
    pub(crate) separator: char,
    pub(crate) quote: char,
    pub(crate) escape: Option<char>,
    pub(crate) comment: Option<char>,
    pub(crate) trim_leading: bool,
    pub(crate) trim_trailing: bool,
    pub(crate) nil_on_empty: bool,
    pub(crate) profile: RowProfile,
    pub(crate) columns: Option<ColumnFilter>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvOptions {
    /// The stricter, recommended defaults: trim leading/trailing whitespace, `,` separator,
    /// `"` quote, escaping disabled, `#` comments, no nil-on-empty, immutable row profile.
    ///
    /// See the design document's Open Questions: the supplier-based reader defaults to
    /// trimming, while [`CsvOptions::legacy`] preserves bytes verbatim for drop-in
    /// compatibility with tools that expect that.
    pub fn new() -> Self {
        CsvOptions {
            separator: ',',
            quote: '"',
            escape: None,
            comment: Some('#'),
            trim_leading: true,
            trim_trailing: true,
            nil_on_empty: false,
            profile: RowProfile::Immutable,
            columns: None,
        }
    }

    /// Legacy-compatible defaults: no trimming, comments disabled, otherwise the same as
    /// [`CsvOptions::new`]. Use this when porting code that previously relied on untrimmed
    /// fields.
    pub fn legacy() -> Self {
        CsvOptions { trim_leading: false, trim_trailing: false, comment: None, ..Self::new() }
    }

    /// Sets the field separator character. Must be a single character distinct from the
    /// quote character.
    pub fn with_separator(mut self, separator: char) -> Result<Self> {
        if separator == self.quote {
            return Err(Error::usage("separator and quote characters must differ"));
        }
        self.separator = separator;
        Ok(self)
    }

    /// Sets the quote character.
    pub fn with_quote(mut self, quote: char) -> Result<Self> {
        if quote == self.separator {
            return Err(Error::usage("separator and quote characters must differ"));
        }
        self.quote = quote;
        Ok(self)
    }

    /// Enables the backslash-style escape character; when set, the character immediately
    /// following it is copied verbatim into the current field instead of being interpreted.
    pub fn with_escape(mut self, escape: Option<char>) -> Self {
        self.escape = escape;
        self
    }

    /// Sets (or disables, via `None`) the comment marker character. A row beginning with this
    /// character (before any field content) is skipped entirely.
    pub fn with_comment(mut self, comment: Option<char>) -> Self {
        self.comment = comment;
        self
    }

    /// Sets whether leading whitespace is trimmed from each field.
    pub fn with_trim_leading(mut self, trim: bool) -> Self {
        self.trim_leading = trim;
        self
    }

    /// Sets whether trailing whitespace is trimmed from each field.
    pub fn with_trim_trailing(mut self, trim: bool) -> Self {
        self.trim_trailing = trim;
        self
    }

    /// Sets whether an empty (post-trim) field is reported as absent rather than `""`.
    pub fn with_nil_on_empty(mut self, nil_on_empty: bool) -> Self {
        self.nil_on_empty = nil_on_empty;
        self
    }

    /// Sets the row materialization profile.
    pub fn with_profile(mut self, profile: RowProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Sets a column filter (allow-list or block-list, by index or by name).
    pub fn with_columns(mut self, columns: ColumnFilter) -> Self {
        self.columns = Some(columns);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_trim_true() {
        let opts = CsvOptions::new();
        assert!(opts.trim_leading && opts.trim_trailing);
        assert_eq!(opts.comment, Some('#'));
    }

    #[test]
    fn legacy_defaults_trim_false_and_no_comment() {
        let opts = CsvOptions::legacy();
        assert!(!opts.trim_leading && !opts.trim_trailing);
        assert_eq!(opts.comment, None);
    }

    #[test]
    fn separator_and_quote_must_differ() {
        assert!(CsvOptions::new().with_separator('"').is_err());
        assert!(CsvOptions::new().with_quote(',').is_err());
    }
}
