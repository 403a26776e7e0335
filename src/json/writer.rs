//! Recursive JSON emitter with the three independent escape switches and the indent policy
//! from the design document's §4.8.
//!
//! There's no single pack file that specializes in a JSON writer with exactly this
//! escape/indent contract, so this is grounded directly on RFC 8259 §7 for the escape table
//! and on the design document for the indent convention (newline + indent per object entry,
//! array elements comma-separated without newlines, matching `clojure.data.json`).

use std::io::Write;

use crate::error::{Error, Result};
use crate::json::value::Value;

/// Controls which characters the writer escapes beyond the mandatory set (control
/// characters, backslash, and quote are always escaped).
#[derive(Copy, Clone, Debug)]
pub struct EscapePolicy {
    /// Emit `\uXXXX` for any character `>= 128`.
    pub escape_unicode: bool,
    /// Emit ` `/` ` explicitly even when `escape_unicode` is off (these are valid
    /// JSON but invalid inside a JavaScript string literal).
    pub escape_js_separators: bool,
    /// Emit `\/` instead of `/`.
    pub escape_slash: bool,
}

impl Default for EscapePolicy {
    fn default() -> Self {
        EscapePolicy { escape_unicode: true, escape_js_separators: true, escape_slash: true }
    }
}

/// Writes JSON values to an underlying byte sink.
pub struct JSONWriter<W> {
    inner: W,
    escapes: EscapePolicy,
    indent: String,
}

impl<W: Write> JSONWriter<W> {
    /// Creates a compact writer (no indentation) with the default escape policy.
    pub fn new(inner: W) -> Self {
        JSONWriter { inner, escapes: EscapePolicy::default(), indent: String::new() }
    }

    /// Sets the escape policy.
    pub fn with_escapes(mut self, escapes: EscapePolicy) -> Self {
        self.escapes = escapes;
        self
    }

    /// Sets the per-level indent string. Empty (the default) produces compact output.
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    fn newline_and_indent(&mut self, depth: usize) -> Result<()> {
        if self.indent.is_empty() {
            return Ok(());
        }
        self.inner.write_all(b"\n")?;
        for _ in 0..depth {
            self.inner.write_all(self.indent.as_bytes())?;
        }
        Ok(())
    }

    fn colon(&mut self) -> Result<()> {
        self.inner.write_all(if self.indent.is_empty() { b":" } else { b": " })?;
        Ok(())
    }

    /// Writes a string, including the surrounding quotes, applying the configured escape
    /// policy.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        self.inner.write_all(b"\"")?;
        for c in s.chars() {
            self.write_string_char(c)?;
        }
        self.inner.write_all(b"\"")?;
        Ok(())
    }

    fn write_string_char(&mut self, c: char) -> Result<()> {
        match c {
            '"' => self.inner.write_all(b"\\\"")?,
            '\\' => self.inner.write_all(b"\\\\")?,
            '/' if self.escapes.escape_slash => self.inner.write_all(b"\\/")?,
            '\u{8}' => self.inner.write_all(b"\\b")?,
            '\u{c}' => self.inner.write_all(b"\\f")?,
            '\n' => self.inner.write_all(b"\\n")?,
            '\r' => self.inner.write_all(b"\\r")?,
            '\t' => self.inner.write_all(b"\\t")?,
            '\u{2028}' | '\u{2029}' if self.escapes.escape_js_separators => {
                write!(self.inner, "\\u{:04x}", c as u32)?;
            }
            c if (c as u32) < 0x20 => write!(self.inner, "\\u{:04x}", c as u32)?,
            c if self.escapes.escape_unicode && (c as u32) >= 128 => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(self.inner, "\\u{unit:04x}")?;
                }
            }
            c => {
                let mut bytes = [0u8; 4];
                self.inner.write_all(c.encode_utf8(&mut bytes).as_bytes())?;
            }
        }
        Ok(())
    }

    /// Writes a finite `f64`. `NaN` and `±Infinity` are rejected — JSON has no literal for them.
    pub fn write_float(&mut self, f: f64) -> Result<()> {
        if !f.is_finite() {
            return Err(Error::NumericRange { value: f.to_string() });
        }
        write!(self.inner, "{f}")?;
        Ok(())
    }

    /// Writes an `i64` integer.
    pub fn write_int(&mut self, i: i64) -> Result<()> {
        write!(self.inner, "{i}")?;
        Ok(())
    }

    /// Writes an arbitrary-precision integer or decimal, given its exact host string form.
    pub fn write_raw_number(&mut self, digits: &str) -> Result<()> {
        self.inner.write_all(digits.as_bytes())?;
        Ok(())
    }

    /// Writes an array from an iterator of writer callbacks, one per element.
    pub fn write_array<I, F>(&mut self, items: I, depth: usize, mut write_item: F) -> Result<()>
    where
        I: IntoIterator,
        F: FnMut(&mut Self, I::Item, usize) -> Result<()>,
    {
        self.inner.write_all(b"[")?;
        let mut first = true;
        for item in items {
            if !first {
                self.inner.write_all(b",")?;
            }
            first = false;
            write_item(self, item, depth + 1)?;
        }
        self.inner.write_all(b"]")?;
        Ok(())
    }

    /// Writes an object from an iterator of `(key, value)` pairs, keeping the caller's
    /// iteration order (unlike [`JSONWriter::write_value`]'s `Value::Object` arm, which always
    /// walks a `BTreeMap` in key order). This is the design document's `writeMap(entryIter)`.
    pub fn write_map<'a, I>(&mut self, entries: I, depth: usize) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        self.inner.write_all(b"{")?;
        let mut first = true;
        let mut any = false;
        for (k, v) in entries {
            any = true;
            if !first {
                self.inner.write_all(b",")?;
            }
            first = false;
            self.newline_and_indent(depth + 1)?;
            self.write_string(k)?;
            self.colon()?;
            self.write_value(v, depth + 1)?;
        }
        if any {
            self.newline_and_indent(depth)?;
        }
        self.inner.write_all(b"}")?;
        Ok(())
    }

    /// Writes `Value`'s object variant, and recurses through [`JSONWriter::write_value`] for
    /// everything else. This is the primitive/container half of the design document's
    /// `writeObject`; the "delegate to a host object callback" half doesn't apply here since
    /// `Value` already commits to a concrete model.
    pub fn write_value(&mut self, value: &Value, depth: usize) -> Result<()> {
        match value {
            Value::Null => self.inner.write_all(b"null")?,
            Value::Bool(true) => self.inner.write_all(b"true")?,
            Value::Bool(false) => self.inner.write_all(b"false")?,
            Value::Int(i) => self.write_int(*i)?,
            Value::BigInt(digits) => self.write_raw_number(digits)?,
            Value::Float(f) => self.write_float(*f)?,
            Value::Str(s) => self.write_string(s)?,
            Value::Array(items) => {
                self.inner.write_all(b"[")?;
                let mut first = true;
                for item in items {
                    if !first {
                        self.inner.write_all(b",")?;
                    }
                    first = false;
                    self.write_value(item, depth + 1)?;
                }
                self.inner.write_all(b"]")?;
            }
            Value::Object(entries) => {
                self.inner.write_all(b"{")?;
                let mut first = true;
                for (k, v) in entries {
                    if !first {
                        self.inner.write_all(b",")?;
                    }
                    first = false;
                    self.newline_and_indent(depth + 1)?;
                    self.write_string(k)?;
                    self.colon()?;
                    self.write_value(v, depth + 1)?;
                }
                if !entries.is_empty() {
                    self.newline_and_indent(depth)?;
                }
                self.inner.write_all(b"}")?;
            }
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

/// Serializes `value` to a `String` using the default (all-escapes-on, compact) policy.
pub fn to_string(value: &Value) -> Result<String> {
    let mut w = JSONWriter::new(Vec::new());
    w.write_value(value, 0)?;
    Ok(String::from_utf8(w.into_inner()).expect("writer only emits valid UTF-8"))
}
