//! Recursive-descent JSON reader (RFC 8259) over a [`LineNumberReader`], producing values
//! through a pluggable [`Visitor`].
//!
//! Grounded on the chunk-resumable recursive-descent shape used by streaming JSON readers in
//! the example pack; RFC 8259 itself is the source of truth for grammar and escape rules.

use crate::char_buffer::CharBuffer;
use crate::char_reader::CharReader;
use crate::error::{Error, Position, Result};
use crate::intern::CanonicalStringTable;
use crate::json::value::Visitor;
use crate::line_reader::LineNumberReader;
use crate::supplier::BufferSupplier;

/// What a [`JSONReader`] does when asked for another top-level value but none remains.
pub enum EofPolicy<T> {
    /// Raise [`Error::EndOfInput`] (the default).
    Error,
    /// Return this value instead.
    Value(T),
    /// Invoke this closure to produce a fallback value.
    Thunk(Box<dyn FnMut() -> T>),
}

impl<T> Default for EofPolicy<T> {
    fn default() -> Self {
        EofPolicy::Error
    }
}

/// Number decoding policy: if set, real numbers decode through [`Visitor::big_int`] (carrying
/// exact decimal text) instead of [`Visitor::float`]. Named `bigdec` after the design
/// document's option of the same name; this crate has no arbitrary-precision decimal type of
/// its own; the decimal text is handed to the visitor verbatim, same as an overflowed integer.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct JsonOptions {
    pub bigdec: bool,
}

/// Recursive-descent JSON reader. Generic over the [`Visitor`] that materializes arrays,
/// objects, and scalars, so it never commits to a host collection type.
pub struct JSONReader<S, V: Visitor> {
    input: LineNumberReader<S>,
    options: JsonOptions,
    visitor: V,
    table: CanonicalStringTable,
    buf: CharBuffer,
    eof: EofPolicy<V::Value>,
    pending_high_surrogate: Option<u32>,
}

impl<S: BufferSupplier, V: Visitor> JSONReader<S, V> {
    /// Creates a reader over `input` with the given options and visitor, erroring at
    /// top-level end-of-input by default (use [`JSONReader::with_eof_policy`] to change that).
    pub fn new(input: LineNumberReader<S>, options: JsonOptions, visitor: V) -> Self {
        JSONReader {
            input,
            options,
            visitor,
            table: CanonicalStringTable::new(),
            buf: CharBuffer::new(false, false, false),
            eof: EofPolicy::Error,
            pending_high_surrogate: None,
        }
    }

    /// Sets the policy applied when [`JSONReader::next_value`] finds no more top-level values.
    pub fn with_eof_policy(mut self, eof: EofPolicy<V::Value>) -> Self {
        self.eof = eof;
        self
    }

    fn pos(&self) -> Position {
        self.input.current_position()
    }

    fn peek(&mut self) -> Result<Option<char>> {
        match self.input.read()? {
            Some(c) => {
                self.input.pushback()?;
                Ok(Some(c))
            }
            None => Ok(None),
        }
    }

    fn read_required(&mut self) -> Result<char> {
        self.input.read()?.ok_or_else(|| Error::EndOfInput { position: self.pos() })
    }

    fn skip_ws(&mut self) -> Result<()> {
        loop {
            match self.peek()? {
                Some(c) if c.is_whitespace() => {
                    self.input.read()?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        let c = self.read_required()?;
        if c != expected {
            return Err(Error::input_shape(format!("expected '{expected}', found '{c}'"), self.pos()));
        }
        Ok(())
    }

    /// Reads one top-level value, or `None` once no more non-whitespace input remains.
    pub fn next_value(&mut self) -> Result<Option<V::Value>>
    where
        V::Value: Clone,
    {
        self.skip_ws()?;
        if self.peek()?.is_none() {
            return match &mut self.eof {
                EofPolicy::Error => Err(Error::EndOfInput { position: self.pos() }),
                EofPolicy::Value(v) => Ok(Some(v.clone())),
                EofPolicy::Thunk(f) => Ok(Some(f())),
            };
        }
        self.parse_value().map(Some)
    }

    fn parse_value(&mut self) -> Result<V::Value> {
        let c = self.peek()?.ok_or_else(|| Error::EndOfInput { position: self.pos() })?;
        match c {
            '{' => self.parse_object(),
            '[' => self.parse_array(),
            '"' => {
                let s = self.parse_string_literal()?;
                Ok(self.visitor.string(s))
            }
            't' => {
                self.expect_literal("true")?;
                Ok(self.visitor.bool(true))
            }
            'f' => {
                self.expect_literal("false")?;
                Ok(self.visitor.bool(false))
            }
            'n' => {
                self.expect_literal("null")?;
                Ok(self.visitor.null())
            }
            '-' | '0'..='9' => self.parse_number(),
            other => Err(Error::input_shape(format!("unexpected character '{other}'"), self.pos())),
        }
    }

    fn expect_literal(&mut self, word: &str) -> Result<()> {
        for expected in word.chars() {
            self.expect(expected)?;
        }
        Ok(())
    }

    fn parse_array(&mut self) -> Result<V::Value> {
        self.expect('[')?;
        let mut array = self.visitor.new_array();
        self.skip_ws()?;
        if self.peek()? == Some(']') {
            self.input.read()?;
            return Ok(self.visitor.finish_array(array));
        }
        loop {
            self.skip_ws()?;
            let value = self.parse_value()?;
            self.visitor.push_value(&mut array, value);
            self.skip_ws()?;
            match self.read_required()? {
                ',' => {
                    self.skip_ws()?;
                    if self.peek()? == Some(']') {
                        return Err(Error::input_shape("trailing comma before ']'", self.pos()));
                    }
                }
                ']' => return Ok(self.visitor.finish_array(array)),
                other => return Err(Error::input_shape(format!("expected ',' or ']', found '{other}'"), self.pos())),
            }
        }
    }

    fn parse_object(&mut self) -> Result<V::Value> {
        self.expect('{')?;
        let mut object = self.visitor.new_object();
        self.skip_ws()?;
        if self.peek()? == Some('}') {
            self.input.read()?;
            return Ok(self.visitor.finish_object(object));
        }
        loop {
            self.skip_ws()?;
            if self.peek()? != Some('"') {
                return Err(Error::input_shape("object key must be a string", self.pos()));
            }
            let key_text = self.parse_string_literal()?;
            let key = self.table.intern_str(&key_text);
            self.skip_ws()?;
            self.expect(':')?;
            self.skip_ws()?;
            let value = self.parse_value()?;
            self.visitor.insert(&mut object, key, value);
            self.skip_ws()?;
            match self.read_required()? {
                ',' => {
                    self.skip_ws()?;
                    if self.peek()? == Some('}') {
                        return Err(Error::input_shape("trailing comma before '}'", self.pos()));
                    }
                    if self.peek()? == Some(',') {
                        return Err(Error::input_shape("empty entry between commas", self.pos()));
                    }
                }
                '}' => return Ok(self.visitor.finish_object(object)),
                other => return Err(Error::input_shape(format!("expected ',' or '}}', found '{other}'"), self.pos())),
            }
        }
    }

    fn flush_pending_surrogate(&mut self) {
        if self.pending_high_surrogate.take().is_some() {
            self.buf.append('\u{FFFD}');
        }
    }

    fn push_code_unit(&mut self, cp: u32) {
        if let Some(high) = self.pending_high_surrogate.take() {
            if (0xDC00..=0xDFFF).contains(&cp) {
                let combined = 0x10000 + (((high - 0xD800) << 10) | (cp - 0xDC00));
                if let Some(c) = char::from_u32(combined) {
                    self.buf.append(c);
                    return;
                }
            }
            // Unpaired high surrogate: per the design document's pass-through policy, Rust's
            // `char`/`String` can't hold the raw 16-bit unit, so it decodes to U+FFFD.
            self.buf.append('\u{FFFD}');
        }

        if (0xD800..=0xDBFF).contains(&cp) {
            self.pending_high_surrogate = Some(cp);
        } else if (0xDC00..=0xDFFF).contains(&cp) {
            self.buf.append('\u{FFFD}');
        } else if let Some(c) = char::from_u32(cp) {
            self.buf.append(c);
        }
    }

    fn read_hex4(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let c = self.read_required()?;
            let digit = c.to_digit(16).ok_or_else(|| Error::input_shape("invalid \\u escape", self.pos()))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn parse_string_literal(&mut self) -> Result<String> {
        self.expect('"')?;
        self.buf.clear();
        self.pending_high_surrogate = None;
        loop {
            let c = self.read_required()?;
            match c {
                '"' => {
                    self.flush_pending_surrogate();
                    break;
                }
                '\\' => {
                    let esc = self.read_required()?;
                    match esc {
                        'u' => {
                            let cp = self.read_hex4()?;
                            self.push_code_unit(cp);
                        }
                        other => {
                            self.flush_pending_surrogate();
                            let literal = match other {
                                '"' => '"',
                                '\\' => '\\',
                                '/' => '/',
                                'b' => '\u{8}',
                                'f' => '\u{c}',
                                'n' => '\n',
                                'r' => '\r',
                                't' => '\t',
                                _ => return Err(Error::input_shape(format!("invalid escape '\\{other}'"), self.pos())),
                            };
                            self.buf.append(literal);
                        }
                    }
                }
                c if (c as u32) < 0x20 => {
                    return Err(Error::input_shape("control character in string literal", self.pos()));
                }
                c => {
                    self.flush_pending_surrogate();
                    self.buf.append(c);
                }
            }
        }
        Ok(self.buf.to_string_opt().unwrap_or_default())
    }

    fn parse_number(&mut self) -> Result<V::Value> {
        self.buf.clear();
        let mut is_float = false;

        if self.peek()? == Some('-') {
            let c = self.read_required()?;
            self.buf.append(c);
        }
        self.read_digits()?;

        if self.peek()? == Some('.') {
            is_float = true;
            let c = self.read_required()?;
            self.buf.append(c);
            self.read_digits()?;
        }
        if matches!(self.peek()?, Some('e') | Some('E')) {
            is_float = true;
            let c = self.read_required()?;
            self.buf.append(c);
            if matches!(self.peek()?, Some('+') | Some('-')) {
                let c = self.read_required()?;
                self.buf.append(c);
            }
            self.read_digits()?;
        }

        let text = self.buf.to_string_opt().unwrap_or_default();
        if text.is_empty() || text == "-" {
            return Err(Error::input_shape("invalid number literal", self.pos()));
        }

        if is_float {
            if self.options.bigdec {
                return Ok(self.visitor.big_int(text));
            }
            let f: f64 = text.parse().map_err(|_| Error::input_shape("invalid number literal", self.pos()))?;
            return Ok(self.visitor.float(f));
        }

        match text.parse::<i64>() {
            Ok(i) => Ok(self.visitor.int(i)),
            Err(_) => Ok(self.visitor.big_int(text)),
        }
    }

    fn read_digits(&mut self) -> Result<()> {
        let mut any = false;
        while let Some(c @ '0'..='9') = self.peek()? {
            self.buf.append(c);
            self.input.read()?;
            any = true;
        }
        if !any {
            return Err(Error::input_shape("expected at least one digit", self.pos()));
        }
        Ok(())
    }
}

/// Convenience constructor: reads a single JSON value from an in-memory string using the
/// default `Value` visitor.
pub fn read_str(input: &str) -> Result<crate::json::value::Value> {
    use crate::json::value::DefaultVisitor;
    use crate::supplier::{AllocatingSupplier, StrSource};

    let supplier = AllocatingSupplier::new(StrSource::new(input), crate::supplier::DEFAULT_BUFFER_SIZE)?;
    let reader = LineNumberReader::new(CharReader::new(supplier));
    let mut json = JSONReader::new(reader, JsonOptions::default(), DefaultVisitor);
    json.next_value()?.ok_or_else(|| Error::EndOfInput { position: Position::UNKNOWN })
}

/// Reads every top-level value in `input` in sequence (supports the "multiple top-level
/// values" reading mode from the design document).
pub fn read_all_str(input: &str) -> Result<Vec<crate::json::value::Value>> {
    use crate::json::value::DefaultVisitor;
    use crate::supplier::{AllocatingSupplier, StrSource};

    let supplier = AllocatingSupplier::new(StrSource::new(input), crate::supplier::DEFAULT_BUFFER_SIZE)?;
    let reader = LineNumberReader::new(CharReader::new(supplier));
    let mut json = JSONReader::new(reader, JsonOptions::default(), DefaultVisitor);
    let mut values = Vec::new();
    while let Some(v) = json.next_value()? {
        values.push(v);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::value::Value;
    use std::collections::BTreeMap;

    #[test]
    fn scalars_round_trip() {
        assert_eq!(read_str("null").unwrap(), Value::Null);
        assert_eq!(read_str("true").unwrap(), Value::Bool(true));
        assert_eq!(read_str("false").unwrap(), Value::Bool(false));
        assert_eq!(read_str("0").unwrap(), Value::Int(0));
        assert_eq!(read_str("-0").unwrap(), Value::Int(0));
        assert_eq!(read_str("\"\"").unwrap(), Value::Str(String::new()));
        assert_eq!(read_str("[]").unwrap(), Value::Array(vec![]));
        assert_eq!(read_str("{}").unwrap(), Value::Object(BTreeMap::new()));
    }

    #[test]
    fn object_with_two_keys() {
        let v = read_str(r#"{"a": 1, "b": 2}"#).unwrap();
        let mut expect = BTreeMap::new();
        expect.insert("a".to_string(), Value::Int(1));
        expect.insert("b".to_string(), Value::Int(2));
        assert_eq!(v, Value::Object(expect));
    }

    #[test]
    fn very_large_integer_promotes_to_bigint() {
        let v = read_str("123456789012345678901234567890").unwrap();
        assert_eq!(v, Value::BigInt("123456789012345678901234567890".to_string()));
    }

    #[test]
    fn every_basic_escape_form_round_trips() {
        let v = read_str(r#""\"\\\/\b\f\n\r\t""#).unwrap();
        assert_eq!(v, Value::Str("\"\\/\u{8}\u{c}\n\r\t".to_string()));
    }

    #[test]
    fn surrogate_pair_decodes_to_supplementary_character() {
        let v = read_str(r#""😀""#).unwrap();
        assert_eq!(v, Value::Str("\u{1F600}".to_string()));
    }

    #[test]
    fn unpaired_surrogate_becomes_replacement_character() {
        let v = read_str(r#""\ud800x""#).unwrap();
        assert_eq!(v, Value::Str("\u{FFFD}x".to_string()));
    }

    #[test]
    fn trailing_comma_in_object_is_an_error() {
        assert!(read_str(r#"{"a":1,}"#).is_err());
    }

    #[test]
    fn empty_entry_between_commas_is_an_error() {
        assert!(read_str(r#"{"a":1,,"b":2}"#).is_err());
    }

    #[test]
    fn non_string_key_is_an_error() {
        assert!(read_str(r#"{1:2}"#).is_err());
    }

    #[test]
    fn nested_array_and_object() {
        let v = read_str(r#"{"vals":[{"id":"44","views":4},{"id":"492","views":59}]}"#).unwrap();
        let arr = v.as_object().unwrap().get("vals").unwrap().as_array().unwrap();
        assert_eq!(arr.len(), 2);
    }

    #[test]
    fn multiple_top_level_values() {
        let values = read_all_str("1 2 3").unwrap();
        assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn small_chunk_size_does_not_change_result() {
        use crate::json::value::DefaultVisitor;
        use crate::supplier::{AllocatingSupplier, StrSource};

        let input = r#"{"a":[1,2,"three",{"nested":true}],"b":null}"#;
        for size in [1usize, 3, 1024] {
            let supplier = AllocatingSupplier::new(StrSource::new(input), size).unwrap();
            let reader = LineNumberReader::new(CharReader::new(supplier));
            let mut json = JSONReader::new(reader, JsonOptions::default(), DefaultVisitor);
            let value = json.next_value().unwrap().unwrap();
            assert_eq!(value, read_str(input).unwrap(), "mismatch at chunk size {size}");
        }
    }
}
