//! `chario` is a high-throughput, low-overhead engine for parsing and emitting CSV
//! (RFC-4180-style, with common dialect extensions) and JSON (RFC 8259) over arbitrarily
//! large character streams.
//!
//! # Primary focuses
//!
//! - **Chunk-resumable**: every tokenizer is built on [`CharReader`], which chains a lazy
//!   sequence of character chunks with one-character pushback — parsing the same input with
//!   a tiny buffer or a huge one produces identical results.
//! - **Minimal hidden costs**: readers are generic over [`BufferSupplier`] rather than boxed
//!   trait objects, so the hot loop monomorphizes down to a tight scan with no dynamic
//!   dispatch.
//! - **Decoupled I/O**: [`AsyncQueueSupplier`] moves the blocking read off the parsing thread
//!   entirely, feeding a bounded queue from a dedicated producer thread.
//! - **Host-neutral values**: the JSON reader never commits to a concrete collection type —
//!   see [`json::Visitor`].
//!
//! # Examples
//!
//! ```
//! use chario::csv::{read_str, CsvOptions};
//!
//! let rows = read_str("Year,Make,Model\n1997,Ford,E350\n", CsvOptions::new()).unwrap();
//! assert_eq!(rows[0][0].as_deref(), Some("Year"));
//! ```
//!
//! ```
//! use chario::json::read_str;
//!
//! let value = read_str(r#"{"a": 1, "b": [2, 3]}"#).unwrap();
//! let obj = value.as_object().unwrap();
//! assert_eq!(obj.get("a").unwrap().as_str(), None); // it's an Int, not a Str
//! assert_eq!(obj.get("b").unwrap().as_array().unwrap().len(), 2);
//! ```

pub mod async_supplier;
pub mod char_buffer;
pub mod char_reader;
pub mod csv;
pub mod error;
pub mod intern;
pub mod json;
pub mod line_reader;
pub mod supplier;

pub use async_supplier::AsyncQueueSupplier;
pub use char_buffer::CharBuffer;
pub use char_reader::CharReader;
pub use error::{Error, Position, Result};
pub use intern::CanonicalStringTable;
pub use line_reader::LineNumberReader;
pub use supplier::{AllocatingSupplier, BufferSupplier, CharSource, RotatingSupplier, StrSource, Utf8Source};
