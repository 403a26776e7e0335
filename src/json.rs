//! JSON reading and writing: the value model/visitor hooks, the recursive-descent reader,
//! and the recursive emitter.

pub mod reader;
pub mod value;
pub mod writer;

pub use reader::{read_all_str, read_str, EofPolicy, JSONReader, JsonOptions};
pub use value::{DefaultVisitor, Elide, FilteredVisitor, Value, Visitor};
pub use writer::{to_string, EscapePolicy, JSONWriter};
