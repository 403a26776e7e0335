//! Neutral JSON value model plus the pluggable array/object materialization hooks
//! [`JSONReader`](crate::json::reader::JSONReader) delegates to.
//!
//! The design document calls for `ArrayVisitor`/`ObjectVisitor` as "small interfaces" the
//! reader never commits to a concrete host container through — and, in its design notes,
//! sanctions realizing them as "a small record of function pointers / method tables" rather
//! than an inheritance hierarchy. [`Visitor`] is that single behavior bundle: one trait
//! covers both array and object construction so a reader only needs to be generic over one
//! type parameter, and [`DefaultVisitor`] is the host-agnostic `Value`-backed instance most
//! callers use directly.

use std::collections::BTreeMap;
use std::rc::Rc;

/// A parsed JSON value, committing to no host collection type.
///
/// Integers that fit in a signed 64-bit range decode as [`Value::Int`]; integers that
/// overflow that range promote to [`Value::BigInt`], carrying the exact decimal digits
/// rather than losing precision to a `f64`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    BigInt(String),
    Float(f64),
    Str(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

/// Behavior bundle a [`JSONReader`](crate::json::reader::JSONReader) delegates value
/// construction to, covering both the `ArrayVisitor` and `ObjectVisitor` roles from the
/// design document in one trait.
pub trait Visitor {
    /// The fully-materialized value type this visitor produces.
    type Value;
    /// In-progress array accumulator (e.g. a `Vec`).
    type Array;
    /// In-progress object accumulator (e.g. a `BTreeMap`).
    type Object;

    fn null(&mut self) -> Self::Value;
    fn bool(&mut self, b: bool) -> Self::Value;
    fn int(&mut self, i: i64) -> Self::Value;
    fn big_int(&mut self, digits: String) -> Self::Value;
    fn float(&mut self, f: f64) -> Self::Value;
    fn string(&mut self, s: String) -> Self::Value;

    fn new_array(&mut self) -> Self::Array;
    fn push_value(&mut self, array: &mut Self::Array, value: Self::Value);
    fn finish_array(&mut self, array: Self::Array) -> Self::Value;

    fn new_object(&mut self) -> Self::Object;
    /// Inserts a key/value pair. `key` is the canonicalized (interned) key text; returning
    /// without inserting implements "elide this entry" for a value-fn that rejected it.
    fn insert(&mut self, object: &mut Self::Object, key: Rc<str>, value: Self::Value);
    fn finish_object(&mut self, object: Self::Object) -> Self::Value;
}

/// The host-agnostic default visitor: arrays become `Vec<Value>`, objects become
/// `BTreeMap<String, Value>` (the "persistent sequence" / immutable row profile analogue
/// for JSON — deterministic key order, cheap structural sharing is left to the caller).
#[derive(Default)]
pub struct DefaultVisitor;

impl Visitor for DefaultVisitor {
    type Value = Value;
    type Array = Vec<Value>;
    type Object = BTreeMap<String, Value>;

    fn null(&mut self) -> Value {
        Value::Null
    }
    fn bool(&mut self, b: bool) -> Value {
        Value::Bool(b)
    }
    fn int(&mut self, i: i64) -> Value {
        Value::Int(i)
    }
    fn big_int(&mut self, digits: String) -> Value {
        Value::BigInt(digits)
    }
    fn float(&mut self, f: f64) -> Value {
        Value::Float(f)
    }
    fn string(&mut self, s: String) -> Value {
        Value::Str(s)
    }

    fn new_array(&mut self) -> Vec<Value> {
        Vec::new()
    }
    fn push_value(&mut self, array: &mut Vec<Value>, value: Value) {
        array.push(value);
    }
    fn finish_array(&mut self, array: Vec<Value>) -> Value {
        Value::Array(array)
    }

    fn new_object(&mut self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }
    fn insert(&mut self, object: &mut BTreeMap<String, Value>, key: Rc<str>, value: Value) {
        object.insert(key.to_string(), value);
    }
    fn finish_object(&mut self, object: BTreeMap<String, Value>) -> Value {
        Value::Object(object)
    }
}

/// A sentinel value a `value-fn` can use to elide a key/value pair from the enclosing object.
pub struct Elide;

/// Wraps an inner [`Visitor`] with a `key-fn` and `value-fn`, matching the design document's
/// "key-fn and value-fn are composed into the default immutable object visitor" contract.
/// `value_fn` returning `Err(Elide)` drops the entry from the object entirely.
pub struct FilteredVisitor<V, KF, VF> {
    inner: V,
    key_fn: KF,
    value_fn: VF,
}

impl<V, KF, VF> FilteredVisitor<V, KF, VF>
where
    V: Visitor,
    KF: FnMut(Rc<str>) -> Rc<str>,
    VF: FnMut(&Rc<str>, V::Value) -> Result<V::Value, Elide>,
{
    pub fn new(inner: V, key_fn: KF, value_fn: VF) -> Self {
        FilteredVisitor { inner, key_fn, value_fn }
    }
}

impl<V, KF, VF> Visitor for FilteredVisitor<V, KF, VF>
where
    V: Visitor,
    KF: FnMut(Rc<str>) -> Rc<str>,
    VF: FnMut(&Rc<str>, V::Value) -> Result<V::Value, Elide>,
{
    type Value = V::Value;
    type Array = V::Array;
    type Object = V::Object;

    fn null(&mut self) -> Self::Value {
        self.inner.null()
    }
    fn bool(&mut self, b: bool) -> Self::Value {
        self.inner.bool(b)
    }
    fn int(&mut self, i: i64) -> Self::Value {
        self.inner.int(i)
    }
    fn big_int(&mut self, digits: String) -> Self::Value {
        self.inner.big_int(digits)
    }
    fn float(&mut self, f: f64) -> Self::Value {
        self.inner.float(f)
    }
    fn string(&mut self, s: String) -> Self::Value {
        self.inner.string(s)
    }

    fn new_array(&mut self) -> Self::Array {
        self.inner.new_array()
    }
    fn push_value(&mut self, array: &mut Self::Array, value: Self::Value) {
        self.inner.push_value(array, value);
    }
    fn finish_array(&mut self, array: Self::Array) -> Self::Value {
        self.inner.finish_array(array)
    }

    fn new_object(&mut self) -> Self::Object {
        self.inner.new_object()
    }
    fn insert(&mut self, object: &mut Self::Object, key: Rc<str>, value: Self::Value) {
        let key = (self.key_fn)(key);
        match (self.value_fn)(&key, value) {
            Ok(value) => self.inner.insert(object, key, value),
            Err(Elide) => {}
        }
    }
    fn finish_object(&mut self, object: Self::Object) -> Self::Value {
        self.inner.finish_object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_visitor_builds_nested_value() {
        let mut v = DefaultVisitor;
        let mut arr = v.new_array();
        let one = v.int(1);
        v.push_value(&mut arr, one);
        let val = v.finish_array(arr);
        assert_eq!(val, Value::Array(vec![Value::Int(1)]));
    }

    #[test]
    fn filtered_visitor_elides_rejected_entries() {
        let mut v = FilteredVisitor::new(DefaultVisitor, |k| k, |k, _| if &**k == "a" { Err(Elide) } else { Ok(Value::Null) });
        let mut obj = v.new_object();
        v.insert(&mut obj, Rc::from("a"), Value::Int(1));
        v.insert(&mut obj, Rc::from("b"), Value::Int(2));
        let val = v.finish_object(obj);
        assert_eq!(val, Value::Object(BTreeMap::from([("b".to_string(), Value::Null)])));
    }
}
