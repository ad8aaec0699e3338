//! Dynamic values and the frame view the stack searches.
//!
//! Compound values are reference counted, so handing a frame to the stack, peeking
//! at it or popping it never copies its contents. [`Value::ptr_eq`] observes that
//! identity.

use core::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::record::Record;

/// Ordered string-keyed mapping, the payload of [`Value::Map`].
pub type Mapping = IndexMap<String, Value>;

/// A runtime value that can be pushed as a frame, stored in a frame, passed as a
/// call argument or returned by a callable.
#[derive(Clone, Default)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string. The empty string doubles as the "not found" result.
    String(String),
    /// Shared sequence. Searched as a mapping keyed by decimal index.
    List(Rc<Vec<Value>>),
    /// Shared ordered mapping.
    Map(Rc<Mapping>),
    /// Shared host object exposing properties and callables.
    Record(Rc<dyn Record>),
}

/// How a value behaves when it is searched as a scope frame.
#[derive(Clone, Copy)]
pub enum Frame<'a> {
    /// Key-presence lookup.
    Mapping(&'a Mapping),
    /// Decimal-index lookup, `"0"`, `"1"`, ...
    Sequence(&'a [Value]),
    /// Callable first, then property.
    Record(&'a dyn Record),
}

impl Value {
    /// The result of a lookup that found nothing.
    ///
    /// It is the empty string, so it cannot be told apart from a value that is
    /// present but empty. Use the `try_*` lookups when the difference matters.
    pub fn absent() -> Self {
        Value::String(String::new())
    }

    /// Whether this is the "not found" representation (the empty string).
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::String(s) if s.is_empty())
    }

    /// Wrap a host object.
    pub fn record(record: impl Record + 'static) -> Self {
        Value::Record(Rc::new(record))
    }

    /// View this value as a scope frame. Scalars expose no members.
    pub fn as_frame(&self) -> Option<Frame<'_>> {
        match self {
            Value::Map(map) => Some(Frame::Mapping(map)),
            Value::List(list) => Some(Frame::Sequence(list)),
            Value::Record(record) => Some(Frame::Record(&**record)),
            _ => None,
        }
    }

    /// Identity comparison: true when both values share the same allocation.
    ///
    /// Scalars have no identity and compare by value.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => {
                core::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            (Value::List(_) | Value::Map(_) | Value::Record(_), _)
            | (_, Value::List(_) | Value::Map(_) | Value::Record(_)) => false,
            _ => self == other,
        }
    }

    /// Mustache falsiness: null, `false`, the empty string and the empty list are
    /// falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Int(_) | Value::Float(_) | Value::Map(_) | Value::Record(_) => true,
        }
    }

    /// Short name of the value's kind, for diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(record) => record.type_name(),
        }
    }

    /// Coerce to text at the output boundary. Absent and null become `""`.
    pub fn render_to_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::List(l) => {
                let items: Vec<_> = l.iter().map(Value::render_to_string).collect();
                items.join(",")
            }
            Value::Map(_) | Value::Record(_) => format!("[{}]", self.type_name()),
        }
    }

    /// Borrow the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Borrow the mapping payload, if any.
    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the list payload, if any.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// Structural equality for data, identity for records.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Record(_), Value::Record(_)) => self.ptr_eq(other),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::List(l) => f.debug_list().entries(l.iter()).finish(),
            Value::Map(m) => f.debug_map().entries(m.iter()).finish(),
            Value::Record(r) => fmt::Debug::fmt(r, f),
        }
    }
}

impl fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Mapping(map) => f.debug_tuple("Mapping").field(map).finish(),
            Frame::Sequence(list) => f.debug_tuple("Sequence").field(list).finish(),
            Frame::Record(record) => f.debug_tuple("Record").field(record).finish(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(list: Vec<Value>) -> Self {
        Value::List(Rc::new(list))
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Map(Rc::new(map))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let map: Mapping = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Value::from(map)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::from(iter.into_iter().collect::<Vec<_>>())
    }
}
