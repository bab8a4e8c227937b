//! Type-erased field values.
//!
//! [`Value`] is the closed set of shapes the walker snapshots out of a record and the
//! coercion engine accepts as input. Optional chains are flattened: an empty `Option`
//! is [`Value::Nil`], a populated one is the value it holds.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Seq(Vec<Value>),
    Map(Mapping),
    Record(RecordValue),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Uint(_) | Value::Float(_))
    }

    /// Whether this is the zero value of its shape. Empty sequences and maps count as zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Uint(u) => *u == 0,
            Value::Float(f) => *f == 0.0,
            Value::String(s) => s.is_empty(),
            Value::Seq(items) => items.is_empty(),
            Value::Map(mapping) => mapping.is_empty(),
            Value::Record(record) => record.fields.iter().all(|(_, value)| value.is_zero()),
        }
    }

    /// Short name of the value's shape, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Record(record) => record.name(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(mapping) => Some(mapping),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(mapping) => write!(f, "{mapping}"),
            Value::Record(record) => write!(f, "{record}"),
        }
    }
}

/// Key/value pairs of a mapping value, in insertion order.
///
/// Equality ignores order so snapshots of hash maps compare reliably.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<(Value, Value)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair, replacing (and returning) the value under an equal key.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(existing, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Builds a mapping from pairs whose keys are known to be distinct, such as the entries
    /// of a hash map or a JSON object, without checking for duplicates.
    pub(crate) fn from_distinct(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// True when every key is a string. Vacuously true for an empty mapping.
    pub fn has_string_keys(&self) -> bool {
        self.entries.iter().all(|(k, _)| matches!(k, Value::String(_)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl IntoIterator for Mapping {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        f.write_str("}")
    }
}

/// Snapshot of a record: its Rust type name and its fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    pub type_name: &'static str,
    pub fields: Vec<(&'static str, Value)>,
}

impl RecordValue {
    pub fn new(type_name: &'static str, fields: Vec<(&'static str, Value)>) -> Self {
        Self { type_name, fields }
    }

    /// Last path segment of the type name (`app::models::User` -> `User`).
    pub fn name(&self) -> &'static str {
        short_type_name(self.type_name)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.iter().find(|(name, _)| *name == field).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.iter_mut().find(|(name, _)| *name == field).map(|(_, v)| v)
    }

    /// Removes a field's value, leaving `Nil` in its slot.
    pub fn take(&mut self, field: &str) -> Option<Value> {
        self.get_mut(field).map(std::mem::take)
    }

    /// Strictly converts the named field, falling back to the type's zero when it is absent.
    /// Used by derived `Reflect::from_value` implementations.
    pub fn take_field<T: crate::reflect::Reflect>(&mut self, field: &str) -> Result<T, crate::CoerceError> {
        match self.take(field) {
            Some(value) => T::from_value(value).map_err(|err| crate::CoerceError::field(field, err)),
            None => Ok(T::zero()),
        }
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.name())?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

pub(crate) fn short_type_name(type_name: &'static str) -> &'static str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Uint(u) => serializer.serialize_u64(*u),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::String(s) => serializer.serialize_str(s),
            Value::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(mapping) => mapping.serialize(serializer),
            Value::Record(record) => record.serialize(serializer),
        }
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            match key {
                Value::String(text) => map.serialize_entry(text, value)?,
                other => map.serialize_entry(&other.to_string(), value)?,
            }
        }
        map.end()
    }
}

impl Serialize for RecordValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

macro_rules! value_from {
    ($variant:ident as $target:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )*
    };
}

value_from!(Int as i64: i8, i16, i32, i64, isize);
value_from!(Uint as u64: u8, u16, u32, u64, usize);
value_from!(Float as f64: f32, f64);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}

impl<K: Into<Value>, V: Into<Value>, S> From<HashMap<K, V, S>> for Value {
    fn from(v: HashMap<K, V, S>) -> Self {
        Value::Map(Mapping::from_distinct(v.into_iter().map(|(k, v)| (k.into(), v.into()))))
    }
}

impl<K: Into<Value>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(v: BTreeMap<K, V>) -> Self {
        Value::Map(Mapping::from_distinct(v.into_iter().map(|(k, v)| (k.into(), v.into()))))
    }
}

impl From<Mapping> for Value {
    fn from(v: Mapping) -> Self {
        Value::Map(v)
    }
}

impl From<RecordValue> for Value {
    fn from(v: RecordValue) -> Self {
        Value::Record(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Seq(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(object) => Value::Map(Mapping::from_distinct(
                object.into_iter().map(|(k, v)| (Value::String(k), Value::from(v))),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_values() {
        assert!(Value::Nil.is_zero());
        assert!(Value::from(0).is_zero());
        assert!(Value::from("").is_zero());
        assert!(Value::from(Vec::<i32>::new()).is_zero());
        assert!(Value::from(false).is_zero());
        assert!(!Value::from(1u8).is_zero());
        assert!(!Value::from(0.5).is_zero());

        let record = RecordValue::new("demo::Point", vec![("x", Value::Int(0)), ("y", Value::Int(0))]);
        assert!(Value::Record(record.clone()).is_zero());
        let mut moved = record;
        *moved.get_mut("y").unwrap() = Value::Int(3);
        assert!(!Value::Record(moved).is_zero());
    }

    #[test]
    fn mapping_equality_ignores_order() {
        let a: Mapping = [("key1", "value1"), ("key2", "value2")].into_iter().collect();
        let b: Mapping = [("key2", "value2"), ("key1", "value1")].into_iter().collect();
        assert_eq!(a, b);

        let mut c = a.clone();
        assert_eq!(c.insert("key1", "changed"), Some(Value::from("value1")));
        assert_ne!(a, c);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn large_maps_convert_in_linear_time() {
        let source: HashMap<u32, u32> = (0..50_000).map(|i| (i, i * 2)).collect();
        let value = Value::from(source);
        let mapping = value.as_map().expect("hash map becomes a mapping");
        assert_eq!(mapping.len(), 50_000);
        assert_eq!(mapping.get(&Value::from(49_999u32)), Some(&Value::from(99_998u32)));

        let object: serde_json::Map<String, serde_json::Value> =
            (0..50_000).map(|i| (format!("k{i}"), json!(i))).collect();
        let value = Value::from(serde_json::Value::Object(object));
        assert_eq!(value.as_map().map(Mapping::len), Some(50_000));
    }

    #[test]
    fn converts_from_json() {
        let value = Value::from(json!({"name": "John", "age": 30.0, "tags": ["a", 1], "big": u64::MAX, "none": null}));
        let mapping = value.as_map().expect("object becomes a mapping");
        assert_eq!(mapping.get_str("name"), Some(&Value::from("John")));
        assert_eq!(mapping.get_str("age"), Some(&Value::Float(30.0)));
        assert_eq!(
            mapping.get_str("tags"),
            Some(&Value::Seq(vec![Value::from("a"), Value::Int(1)]))
        );
        assert_eq!(mapping.get_str("big"), Some(&Value::Uint(u64::MAX)));
        assert_eq!(mapping.get_str("none"), Some(&Value::Nil));
        assert!(mapping.has_string_keys());
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::from(42).to_string(), "42");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(42.0).to_string(), "42");
        assert_eq!(Value::from(3.5).to_string(), "3.5");
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "[a, b]");
        let record = RecordValue::new("demo::Point", vec![("x", Value::Int(1)), ("y", Value::Int(2))]);
        assert_eq!(record.to_string(), "Point{x: 1, y: 2}");
    }

    #[test]
    fn serializes_to_json() {
        let mut mapping = Mapping::new();
        mapping.insert(1, "one");
        let value = Value::Seq(vec![Value::Map(mapping), Value::Nil, Value::from(2.5)]);
        assert_eq!(serde_json::to_value(&value).unwrap(), json!([{"1": "one"}, null, 2.5]));
    }

    #[test]
    fn short_type_names() {
        assert_eq!(short_type_name("a::b::Config"), "Config");
        assert_eq!(short_type_name("Config"), "Config");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
    }
}
