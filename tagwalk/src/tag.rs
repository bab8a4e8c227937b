use std::fmt;
use std::ops::Deref;

use serde::Serialize;

use crate::errors::CoerceError;
use crate::reflect::Reflect;
use crate::types::TypeDescriptor;
use crate::value::Value;

/// One extracted annotation: `name[,opt...]` under `key`, with a snapshot of the field's value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Tag {
    pub key: String,
    pub name: String,
    pub options: Vec<String>,
    pub value: Value,
}

impl Tag {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// Strict extraction of the snapshot as `T`. No coercion happens: a string `"42"` is
    /// not an `i64`, and `300` is not an `i8`. An empty snapshot only converts into optional
    /// or dynamic targets.
    pub fn value_as<T: Reflect>(&self) -> Result<T, CoerceError> {
        let target = T::type_descriptor();
        if self.value.is_nil() && !matches!(target, TypeDescriptor::Optional(_) | TypeDescriptor::Dynamic) {
            return Err(CoerceError::mismatch(&target, &self.value));
        }
        let extracted = T::from_value(self.value.clone())?;
        if !same_value(&extracted.to_value(), &self.value) {
            return Err(CoerceError::mismatch(&target, &self.value));
        }
        Ok(extracted)
    }
}

/// Equality that also treats two NaN floats as the same value.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) if x.is_nan() && y.is_nan() => true,
        _ => a == b,
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tag(key={}, name={}, options=[{}], value={})",
            self.key,
            self.name,
            self.options.join(", "),
            self.value
        )
    }
}

/// Splits a raw annotation on its first comma into a name and options.
///
/// ```
/// use tagwalk::{Value, parse_tag};
///
/// let tag = parse_tag("json", "id,omitempty,string", Value::Nil);
/// assert_eq!(tag.name, "id");
/// assert_eq!(tag.options, ["omitempty", "string"]);
/// ```
pub fn parse_tag(key: &str, raw: &str, value: Value) -> Tag {
    let (name, options) = match raw.split_once(',') {
        Some((name, rest)) => (name, rest.split(',').map(str::to_string).collect()),
        None => (raw, Vec::new()),
    };
    Tag {
        key: key.to_string(),
        name: name.to_string(),
        options,
        value,
    }
}

/// Ordered result of a walk.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Tags(Vec<Tag>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: Tag) {
        self.0.push(tag);
    }

    pub fn extend(&mut self, other: Tags) {
        self.0.extend(other.0);
    }

    /// Entries satisfying `predicate`, in order.
    pub fn filter<F>(&self, mut predicate: F) -> Tags
    where
        F: FnMut(&Tag) -> bool,
    {
        self.0.iter().filter(|tag| predicate(tag)).cloned().collect()
    }

    pub fn find<F>(&self, mut predicate: F) -> Option<&Tag>
    where
        F: FnMut(&Tag) -> bool,
    {
        self.0.iter().find(|tag| predicate(tag))
    }

    pub fn to_vec(&self) -> Vec<Tag> {
        self.0.clone()
    }

    pub fn into_vec(self) -> Vec<Tag> {
        self.0
    }
}

impl Deref for Tags {
    type Target = [Tag];

    fn deref(&self) -> &[Tag] {
        &self.0
    }
}

impl From<Vec<Tag>> for Tags {
    fn from(tags: Vec<Tag>) -> Self {
        Self(tags)
    }
}

impl FromIterator<Tag> for Tags {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Tags {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
