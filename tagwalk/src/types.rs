use std::fmt;

use serde::Serialize;

use crate::value::{Mapping, RecordValue, Value, short_type_name};

/// Scalar destination kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
}

impl PrimitiveKind {
    pub fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::Isize)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64 | Self::Usize)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_signed() || self.is_unsigned() || self.is_float()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Isize => "isize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "string" | "String" => Self::String,
            "bool" => Self::Bool,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "isize" => Self::Isize,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "usize" => Self::Usize,
            "f32" => Self::F32,
            "f64" => Self::F64,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether a value of this shape belongs to the kind's family, ignoring width.
    fn accepts(self, value: &Value) -> bool {
        match value {
            Value::String(_) => self == Self::String,
            Value::Bool(_) => self == Self::Bool,
            Value::Int(_) => self.is_signed(),
            Value::Uint(_) => self.is_unsigned(),
            Value::Float(_) => self.is_float(),
            _ => false,
        }
    }

    fn zero_value(self) -> Value {
        match self {
            Self::String => Value::String(String::new()),
            Self::Bool => Value::Bool(false),
            k if k.is_signed() => Value::Int(0),
            k if k.is_unsigned() => Value::Uint(0),
            _ => Value::Float(0.0),
        }
    }

    /// Casts a numeric value into this kind with `as` semantics: integer narrowing keeps
    /// the low bits, float to integer truncates toward zero. Non-numeric values and
    /// non-numeric kinds pass through unchanged.
    pub fn cast(self, value: Value) -> Value {
        if !self.is_numeric() || !value.is_numeric() {
            return value;
        }
        match self {
            Self::I8 => Value::Int(as_i64(&value) as i8 as i64),
            Self::I16 => Value::Int(as_i64(&value) as i16 as i64),
            Self::I32 => Value::Int(as_i64(&value) as i32 as i64),
            Self::I64 => Value::Int(as_i64(&value)),
            Self::Isize => Value::Int(as_i64(&value) as isize as i64),
            Self::U8 => Value::Uint(as_u64(&value) as u8 as u64),
            Self::U16 => Value::Uint(as_u64(&value) as u16 as u64),
            Self::U32 => Value::Uint(as_u64(&value) as u32 as u64),
            Self::U64 => Value::Uint(as_u64(&value)),
            Self::Usize => Value::Uint(as_u64(&value) as usize as u64),
            Self::F32 => Value::Float(as_f64(&value) as f32 as f64),
            _ => Value::Float(as_f64(&value)),
        }
    }
}

fn as_i64(value: &Value) -> i64 {
    match value {
        Value::Int(i) => *i,
        Value::Uint(u) => *u as i64,
        Value::Float(f) => *f as i64,
        _ => 0,
    }
}

fn as_u64(value: &Value) -> u64 {
    match value {
        Value::Int(i) => *i as u64,
        Value::Uint(u) => *u,
        Value::Float(f) => *f as u64,
        _ => 0,
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Uint(u) => *u as f64,
        Value::Float(f) => *f,
        _ => 0.0,
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared shape of a destination, the input to the coercion engine's dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    /// `Option<T>`; `Box<T>` is transparent and describes as `T`.
    Optional(Box<TypeDescriptor>),
    Sequence(Box<TypeDescriptor>),
    Mapping(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Record(RecordDescriptor),
    /// [`Value`] itself: holds anything.
    Dynamic,
}

impl TypeDescriptor {
    pub fn optional(inner: TypeDescriptor) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn sequence(element: TypeDescriptor) -> Self {
        Self::Sequence(Box::new(element))
    }

    pub fn mapping(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Mapping(Box::new(key), Box::new(value))
    }

    /// The value a fresh destination of this type holds.
    pub fn zero_value(&self) -> Value {
        match self {
            Self::Primitive(kind) => kind.zero_value(),
            Self::Optional(_) | Self::Dynamic => Value::Nil,
            Self::Sequence(_) => Value::Seq(Vec::new()),
            Self::Mapping(..) => Value::Map(Mapping::new()),
            Self::Record(record) => Value::Record(record.zero_record()),
        }
    }

    /// Direct assignability: the value already has this type's shape (numeric width aside).
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Dynamic => true,
            Self::Primitive(kind) => kind.accepts(value),
            Self::Optional(inner) => value.is_nil() || inner.accepts(value),
            Self::Sequence(element) => match value {
                Value::Seq(items) => items.iter().all(|item| element.accepts(item)),
                _ => false,
            },
            Self::Mapping(key, val) => match value {
                Value::Map(mapping) => mapping.iter().all(|(k, v)| key.accepts(k) && val.accepts(v)),
                _ => false,
            },
            Self::Record(record) => match value {
                Value::Record(rv) => rv.type_name == record.type_name,
                _ => false,
            },
        }
    }

    /// Normalizes an accepted value to this type, narrowing numerics to the declared width.
    pub fn fit(&self, value: Value) -> Value {
        match (self, value) {
            (Self::Primitive(kind), value) => kind.cast(value),
            (Self::Optional(_), Value::Nil) => Value::Nil,
            (Self::Optional(inner), value) => inner.fit(value),
            (Self::Sequence(element), Value::Seq(items)) => {
                Value::Seq(items.into_iter().map(|item| element.fit(item)).collect())
            }
            (Self::Mapping(key, val), Value::Map(mapping)) => {
                Value::Map(mapping.into_iter().map(|(k, v)| (key.fit(k), val.fit(v))).collect())
            }
            (_, value) => value,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::Optional(inner) => write!(f, "Option<{inner}>"),
            Self::Sequence(element) => write!(f, "Vec<{element}>"),
            Self::Mapping(key, value) => write!(f, "Map<{key}, {value}>"),
            Self::Record(record) => f.write_str(record.name()),
            Self::Dynamic => f.write_str("any"),
        }
    }
}

/// Shape of a derived record.
///
/// Field types are produced lazily so that self-referential records
/// (`next: Option<Box<Self>>`) can be described without infinite recursion.
#[derive(Clone, Copy)]
pub struct RecordDescriptor {
    pub type_name: &'static str,
    pub fields: &'static [FieldDef],
    field_types: fn() -> Vec<TypeDescriptor>,
}

impl RecordDescriptor {
    pub fn new(type_name: &'static str, fields: &'static [FieldDef], field_types: fn() -> Vec<TypeDescriptor>) -> Self {
        Self {
            type_name,
            fields,
            field_types,
        }
    }

    pub fn name(&self) -> &'static str {
        short_type_name(self.type_name)
    }

    /// Each field definition paired with its declared type.
    pub fn fields_with_types(&self) -> impl Iterator<Item = (&'static FieldDef, TypeDescriptor)> {
        self.fields.iter().zip((self.field_types)())
    }

    pub fn zero_record(&self) -> RecordValue {
        RecordValue::new(
            self.type_name,
            self.fields_with_types()
                .map(|(def, ty)| (def.name, ty.zero_value()))
                .collect(),
        )
    }
}

impl PartialEq for RecordDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

impl fmt::Debug for RecordDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDescriptor")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Static metadata for one record field, emitted by `#[derive(Record)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    /// Declared with a visibility other than private.
    pub exported: bool,
    /// Marked `#[tag(embed)]`: its record's fields are promoted into the parent.
    pub embedded: bool,
    /// `(key, raw annotation)` pairs in declaration order.
    pub tags: &'static [(&'static str, &'static str)],
}

impl FieldDef {
    pub const fn new(
        name: &'static str,
        exported: bool,
        embedded: bool,
        tags: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            name,
            exported,
            embedded,
            tags,
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&'static str> {
        self.tags.iter().find(|(k, _)| *k == key).map(|(_, raw)| *raw)
    }

    /// Raw annotation for `key`, or the empty string when the field carries none.
    pub fn tag(&self, key: &str) -> &'static str {
        self.lookup(key).unwrap_or_default()
    }
}
