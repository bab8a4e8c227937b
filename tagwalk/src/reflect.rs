//! Runtime description of Rust types.
//!
//! [`Reflect`] is implemented here for the primitive and container types the coercion
//! engine understands, and by `#[derive(Record)]` for structs. It is object safe, so
//! fields are handed around as `&dyn Reflect` / `&mut dyn Reflect`.

use std::any::type_name;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};

use crate::errors::CoerceError;
use crate::types::{FieldDef, PrimitiveKind, TypeDescriptor};
use crate::value::{Mapping, Value};

pub trait Reflect {
    fn type_descriptor() -> TypeDescriptor
    where
        Self: Sized;

    /// The zero value for the type (`0`, `""`, `None`, empty collections, zeroed records).
    fn zero() -> Self
    where
        Self: Sized;

    /// Strict conversion from a value already shaped like this type. `Nil` yields the zero
    /// value; numerics of the right family are narrowed with `as` casts; anything else is a
    /// [`CoerceError::TypeMismatch`].
    fn from_value(value: Value) -> Result<Self, CoerceError>
    where
        Self: Sized;

    fn descriptor(&self) -> TypeDescriptor;

    /// Snapshot of the current value with optional chains resolved.
    fn to_value(&self) -> Value;

    /// Overwrites `self` from a value shaped like this type (see [`Reflect::from_value`]).
    fn assign(&mut self, value: Value) -> Result<(), CoerceError>;

    fn type_name(&self) -> &'static str {
        type_name::<Self>()
    }

    fn as_record(&self) -> Option<&dyn Record> {
        None
    }

    fn as_record_mut(&mut self) -> Option<&mut dyn Record> {
        None
    }
}

/// A struct whose fields can be enumerated. Implemented by `#[derive(Record)]`.
pub trait Record: Reflect {
    fn record_name(&self) -> &'static str;

    fn field_defs(&self) -> &'static [FieldDef];

    fn field(&self, index: usize) -> Option<&dyn Reflect>;

    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;
}

/// Handle to a field's storage, as handed to processors and to
/// [`set_field`](crate::coerce::set_field).
pub enum FieldRef<'a> {
    /// Writable storage.
    Mut(&'a mut dyn Reflect),
    /// A by-value copy of the field; writes are rejected.
    Value(Value),
    /// No storage at all.
    Null,
}

impl FieldRef<'_> {
    pub fn is_writable(&self) -> bool {
        matches!(self, FieldRef::Mut(_))
    }

    /// Current value behind the handle.
    pub fn value(&self) -> Value {
        match self {
            FieldRef::Mut(field) => field.to_value(),
            FieldRef::Value(value) => value.clone(),
            FieldRef::Null => Value::Nil,
        }
    }
}

impl<'a, T: Reflect> From<&'a mut T> for FieldRef<'a> {
    fn from(field: &'a mut T) -> Self {
        FieldRef::Mut(field)
    }
}

impl<'a, T: Reflect> From<Option<&'a mut T>> for FieldRef<'a> {
    fn from(field: Option<&'a mut T>) -> Self {
        match field {
            Some(field) => FieldRef::Mut(field),
            None => FieldRef::Null,
        }
    }
}

impl std::fmt::Debug for FieldRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldRef::Mut(field) => f.debug_tuple("Mut").field(&field.type_name()).finish(),
            FieldRef::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FieldRef::Null => f.write_str("Null"),
        }
    }
}

macro_rules! reflect_primitive {
    ($variant:ident as $repr:ty => $($ty:ty: $kind:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::Primitive(PrimitiveKind::$kind)
                }

                fn zero() -> Self {
                    0 as $ty
                }

                fn from_value(value: Value) -> Result<Self, CoerceError> {
                    match value {
                        Value::Nil => Ok(Self::zero()),
                        Value::$variant(v) => Ok(v as $ty),
                        other => Err(CoerceError::mismatch(&Self::type_descriptor(), &other)),
                    }
                }

                fn descriptor(&self) -> TypeDescriptor {
                    Self::type_descriptor()
                }

                fn to_value(&self) -> Value {
                    Value::$variant(*self as $repr)
                }

                fn assign(&mut self, value: Value) -> Result<(), CoerceError> {
                    *self = Self::from_value(value)?;
                    Ok(())
                }
            }
        )*
    };
}

reflect_primitive!(Int as i64 => i8: I8, i16: I16, i32: I32, i64: I64, isize: Isize);
reflect_primitive!(Uint as u64 => u8: U8, u16: U16, u32: U32, u64: U64, usize: Usize);
reflect_primitive!(Float as f64 => f32: F32, f64: F64);

impl Reflect for bool {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::Primitive(PrimitiveKind::Bool)
    }

    fn zero() -> Self {
        false
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Nil => Ok(false),
            Value::Bool(b) => Ok(b),
            other => Err(CoerceError::mismatch(&Self::type_descriptor(), &other)),
        }
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::type_descriptor()
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn assign(&mut self, value: Value) -> Result<(), CoerceError> {
        *self = Self::from_value(value)?;
        Ok(())
    }
}

impl Reflect for String {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::Primitive(PrimitiveKind::String)
    }

    fn zero() -> Self {
        String::new()
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Nil => Ok(String::new()),
            Value::String(s) => Ok(s),
            other => Err(CoerceError::mismatch(&Self::type_descriptor(), &other)),
        }
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::type_descriptor()
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn assign(&mut self, value: Value) -> Result<(), CoerceError> {
        *self = Self::from_value(value)?;
        Ok(())
    }
}

impl Reflect for Value {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::Dynamic
    }

    fn zero() -> Self {
        Value::Nil
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        Ok(value)
    }

    fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::Dynamic
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn assign(&mut self, value: Value) -> Result<(), CoerceError> {
        *self = value;
        Ok(())
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::optional(T::type_descriptor())
    }

    fn zero() -> Self {
        None
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::type_descriptor()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Nil,
        }
    }

    fn assign(&mut self, value: Value) -> Result<(), CoerceError> {
        match (self.as_mut(), value) {
            (_, Value::Nil) => *self = None,
            (Some(inner), value) => inner.assign(value)?,
            (None, value) => *self = Some(T::from_value(value)?),
        }
        Ok(())
    }

    fn as_record(&self) -> Option<&dyn Record> {
        self.as_ref().and_then(|inner| inner.as_record())
    }

    fn as_record_mut(&mut self) -> Option<&mut dyn Record> {
        self.as_mut().and_then(|inner| inner.as_record_mut())
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn type_descriptor() -> TypeDescriptor {
        T::type_descriptor()
    }

    fn zero() -> Self {
        Box::new(T::zero())
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        T::from_value(value).map(Box::new)
    }

    fn descriptor(&self) -> TypeDescriptor {
        T::type_descriptor()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn assign(&mut self, value: Value) -> Result<(), CoerceError> {
        (**self).assign(value)
    }

    fn as_record(&self) -> Option<&dyn Record> {
        (**self).as_record()
    }

    fn as_record_mut(&mut self) -> Option<&mut dyn Record> {
        (**self).as_record_mut()
    }
}

impl Reflect for char {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::Primitive(PrimitiveKind::String)
    }

    fn zero() -> Self {
        '\0'
    }

    /// A one-character string. The empty string is the zero character.
    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Nil => Ok('\0'),
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (None, _) => Ok('\0'),
                    (Some(c), None) => Ok(c),
                    _ => Err(CoerceError::Parse {
                        kind: PrimitiveKind::String,
                        input: s.clone(),
                        reason: "expected a single character".to_string(),
                    }),
                }
            }
            other => Err(CoerceError::mismatch(&Self::type_descriptor(), &other)),
        }
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::type_descriptor()
    }

    fn to_value(&self) -> Value {
        match self {
            '\0' => Value::String(String::new()),
            c => Value::String(c.to_string()),
        }
    }

    fn assign(&mut self, value: Value) -> Result<(), CoerceError> {
        *self = Self::from_value(value)?;
        Ok(())
    }
}

/// Strict element-wise conversion of a sequence value into any collection.
fn collect_elements<T, C>(value: Value, target: &TypeDescriptor) -> Result<C, CoerceError>
where
    T: Reflect,
    C: FromIterator<T> + Default,
{
    match value {
        Value::Nil => Ok(C::default()),
        Value::Seq(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| T::from_value(item).map_err(|err| CoerceError::element(index, err)))
            .collect(),
        other => Err(CoerceError::mismatch(target, &other)),
    }
}

macro_rules! reflect_collection {
    ($([$($generics:tt)*] $ty:ty),* $(,)?) => {
        $(
            impl<$($generics)*> Reflect for $ty {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::sequence(T::type_descriptor())
                }

                fn zero() -> Self {
                    Self::default()
                }

                fn from_value(value: Value) -> Result<Self, CoerceError> {
                    collect_elements(value, &Self::type_descriptor())
                }

                fn descriptor(&self) -> TypeDescriptor {
                    Self::type_descriptor()
                }

                fn to_value(&self) -> Value {
                    Value::Seq(self.iter().map(Reflect::to_value).collect())
                }

                fn assign(&mut self, value: Value) -> Result<(), CoerceError> {
                    *self = Self::from_value(value)?;
                    Ok(())
                }
            }
        )*
    };
}

reflect_collection!(
    [T: Reflect] Vec<T>,
    [T: Reflect] VecDeque<T>,
    [T: Reflect + Ord] BTreeSet<T>,
    [T: Reflect + Eq + Hash, S: BuildHasher + Default] HashSet<T, S>,
);

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence(T::type_descriptor())
    }

    fn zero() -> Self {
        std::array::from_fn(|_| T::zero())
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        if value.is_nil() {
            return Ok(Self::zero());
        }
        let items: Vec<T> = collect_elements(value, &Self::type_descriptor())?;
        let len = items.len();
        items.try_into().map_err(|_| CoerceError::Unsupported {
            from: format!("sequence of {len} elements"),
            to: type_name::<Self>().to_string(),
        })
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::type_descriptor()
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Reflect::to_value).collect())
    }

    fn assign(&mut self, value: Value) -> Result<(), CoerceError> {
        *self = Self::from_value(value)?;
        Ok(())
    }
}

impl<K, V, S> Reflect for HashMap<K, V, S>
where
    K: Reflect + Eq + Hash,
    V: Reflect,
    S: BuildHasher + Default,
{
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::mapping(K::type_descriptor(), V::type_descriptor())
    }

    fn zero() -> Self {
        HashMap::default()
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Nil => Ok(HashMap::default()),
            Value::Map(mapping) => mapping
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(CoerceError::mismatch(&Self::type_descriptor(), &other)),
        }
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::type_descriptor()
    }

    fn to_value(&self) -> Value {
        Value::Map(Mapping::from_distinct(self.iter().map(|(k, v)| (k.to_value(), v.to_value()))))
    }

    fn assign(&mut self, value: Value) -> Result<(), CoerceError> {
        *self = Self::from_value(value)?;
        Ok(())
    }
}

impl<K, V> Reflect for BTreeMap<K, V>
where
    K: Reflect + Ord,
    V: Reflect,
{
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::mapping(K::type_descriptor(), V::type_descriptor())
    }

    fn zero() -> Self {
        BTreeMap::new()
    }

    fn from_value(value: Value) -> Result<Self, CoerceError> {
        match value {
            Value::Nil => Ok(BTreeMap::new()),
            Value::Map(mapping) => mapping
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(CoerceError::mismatch(&Self::type_descriptor(), &other)),
        }
    }

    fn descriptor(&self) -> TypeDescriptor {
        Self::type_descriptor()
    }

    fn to_value(&self) -> Value {
        Value::Map(Mapping::from_distinct(self.iter().map(|(k, v)| (k.to_value(), v.to_value()))))
    }

    fn assign(&mut self, value: Value) -> Result<(), CoerceError> {
        *self = Self::from_value(value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_snapshots_resolve_through() {
        let present: Option<Box<i32>> = Some(Box::new(42));
        let absent: Option<bool> = None;
        assert_eq!(present.to_value(), Value::Int(42));
        assert_eq!(absent.to_value(), Value::Nil);
        assert_eq!(
            <Option<Box<i32>>>::type_descriptor(),
            TypeDescriptor::optional(TypeDescriptor::Primitive(PrimitiveKind::I32))
        );
    }

    #[test]
    fn option_assign_allocates_and_clears() {
        let mut slot: Option<String> = None;
        slot.assign(Value::from("hello")).unwrap();
        assert_eq!(slot.as_deref(), Some("hello"));
        slot.assign(Value::Nil).unwrap();
        assert_eq!(slot, None);
    }

    #[test]
    fn strict_from_value_rejects_other_shapes() {
        let err = i64::from_value(Value::from("42")).unwrap_err();
        assert!(matches!(err, CoerceError::TypeMismatch { ref expected, ref found } if expected == "i64" && found == "string"));
        assert_eq!(u8::from_value(Value::Uint(300)).unwrap(), 44);
        assert!(<Vec<i32>>::from_value(Value::Seq(vec![Value::Int(1), Value::Bool(true)])).is_err());
    }

    #[test]
    fn maps_round_through_values() {
        let mut source = HashMap::new();
        source.insert("key1".to_string(), "value1".to_string());
        let value = source.to_value();
        let back = <HashMap<String, String>>::from_value(value).unwrap();
        assert_eq!(back, source);
    }

    #[test]
    fn chars_are_single_character_strings() {
        assert_eq!('x'.to_value(), Value::from("x"));
        assert_eq!(char::zero().to_value(), Value::from(""));
        assert_eq!(char::from_value(Value::from("é")).unwrap(), 'é');
        assert_eq!(char::from_value(Value::from("")).unwrap(), '\0');
        let err = char::from_value(Value::from("ab")).unwrap_err();
        assert!(err.to_string().contains("expected a single character"));
    }

    #[test]
    fn set_and_deque_collections_are_sequences() {
        let deque: VecDeque<i32> = VecDeque::from([1, 2]);
        assert_eq!(deque.to_value(), Value::Seq(vec![Value::Int(1), Value::Int(2)]));

        let set = <BTreeSet<String>>::from_value(Value::from(vec!["b", "a", "b"])).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), ["a", "b"]);

        let hashed = <HashSet<u8>>::from_value(Value::Seq(vec![Value::Uint(3)])).unwrap();
        assert!(hashed.contains(&3));
        assert_eq!(
            <HashSet<u8>>::type_descriptor(),
            TypeDescriptor::sequence(TypeDescriptor::Primitive(PrimitiveKind::U8))
        );
    }

    #[test]
    fn arrays_require_their_exact_length() {
        assert_eq!(<[i32; 3]>::zero(), [0, 0, 0]);
        let value = Value::from(vec![1, 2, 3]);
        assert_eq!(<[i32; 3]>::from_value(value.clone()).unwrap(), [1, 2, 3]);
        let err = <[i32; 2]>::from_value(value).unwrap_err();
        assert!(matches!(err, CoerceError::Unsupported { ref from, .. } if from == "sequence of 3 elements"));
        assert_eq!(<[i32; 2]>::from_value(Value::Nil).unwrap(), [0, 0]);
    }

    #[test]
    fn field_ref_from_optional_handle() {
        let mut s = String::from("x");
        assert!(FieldRef::from(Some(&mut s)).is_writable());
        assert!(matches!(FieldRef::from(None::<&mut String>), FieldRef::Null));
    }
}
