//! Best-effort conversion of arbitrary values into typed destinations.
//!
//! Conversion is descriptor driven: [`Coercer::coerce`] turns the input into a [`Value`]
//! shaped like the destination's [`TypeDescriptor`], and only then is the destination
//! assigned. A failed conversion leaves the destination untouched.

use crate::config::CoerceSettings;
use crate::errors::CoerceError;
use crate::reflect::{FieldRef, Reflect};
use crate::types::{PrimitiveKind, RecordDescriptor, TypeDescriptor};
use crate::value::{Mapping, RecordValue, Value};

#[derive(Debug, Clone, Default)]
pub struct Coercer {
    settings: CoerceSettings,
}

impl Coercer {
    pub fn new(settings: CoerceSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CoerceSettings {
        &self.settings
    }

    /// Writes `value` through a field handle, as handed to a tag processor.
    pub fn set_field(&self, field: FieldRef<'_>, value: impl Into<Value>) -> Result<(), CoerceError> {
        match field {
            FieldRef::Mut(target) => self.set(target, value),
            FieldRef::Value(snapshot) => Err(CoerceError::NotAReference {
                type_name: snapshot.type_name().to_string(),
            }),
            FieldRef::Null => Err(CoerceError::NilReference),
        }
    }

    pub fn set<T: Reflect + ?Sized>(&self, field: &mut T, value: impl Into<Value>) -> Result<(), CoerceError> {
        let descriptor = field.descriptor();
        let value = value.into();
        log::trace!("coercing {} into {}", value.type_name(), descriptor);
        let normalized = self.coerce(&descriptor, field.to_value(), value)?;
        field.assign(normalized)
    }

    /// Converts `value` into the shape of `target`. `current` is the destination's present
    /// value; records and optional targets are updated in place from it rather than rebuilt.
    pub fn coerce(&self, target: &TypeDescriptor, current: Value, value: Value) -> Result<Value, CoerceError> {
        if value.is_nil() {
            return Ok(target.zero_value());
        }
        if target.accepts(&value) {
            return Ok(target.fit(value));
        }

        match target {
            TypeDescriptor::Optional(inner) => {
                let current = if current.is_nil() { inner.zero_value() } else { current };
                self.coerce(inner, current, value).map_err(|err| CoerceError::Pointee {
                    type_name: inner.to_string(),
                    source: Box::new(err),
                })
            }
            TypeDescriptor::Dynamic => Ok(value),
            TypeDescriptor::Record(record) => match value {
                Value::Map(mapping) if mapping.has_string_keys() => self.coerce_record(record, current, &mapping),
                other => Err(CoerceError::unsupported(&other, target)),
            },
            TypeDescriptor::Sequence(element) => self.coerce_sequence(target, element, value),
            TypeDescriptor::Mapping(..) => Err(CoerceError::unsupported(&value, target)),
            TypeDescriptor::Primitive(kind) => coerce_primitive(*kind, target, value),
        }
    }

    fn coerce_record(
        &self,
        record: &RecordDescriptor,
        current: Value,
        mapping: &Mapping,
    ) -> Result<Value, CoerceError> {
        let mut out = match current {
            Value::Record(rv) if rv.type_name == record.type_name => rv,
            _ => record.zero_record(),
        };

        for (def, ty) in record.fields_with_types() {
            if !def.exported {
                continue;
            }
            let raw = def.tag(&self.settings.name_key);
            if raw == "-" {
                continue;
            }
            let name = match raw.split(',').next() {
                Some(name) if !name.is_empty() => name,
                _ => def.name,
            };
            let Some(input) = mapping.get_str(name).or_else(|| mapping.get_str(def.name)) else {
                continue;
            };

            let slot = field_slot(&mut out, def.name);
            let present = std::mem::take(slot);
            *slot = self
                .coerce(&ty, present, input.clone())
                .map_err(|err| CoerceError::field(def.name, err))?;
        }

        Ok(Value::Record(out))
    }

    fn coerce_sequence(
        &self,
        target: &TypeDescriptor,
        element: &TypeDescriptor,
        value: Value,
    ) -> Result<Value, CoerceError> {
        match value {
            Value::String(s) if s.is_empty() => Ok(Value::Seq(Vec::new())),
            Value::String(s) => s
                .split(',')
                .enumerate()
                .map(|(index, part)| self.coerce_element(element, index, Value::from(part.trim())))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Seq),
            Value::Seq(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| self.coerce_element(element, index, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Seq),
            single if element.accepts(&single) => Ok(Value::Seq(vec![element.fit(single)])),
            other => Err(CoerceError::unsupported(&other, target)),
        }
    }

    fn coerce_element(&self, element: &TypeDescriptor, index: usize, value: Value) -> Result<Value, CoerceError> {
        self.coerce(element, element.zero_value(), value)
            .map_err(|err| CoerceError::element(index, err))
    }
}

/// The snapshot slot for `name`, created when a partial snapshot lacks it.
fn field_slot<'a>(record: &'a mut RecordValue, name: &'static str) -> &'a mut Value {
    let index = match record.fields.iter().position(|(field, _)| *field == name) {
        Some(index) => index,
        None => {
            record.fields.push((name, Value::Nil));
            record.fields.len() - 1
        }
    };
    &mut record.fields[index].1
}

fn coerce_primitive(kind: PrimitiveKind, target: &TypeDescriptor, value: Value) -> Result<Value, CoerceError> {
    match value {
        Value::String(s) => parse_primitive(kind, &s),
        v if v.is_numeric() && kind.is_numeric() => Ok(kind.cast(v)),
        v if kind == PrimitiveKind::String => Ok(Value::String(v.to_string())),
        v => Err(CoerceError::unsupported(&v, target)),
    }
}

fn parse_primitive(kind: PrimitiveKind, input: &str) -> Result<Value, CoerceError> {
    let parse_err = |reason: String| CoerceError::Parse {
        kind,
        input: input.to_string(),
        reason,
    };

    match kind {
        PrimitiveKind::String => Ok(Value::String(input.to_string())),
        PrimitiveKind::Bool => match input {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(parse_err("expected one of true, false, 1, 0".to_string())),
        },
        k if k.is_signed() => input
            .parse::<i64>()
            .map(|v| k.cast(Value::Int(v)))
            .map_err(|err| parse_err(err.to_string())),
        k if k.is_unsigned() => input
            .parse::<u64>()
            .map(|v| k.cast(Value::Uint(v)))
            .map_err(|err| parse_err(err.to_string())),
        k => input
            .parse::<f64>()
            .map(|v| k.cast(Value::Float(v)))
            .map_err(|err| parse_err(err.to_string())),
    }
}

/// [`Coercer::set_field`] with default settings.
pub fn set_field(field: FieldRef<'_>, value: impl Into<Value>) -> Result<(), CoerceError> {
    Coercer::default().set_field(field, value)
}

/// [`Coercer::set`] with default settings.
pub fn set<T: Reflect + ?Sized>(field: &mut T, value: impl Into<Value>) -> Result<(), CoerceError> {
    Coercer::default().set(field, value)
}
