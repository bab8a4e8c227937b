use thiserror::Error;

use crate::types::{PrimitiveKind, TypeDescriptor};
use crate::value::Value;

/// Errors returned by the tag walker.
#[derive(Debug, Error)]
pub enum TagError {
    /// The input handed to the walker is not a record (or an optional/boxed record).
    #[error("expected input to be a record; got: {type_name}")]
    NotARecord { type_name: String },

    /// A caller-supplied processor rejected a field. The walk is aborted.
    #[error("error processing field {field}: {source}")]
    Process {
        field: String,
        #[source]
        source: anyhow::Error,
    },

    /// Records nest deeper than the configured limit.
    #[error("record nesting exceeds maximum depth {max_depth} at {record}")]
    DepthExceeded { max_depth: usize, record: String },
}

/// Errors returned by the coercion engine.
#[derive(Debug, Error)]
pub enum CoerceError {
    /// The destination handle is a by-value snapshot and cannot be written.
    #[error("field must be a mutable reference, got {type_name}")]
    NotAReference { type_name: String },

    /// The destination handle points nowhere.
    #[error("field reference is nil")]
    NilReference,

    /// Textual parse of a primitive failed.
    #[error("cannot parse {input:?} as {kind}: {reason}")]
    Parse {
        kind: PrimitiveKind,
        input: String,
        reason: String,
    },

    /// No conversion rule matches the source/destination pair.
    #[error("cannot convert {from} to {to}")]
    Unsupported { from: String, to: String },

    /// Strict extraction found a value of a different shape.
    #[error("type assertion to {expected} failed for value of type {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("error converting element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<CoerceError>,
    },

    #[error("error setting field {field}: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<CoerceError>,
    },

    #[error("error setting {type_name} target: {source}")]
    Pointee {
        type_name: String,
        #[source]
        source: Box<CoerceError>,
    },
}

impl CoerceError {
    pub fn unsupported(value: &Value, target: &TypeDescriptor) -> Self {
        Self::Unsupported {
            from: value.type_name().to_string(),
            to: target.to_string(),
        }
    }

    pub fn mismatch(expected: &TypeDescriptor, found: &Value) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: found.type_name().to_string(),
        }
    }

    pub fn element(index: usize, source: CoerceError) -> Self {
        Self::Element {
            index,
            source: Box::new(source),
        }
    }

    pub fn field(field: impl Into<String>, source: CoerceError) -> Self {
        Self::Field {
            field: field.into(),
            source: Box::new(source),
        }
    }

    /// Innermost error once index/field/target wrappers are peeled off.
    pub fn root_cause(&self) -> &CoerceError {
        let mut current = self;
        loop {
            match current {
                Self::Element { source, .. } | Self::Field { source, .. } | Self::Pointee { source, .. } => {
                    current = source;
                }
                other => return other,
            }
        }
    }
}

/// Failure to load a [`Config`](crate::config::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_cause_unwraps_nested_wrappers() {
        let err = CoerceError::field(
            "ids",
            CoerceError::element(
                1,
                CoerceError::Parse {
                    kind: PrimitiveKind::I64,
                    input: "x".into(),
                    reason: "invalid digit found in string".into(),
                },
            ),
        );
        assert!(matches!(err.root_cause(), CoerceError::Parse { input, .. } if input == "x"));
        assert_eq!(
            err.to_string(),
            "error setting field ids: error converting element 1: cannot parse \"x\" as i64: invalid digit found in string"
        );
    }
}
