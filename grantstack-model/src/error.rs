//! Error types for the marshalling layer.

use thiserror::Error;

/// Result type for codec and resolver operations.
pub type MarshalResult<T> = Result<T, MarshalError>;

/// Errors surfaced while turning raw values into records.
///
/// Field paths are dotted and indexed from the decoded root, e.g.
/// `permissions[1].dateCreated`.
#[derive(Debug, Error)]
pub enum MarshalError {
    /// A required field is absent or `null`.
    #[error("{record}: missing required field `{field}`")]
    MissingRequiredField { record: &'static str, field: String },

    /// A field holds a value of the wrong primitive type.
    #[error("{record}: field `{field}` expected {expected}, found {found}")]
    TypeMismatch {
        record: &'static str,
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A timestamp field holds text that is not ISO-8601.
    #[error("{record}: field `{field}` holds malformed timestamp {value:?}")]
    MalformedTimestamp {
        record: &'static str,
        field: String,
        value: String,
    },

    /// A condition tree names a child the bundle does not define.
    #[error("condition references `{path}`, which the bundle does not define")]
    InconsistentConditionReference { path: String },

    /// A cache dictionary holds a value outside {string, integer, boolean, blob}.
    #[error("cache key `{key}` holds unsupported {found} value")]
    UnsupportedCacheValueType { key: String, found: &'static str },

    /// A reserved cache key equals a record field name or the other reserved key.
    #[error("{record}: reserved cache key `{key}` collides with another key")]
    ReservedKeyCollision { record: &'static str, key: String },

    /// Raw text was not JSON at all.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MarshalError {
    /// Prefixes the field path with the name of the enclosing field.
    #[must_use]
    pub fn within(self, parent: &str) -> Self {
        let join = |field: String| {
            if field.is_empty() {
                parent.to_string()
            } else if field.starts_with('[') {
                format!("{parent}{field}")
            } else {
                format!("{parent}.{field}")
            }
        };
        match self {
            Self::MissingRequiredField { record, field } => Self::MissingRequiredField {
                record,
                field: join(field),
            },
            Self::TypeMismatch {
                record,
                field,
                expected,
                found,
            } => Self::TypeMismatch {
                record,
                field: join(field),
                expected,
                found,
            },
            Self::MalformedTimestamp {
                record,
                field,
                value,
            } => Self::MalformedTimestamp {
                record,
                field: join(field),
                value,
            },
            Self::InconsistentConditionReference { path } => {
                Self::InconsistentConditionReference { path: join(path) }
            }
            other => other,
        }
    }

    /// Returns the offending field path, if the error names one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField { field, .. }
            | Self::TypeMismatch { field, .. }
            | Self::MalformedTimestamp { field, .. } => Some(field),
            Self::InconsistentConditionReference { path } => Some(path),
            Self::UnsupportedCacheValueType { key, .. }
            | Self::ReservedKeyCollision { key, .. } => Some(key),
            Self::Serialization(_) => None,
        }
    }
}

/// Short name of a JSON value's variant, for error messages.
pub fn json_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
