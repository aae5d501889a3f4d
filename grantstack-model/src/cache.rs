//! Tolerant codec for the flat on-device cache dictionary.
//!
//! Decoding is total. Each field is guarded on its own: a missing key or a
//! value that cannot be coerced leaves that field at its zero value and the
//! rest of the record is still read. Values stored under the wrong primitive
//! type are described as text and re-parsed before being given up on.
//!
//! Only scalar fields are cached. Nested records, lists and trees decode to
//! their zero value and must be re-fetched through the wire codec.

use crate::config::CacheKeys;
use crate::error::json_kind;
use crate::{
    FieldDescriptor, FieldRole, FieldType, FieldValue, Fields, Marshal, MarshalError,
    MarshalResult,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use grantstack_types::Timestamp;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A primitive the cache can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    Blob(Vec<u8>),
}

impl CacheValue {
    /// Renders scalars as text; blobs have no text form.
    #[must_use]
    pub fn describe(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Integer(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Blob(_) => None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Bool(_) => "boolean",
            Self::Blob(_) => "blob",
        }
    }
}

/// A flat key → primitive dictionary, the unit the persistence engine stores.
///
/// Writing a dictionary for a record key always replaces the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheDict(BTreeMap<String, CacheValue>);

impl CacheDict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: CacheValue) {
        self.0.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CacheValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheValue> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, CacheValue)> for CacheDict {
    fn from_iter<I: IntoIterator<Item = (K, CacheValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Encodes records into cache dictionaries and reads them back.
#[derive(Debug, Clone, Default)]
pub struct CacheCodec {
    keys: CacheKeys,
}

impl CacheCodec {
    #[must_use]
    pub fn new(keys: CacheKeys) -> Self {
        Self { keys }
    }

    /// Like [`CacheCodec::new`], but rejects reserved keys that are empty or
    /// equal to each other.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::ReservedKeyCollision`] naming the bad key.
    pub fn try_new(keys: CacheKeys) -> MarshalResult<Self> {
        if let Some(key) = keys.collision() {
            return Err(MarshalError::ReservedKeyCollision {
                record: "CacheKeys",
                key: key.to_string(),
            });
        }
        Ok(Self { keys })
    }

    /// Checks that no cached field of `T` shares a name with a reserved key.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::ReservedKeyCollision`] for the first clash.
    pub fn check<T: Marshal>(&self) -> MarshalResult<()> {
        match T::SCHEMA
            .fields
            .iter()
            .find(|d| d.role == FieldRole::Wire && self.keys.is_reserved(d.name))
        {
            Some(desc) => Err(MarshalError::ReservedKeyCollision {
                record: T::SCHEMA.record_type,
                key: desc.name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Returns the reserved keys this codec writes.
    #[must_use]
    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    /// Flattens a record, stamping it with the current time.
    #[must_use]
    pub fn encode<T: Marshal>(&self, record: &T) -> CacheDict {
        self.encode_at(record, Timestamp::now())
    }

    /// Flattens a record, stamping it with `now` under the normalization key.
    ///
    /// Any "last updated" value the record carries is ignored: write time is
    /// authoritative. A field whose name is a reserved key is not written; see
    /// [`CacheCodec::check`].
    #[must_use]
    pub fn encode_at<T: Marshal>(&self, record: &T, now: Timestamp) -> CacheDict {
        let fields = record.to_fields();
        let mut dict = CacheDict::new();

        for desc in T::SCHEMA.fields.iter().filter(|d| d.is_cacheable()) {
            let Some(value) = fields.get(desc.name) else {
                continue;
            };
            if desc.role == FieldRole::Wire && self.keys.is_reserved(desc.name) {
                warn!(
                    "{}: field `{}` shadows a reserved cache key, not caching it",
                    T::SCHEMA.record_type,
                    desc.name
                );
                continue;
            }
            match (desc.role, value) {
                (FieldRole::LastUpdated, _) => {}
                (FieldRole::Image, FieldValue::Blob(bytes)) => {
                    dict.insert(self.keys.image_key.clone(), CacheValue::Blob(bytes.clone()));
                }
                (FieldRole::Wire, FieldValue::Text(s)) => {
                    dict.insert(desc.name, CacheValue::Text(s.clone()));
                }
                (FieldRole::Wire, FieldValue::Integer(n)) => {
                    dict.insert(desc.name, CacheValue::Integer(*n));
                }
                (FieldRole::Wire, FieldValue::Bool(b)) => {
                    dict.insert(desc.name, CacheValue::Bool(*b));
                }
                (FieldRole::Wire, FieldValue::Timestamp(ts)) => {
                    dict.insert(desc.name, CacheValue::Text(ts.to_iso8601()));
                }
                (role, value) => warn!(
                    "{}: not caching `{}` ({:?}, {})",
                    T::SCHEMA.record_type,
                    desc.name,
                    role,
                    value.kind()
                ),
            }
        }

        dict.insert(
            self.keys.normalized_at_key.clone(),
            CacheValue::Text(now.to_iso8601()),
        );
        dict
    }

    /// Reads a record back. Never fails.
    ///
    /// A shape that rejects its zero-filled fields is replaced by its
    /// `Default`.
    #[must_use]
    pub fn decode<T: Marshal + Default>(&self, dict: &CacheDict) -> T {
        let mut fields = Fields::new();
        for desc in T::SCHEMA.fields {
            let key = match desc.role {
                FieldRole::Wire if self.keys.is_reserved(desc.name) => {
                    debug!(
                        "{}: field `{}` shadows a reserved cache key, reading zero value",
                        T::SCHEMA.record_type,
                        desc.name
                    );
                    if desc.required {
                        fields.insert(desc.name, zero_value(desc.field_type));
                    }
                    continue;
                }
                FieldRole::Wire => desc.name,
                FieldRole::Image => self.keys.image_key.as_str(),
                FieldRole::LastUpdated => self.keys.normalized_at_key.as_str(),
            };
            match self.decode_field(desc, key, dict.get(key)) {
                Some(value) => fields.insert(desc.name, value),
                None if desc.required => fields.insert(desc.name, zero_value(desc.field_type)),
                None => {}
            }
        }

        T::from_fields(fields).unwrap_or_else(|e| {
            warn!(
                "{}: cached fields rejected ({}), using defaults",
                T::SCHEMA.record_type,
                e
            );
            T::default()
        })
    }

    /// Imports a dictionary from a loosely typed JSON object.
    ///
    /// The value under the image key is read as base64 when it is text.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::UnsupportedCacheValueType`] for arrays,
    /// objects, floats and nulls, or when `raw` itself is not an object.
    pub fn import_json(&self, raw: &Value) -> MarshalResult<CacheDict> {
        let Value::Object(map) = raw else {
            return Err(MarshalError::UnsupportedCacheValueType {
                key: String::new(),
                found: json_kind(raw),
            });
        };

        let mut dict = CacheDict::new();
        for (key, value) in map {
            let cached = match value {
                Value::String(s) if *key == self.keys.image_key => match STANDARD.decode(s) {
                    Ok(bytes) => CacheValue::Blob(bytes),
                    Err(_) => CacheValue::Text(s.clone()),
                },
                Value::String(s) => CacheValue::Text(s.clone()),
                Value::Bool(b) => CacheValue::Bool(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => CacheValue::Integer(i),
                    None => {
                        return Err(MarshalError::UnsupportedCacheValueType {
                            key: key.clone(),
                            found: json_kind(value),
                        });
                    }
                },
                Value::Null | Value::Array(_) | Value::Object(_) => {
                    return Err(MarshalError::UnsupportedCacheValueType {
                        key: key.clone(),
                        found: json_kind(value),
                    });
                }
            };
            dict.insert(key.clone(), cached);
        }
        Ok(dict)
    }

    /// Exports a dictionary as a JSON object, blobs as base64 text.
    #[must_use]
    pub fn export_json(&self, dict: &CacheDict) -> Value {
        let map: Map<String, Value> = dict
            .iter()
            .map(|(key, value)| {
                let json = match value {
                    CacheValue::Text(s) => Value::String(s.clone()),
                    CacheValue::Integer(n) => Value::from(*n),
                    CacheValue::Bool(b) => Value::Bool(*b),
                    CacheValue::Blob(bytes) => Value::String(STANDARD.encode(bytes)),
                };
                (key.to_string(), json)
            })
            .collect();
        Value::Object(map)
    }

    fn decode_field(
        &self,
        desc: &FieldDescriptor,
        key: &str,
        stored: Option<&CacheValue>,
    ) -> Option<FieldValue> {
        let Some(stored) = stored else {
            debug!("Cache key `{}` absent, defaulting `{}`", key, desc.name);
            return None;
        };

        let decoded = match (desc.field_type, stored) {
            (FieldType::Text, CacheValue::Text(s)) => Some(FieldValue::Text(s.clone())),
            (FieldType::Integer, CacheValue::Integer(n)) => Some(FieldValue::Integer(*n)),
            (FieldType::Bool, CacheValue::Bool(b)) => Some(FieldValue::Bool(*b)),
            (FieldType::Blob, CacheValue::Blob(bytes)) => Some(FieldValue::Blob(bytes.clone())),
            (FieldType::Blob, _) => None,
            (FieldType::Record(_) | FieldType::List(_) | FieldType::Tree, _) => None,
            (
                field_type @ (FieldType::Text
                | FieldType::Integer
                | FieldType::Bool
                | FieldType::Timestamp),
                other,
            ) => other.describe().and_then(|text| reparse(field_type, &text)),
        };

        if decoded.is_none() {
            debug!(
                "Cache key `{}` holds {} that does not coerce to {}, defaulting",
                key,
                stored.kind(),
                desc.field_type.expected()
            );
        }
        decoded
    }
}

/// Re-parses described text as the expected scalar type.
fn reparse(field_type: FieldType, text: &str) -> Option<FieldValue> {
    match field_type {
        FieldType::Text => Some(FieldValue::Text(text.to_string())),
        FieldType::Integer => text.trim().parse().ok().map(FieldValue::Integer),
        FieldType::Bool => text.trim().parse().ok().map(FieldValue::Bool),
        FieldType::Timestamp => Timestamp::parse(text)
            .ok()
            .or_else(|| {
                text.trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(|millis| Timestamp::from_epoch_millis(millis).ok())
            })
            .map(FieldValue::Timestamp),
        FieldType::Blob | FieldType::Record(_) | FieldType::List(_) | FieldType::Tree => None,
    }
}

/// The value a required field takes when the cache cannot supply it.
fn zero_value(field_type: FieldType) -> FieldValue {
    match field_type {
        FieldType::Text => FieldValue::Text(String::new()),
        FieldType::Integer => FieldValue::Integer(0),
        FieldType::Bool => FieldValue::Bool(false),
        FieldType::Timestamp => FieldValue::Timestamp(Timestamp::unix_epoch()),
        FieldType::Blob => FieldValue::Blob(Vec::new()),
        FieldType::Record(_) => FieldValue::Record(Fields::new()),
        FieldType::List(_) => FieldValue::List(Vec::new()),
        FieldType::Tree => FieldValue::Tree(Value::Object(Map::new())),
    }
}
