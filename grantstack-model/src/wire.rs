//! Strict schema-driven codec for network payloads.
//!
//! Decoding is all-or-nothing per record: the first missing or mistyped field
//! fails the record with an error naming its path. Collections are decoded
//! item by item so one bad item never hides the rest.

use crate::config::WireConfig;
use crate::error::json_kind;
use crate::{
    FieldDescriptor, FieldType, FieldValue, Fields, Marshal, MarshalError, MarshalResult,
    RecordSchema,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use grantstack_types::Timestamp;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Result of decoding a JSON array of records.
#[derive(Debug)]
pub struct BatchDecode<T> {
    /// Records that decoded, in input order.
    pub records: Vec<T>,
    /// Items that failed, with their position in the input array.
    pub failures: Vec<ItemFailure>,
}

impl<T> BatchDecode<T> {
    /// Returns true when every item decoded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A list item that failed to decode.
#[derive(Debug)]
pub struct ItemFailure {
    pub index: usize,
    pub error: MarshalError,
}

/// Decodes and encodes records in their wire JSON form.
#[derive(Debug, Clone, Default)]
pub struct WireCodec {
    config: WireConfig,
}

impl WireCodec {
    #[must_use]
    pub fn new(config: WireConfig) -> Self {
        Self { config }
    }

    /// Decodes one record.
    ///
    /// # Errors
    ///
    /// Returns the first field-level failure; no partial record is produced.
    pub fn decode<T: Marshal>(&self, raw: &Value) -> MarshalResult<T> {
        let fields = self.decode_fields(T::SCHEMA, raw)?;
        T::from_fields(fields)
    }

    /// Parses raw JSON text and decodes one record.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::Serialization`] if the text is not JSON, or any
    /// decode failure.
    pub fn decode_str<T: Marshal>(&self, raw: &str) -> MarshalResult<T> {
        let value: Value = serde_json::from_str(raw)?;
        self.decode(&value)
    }

    /// Decodes a JSON array, keeping every item that decodes.
    ///
    /// # Errors
    ///
    /// Fails only if `raw` is not an array.
    pub fn decode_list<T: Marshal>(&self, raw: &Value) -> MarshalResult<BatchDecode<T>> {
        let Value::Array(items) = raw else {
            return Err(MarshalError::TypeMismatch {
                record: T::SCHEMA.record_type,
                field: String::new(),
                expected: "array",
                found: json_kind(raw),
            });
        };

        let mut batch = BatchDecode {
            records: Vec::with_capacity(items.len()),
            failures: Vec::new(),
        };
        for (index, item) in items.iter().enumerate() {
            match self.decode::<T>(item) {
                Ok(record) => batch.records.push(record),
                Err(error) => {
                    warn!(
                        "Dropping {} at index {}: {}",
                        T::SCHEMA.record_type,
                        index,
                        error
                    );
                    batch.failures.push(ItemFailure { index, error });
                }
            }
        }
        Ok(batch)
    }

    /// Encodes a record to its wire JSON form.
    #[must_use]
    pub fn encode<T: Marshal>(&self, record: &T) -> Value {
        encode_fields(T::SCHEMA, &record.to_fields())
    }

    /// Encodes a record to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::Serialization`] if serde_json rejects the value.
    pub fn encode_string<T: Marshal>(&self, record: &T) -> MarshalResult<String> {
        Ok(serde_json::to_string(&self.encode(record))?)
    }

    fn decode_fields(&self, schema: &'static RecordSchema, raw: &Value) -> MarshalResult<Fields> {
        let Value::Object(map) = raw else {
            return Err(MarshalError::TypeMismatch {
                record: schema.record_type,
                field: String::new(),
                expected: "object",
                found: json_kind(raw),
            });
        };

        let mut fields = Fields::new();
        for desc in schema.wire_fields() {
            match map.get(desc.name) {
                None | Some(Value::Null) if desc.required => {
                    return Err(MarshalError::MissingRequiredField {
                        record: schema.record_type,
                        field: desc.name.to_string(),
                    });
                }
                None | Some(Value::Null) => {}
                Some(value) => {
                    let decoded = self.decode_value(schema, desc, value)?;
                    fields.insert(desc.name, decoded);
                }
            }
        }
        Ok(fields)
    }

    fn decode_value(
        &self,
        schema: &'static RecordSchema,
        desc: &FieldDescriptor,
        value: &Value,
    ) -> MarshalResult<FieldValue> {
        let mismatch = || MarshalError::TypeMismatch {
            record: schema.record_type,
            field: desc.name.to_string(),
            expected: desc.field_type.expected(),
            found: json_kind(value),
        };

        match (desc.field_type, value) {
            (FieldType::Text, Value::String(s)) => Ok(FieldValue::Text(s.clone())),
            (FieldType::Integer, Value::Number(n)) => {
                n.as_i64().map(FieldValue::Integer).ok_or_else(mismatch)
            }
            (FieldType::Bool, Value::Bool(b)) => Ok(FieldValue::Bool(*b)),
            (FieldType::Timestamp, Value::String(s)) => self
                .parse_timestamp(s)
                .map(FieldValue::Timestamp)
                .ok_or_else(|| MarshalError::MalformedTimestamp {
                    record: schema.record_type,
                    field: desc.name.to_string(),
                    value: s.clone(),
                }),
            (FieldType::Blob, Value::String(s)) => STANDARD
                .decode(s)
                .map(FieldValue::Blob)
                .map_err(|_| mismatch()),
            (FieldType::Record(nested), Value::Object(_)) => self
                .decode_fields(nested, value)
                .map(FieldValue::Record)
                .map_err(|e| e.within(desc.name)),
            (FieldType::List(nested), Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    self.decode_fields(nested, item)
                        .map_err(|e| e.within(&format!("{}[{}]", desc.name, i)))
                })
                .collect::<MarshalResult<Vec<_>>>()
                .map(FieldValue::List),
            (FieldType::Tree, Value::Object(_)) => Ok(FieldValue::Tree(value.clone())),
            (
                FieldType::Text
                | FieldType::Integer
                | FieldType::Bool
                | FieldType::Timestamp
                | FieldType::Blob
                | FieldType::Record(_)
                | FieldType::List(_)
                | FieldType::Tree,
                _,
            ) => Err(mismatch()),
        }
    }

    fn parse_timestamp(&self, text: &str) -> Option<Timestamp> {
        let parsed = if self.config.require_utc {
            Timestamp::parse_utc(text)
        } else {
            Timestamp::parse(text)
        };
        parsed
            .inspect_err(|e| debug!("Rejecting wire timestamp: {}", e))
            .ok()
    }
}

fn encode_fields(schema: &'static RecordSchema, fields: &Fields) -> Value {
    let mut map = Map::new();
    for desc in schema.wire_fields() {
        let Some(value) = fields.get(desc.name) else {
            continue;
        };
        match encode_value(desc.field_type, value) {
            Some(encoded) => {
                map.insert(desc.name.to_string(), encoded);
            }
            None => warn!(
                "{}: field `{}` declared {} but shape produced {}",
                schema.record_type,
                desc.name,
                desc.field_type.expected(),
                value.kind()
            ),
        }
    }
    Value::Object(map)
}

fn encode_value(field_type: FieldType, value: &FieldValue) -> Option<Value> {
    match (field_type, value) {
        (FieldType::Text, FieldValue::Text(s)) => Some(Value::String(s.clone())),
        (FieldType::Integer, FieldValue::Integer(n)) => Some(Value::from(*n)),
        (FieldType::Bool, FieldValue::Bool(b)) => Some(Value::Bool(*b)),
        (FieldType::Timestamp, FieldValue::Timestamp(ts)) => Some(Value::String(ts.to_iso8601())),
        (FieldType::Blob, FieldValue::Blob(bytes)) => Some(Value::String(STANDARD.encode(bytes))),
        (FieldType::Record(nested), FieldValue::Record(fields)) => {
            Some(encode_fields(nested, fields))
        }
        (FieldType::List(nested), FieldValue::List(items)) => Some(Value::Array(
            items.iter().map(|item| encode_fields(nested, item)).collect(),
        )),
        (FieldType::Tree, FieldValue::Tree(tree)) => Some(tree.clone()),
        _ => None,
    }
}
