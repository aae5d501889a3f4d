//! The typed intermediate form shared by both codecs.
//!
//! Codecs validate raw input against a [`RecordSchema`](crate::RecordSchema)
//! and hand shapes a [`Fields`] map whose values already carry their declared
//! types. Shapes then take what they need by name.

use grantstack_types::Timestamp;
use std::collections::BTreeMap;

/// A validated field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    Timestamp(Timestamp),
    Blob(Vec<u8>),
    Record(Fields),
    List(Vec<Fields>),
    /// A recursive name → (leaf | mapping) JSON object, interpreted by the shape.
    Tree(serde_json::Value),
}

impl FieldValue {
    /// Short name of the variant, for logs and errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Bool(_) => "boolean",
            Self::Timestamp(_) => "timestamp",
            Self::Blob(_) => "blob",
            Self::Record(_) => "record",
            Self::List(_) => "list",
            Self::Tree(_) => "tree",
        }
    }
}

/// Field name → value map for one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(BTreeMap<&'static str, FieldValue>);

impl Fields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: FieldValue) {
        self.0.insert(name, value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    // ── Builders used by `Marshal::to_fields` ────────────────────

    #[must_use]
    pub fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.insert(name, FieldValue::Text(value.into()));
        self
    }

    #[must_use]
    pub fn opt_text(mut self, name: &'static str, value: Option<impl Into<String>>) -> Self {
        if let Some(value) = value {
            self.insert(name, FieldValue::Text(value.into()));
        }
        self
    }

    #[must_use]
    pub fn integer(mut self, name: &'static str, value: i64) -> Self {
        self.insert(name, FieldValue::Integer(value));
        self
    }

    #[must_use]
    pub fn bool(mut self, name: &'static str, value: bool) -> Self {
        self.insert(name, FieldValue::Bool(value));
        self
    }

    #[must_use]
    pub fn timestamp(mut self, name: &'static str, value: Timestamp) -> Self {
        self.insert(name, FieldValue::Timestamp(value));
        self
    }

    #[must_use]
    pub fn opt_timestamp(mut self, name: &'static str, value: Option<Timestamp>) -> Self {
        if let Some(value) = value {
            self.insert(name, FieldValue::Timestamp(value));
        }
        self
    }

    #[must_use]
    pub fn opt_blob(mut self, name: &'static str, value: Option<Vec<u8>>) -> Self {
        if let Some(value) = value {
            self.insert(name, FieldValue::Blob(value));
        }
        self
    }

    #[must_use]
    pub fn list(mut self, name: &'static str, items: Vec<Fields>) -> Self {
        self.insert(name, FieldValue::List(items));
        self
    }

    #[must_use]
    pub fn tree(mut self, name: &'static str, value: serde_json::Value) -> Self {
        self.insert(name, FieldValue::Tree(value));
        self
    }

    #[must_use]
    pub fn opt_tree(mut self, name: &'static str, value: Option<serde_json::Value>) -> Self {
        if let Some(value) = value {
            self.insert(name, FieldValue::Tree(value));
        }
        self
    }

    // ── Accessors used by `Marshal::from_fields` ─────────────────
    //
    // Required accessors return the zero value when the field is absent.
    // Codecs only hand shapes maps where required fields are present, so the
    // zero only surfaces for hand-built maps.

    pub fn take_text(&mut self, name: &str) -> String {
        self.take_opt_text(name).unwrap_or_default()
    }

    pub fn take_opt_text(&mut self, name: &str) -> Option<String> {
        match self.0.remove(name) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn take_integer(&mut self, name: &str) -> i64 {
        match self.0.remove(name) {
            Some(FieldValue::Integer(n)) => n,
            _ => 0,
        }
    }

    pub fn take_bool(&mut self, name: &str) -> bool {
        matches!(self.0.remove(name), Some(FieldValue::Bool(true)))
    }

    pub fn take_timestamp(&mut self, name: &str) -> Timestamp {
        self.take_opt_timestamp(name).unwrap_or_default()
    }

    pub fn take_opt_timestamp(&mut self, name: &str) -> Option<Timestamp> {
        match self.0.remove(name) {
            Some(FieldValue::Timestamp(ts)) => Some(ts),
            _ => None,
        }
    }

    pub fn take_opt_blob(&mut self, name: &str) -> Option<Vec<u8>> {
        match self.0.remove(name) {
            Some(FieldValue::Blob(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn take_record(&mut self, name: &str) -> Fields {
        match self.0.remove(name) {
            Some(FieldValue::Record(fields)) => fields,
            _ => Fields::new(),
        }
    }

    pub fn take_list(&mut self, name: &str) -> Vec<Fields> {
        match self.0.remove(name) {
            Some(FieldValue::List(items)) => items,
            _ => Vec::new(),
        }
    }

    pub fn take_tree(&mut self, name: &str) -> Option<serde_json::Value> {
        match self.0.remove(name) {
            Some(FieldValue::Tree(value)) => Some(value),
            _ => None,
        }
    }
}

impl FromIterator<(&'static str, FieldValue)> for Fields {
    fn from_iter<I: IntoIterator<Item = (&'static str, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
