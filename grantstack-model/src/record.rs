use crate::{Fields, MarshalResult, RecordSchema};

/// Implemented by every record shape.
///
/// A shape declares its [`RecordSchema`] and moves between itself and the
/// validated [`Fields`] form. Everything else (type checking, defaults,
/// timestamp and blob encoding, cache coercion) lives in the codecs, so the
/// same schema drives both [`WireCodec`](crate::WireCodec) and
/// [`CacheCodec`](crate::CacheCodec).
pub trait Marshal: Sized {
    /// The field table both codecs walk.
    const SCHEMA: &'static RecordSchema;

    /// Builds the record from validated fields.
    ///
    /// Only shapes that interpret [`FieldValue::Tree`](crate::FieldValue::Tree)
    /// payloads can fail here; flat shapes always succeed.
    fn from_fields(fields: Fields) -> MarshalResult<Self>;

    /// Flattens the record into fields. Optional fields that are `None` are
    /// left out.
    fn to_fields(&self) -> Fields;
}
