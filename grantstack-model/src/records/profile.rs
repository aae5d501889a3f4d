use crate::{FieldDescriptor, Fields, Marshal, MarshalResult, RecordSchema};
use grantstack_types::Timestamp;

/// One field of the user's public profile and whether it is shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileField {
    pub name: String,
    pub value: String,
    pub shared: bool,
    pub date_updated: Option<Timestamp>,
}

const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::text("name"),
    FieldDescriptor::text("value"),
    FieldDescriptor::bool("shared"),
    FieldDescriptor::timestamp("dateUpdated").optional(),
];

const PROFILE_FIELD_SCHEMA: RecordSchema = RecordSchema {
    record_type: "ProfileField",
    fields: FIELDS,
};

impl Marshal for ProfileField {
    const SCHEMA: &'static RecordSchema = &PROFILE_FIELD_SCHEMA;

    fn from_fields(mut f: Fields) -> MarshalResult<Self> {
        Ok(Self {
            name: f.take_text("name"),
            value: f.take_text("value"),
            shared: f.take_bool("shared"),
            date_updated: f.take_opt_timestamp("dateUpdated"),
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .text("name", &self.name)
            .text("value", &self.value)
            .bool("shared", self.shared)
            .opt_timestamp("dateUpdated", self.date_updated)
    }
}
