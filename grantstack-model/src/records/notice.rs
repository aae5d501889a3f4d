use crate::{FieldDescriptor, Fields, Marshal, MarshalResult, RecordSchema};
use grantstack_types::Timestamp;

/// A notification delivered to the user's inbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notice {
    pub notice_id: i64,
    pub message: String,
    pub date_created: Timestamp,
    pub read: bool,
    pub sender_name: Option<String>,
}

const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::integer("noticeId"),
    FieldDescriptor::text("message"),
    FieldDescriptor::timestamp("dateCreated"),
    FieldDescriptor::bool("read"),
    FieldDescriptor::text("senderName").optional(),
];

const NOTICE_SCHEMA: RecordSchema = RecordSchema {
    record_type: "Notice",
    fields: FIELDS,
};

impl Marshal for Notice {
    const SCHEMA: &'static RecordSchema = &NOTICE_SCHEMA;

    fn from_fields(mut f: Fields) -> MarshalResult<Self> {
        Ok(Self {
            notice_id: f.take_integer("noticeId"),
            message: f.take_text("message"),
            date_created: f.take_timestamp("dateCreated"),
            read: f.take_bool("read"),
            sender_name: f.take_opt_text("senderName"),
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .integer("noticeId", self.notice_id)
            .text("message", &self.message)
            .timestamp("dateCreated", self.date_created)
            .bool("read", self.read)
            .opt_text("senderName", self.sender_name.as_deref())
    }
}
