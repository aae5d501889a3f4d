use crate::{FieldDescriptor, Fields, Marshal, MarshalResult, RecordSchema};
use grantstack_types::Timestamp;

/// Describes a data plug: an integration that feeds records into the user's store.
///
/// The logo is downloaded separately and only ever lives in the cache, as is
/// the time the cache entry was last written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataPlug {
    pub plug_id: String,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub approved: bool,
    pub rating: i64,
    pub image: Option<Vec<u8>>,
    pub last_updated: Option<Timestamp>,
}

const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::text("plugId"),
    FieldDescriptor::text("name"),
    FieldDescriptor::text("url"),
    FieldDescriptor::text("description").optional(),
    FieldDescriptor::text("category").optional(),
    FieldDescriptor::bool("approved"),
    FieldDescriptor::integer("rating"),
    FieldDescriptor::image("image"),
    FieldDescriptor::last_updated("lastUpdated"),
];

const DATA_PLUG_SCHEMA: RecordSchema = RecordSchema {
    record_type: "DataPlug",
    fields: FIELDS,
};

impl Marshal for DataPlug {
    const SCHEMA: &'static RecordSchema = &DATA_PLUG_SCHEMA;

    fn from_fields(mut f: Fields) -> MarshalResult<Self> {
        Ok(Self {
            plug_id: f.take_text("plugId"),
            name: f.take_text("name"),
            url: f.take_text("url"),
            description: f.take_opt_text("description"),
            category: f.take_opt_text("category"),
            approved: f.take_bool("approved"),
            rating: f.take_integer("rating"),
            image: f.take_opt_blob("image"),
            last_updated: f.take_opt_timestamp("lastUpdated"),
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .text("plugId", &self.plug_id)
            .text("name", &self.name)
            .text("url", &self.url)
            .opt_text("description", self.description.as_deref())
            .opt_text("category", self.category.as_deref())
            .bool("approved", self.approved)
            .integer("rating", self.rating)
            .opt_blob("image", self.image.clone())
            .opt_timestamp("lastUpdated", self.last_updated)
    }
}
