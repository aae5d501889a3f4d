/// Declares a record shape: its name and the fields both codecs walk.
///
/// Schemas are `const` tables so shape declarations stay declarative and the
/// marshalling logic lives only in the codecs.
#[derive(Debug, Clone, Copy)]
pub struct RecordSchema {
    pub record_type: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl RecordSchema {
    /// Fields exchanged with the server.
    pub fn wire_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.role == FieldRole::Wire)
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One field of a record shape.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Key used on the wire and in the cache dictionary.
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub role: FieldRole,
}

impl FieldDescriptor {
    const fn simple(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
            role: FieldRole::Wire,
        }
    }

    /// Shorthand for a required text field.
    pub const fn text(name: &'static str) -> Self {
        Self::simple(name, FieldType::Text)
    }

    /// Shorthand for a required integer field.
    pub const fn integer(name: &'static str) -> Self {
        Self::simple(name, FieldType::Integer)
    }

    /// Shorthand for a required boolean field.
    pub const fn bool(name: &'static str) -> Self {
        Self::simple(name, FieldType::Bool)
    }

    /// Shorthand for a required ISO-8601 timestamp field.
    pub const fn timestamp(name: &'static str) -> Self {
        Self::simple(name, FieldType::Timestamp)
    }

    /// Shorthand for a nested record field.
    pub const fn record(name: &'static str, schema: &'static RecordSchema) -> Self {
        Self::simple(name, FieldType::Record(schema))
    }

    /// Shorthand for an array-of-records field.
    pub const fn list(name: &'static str, schema: &'static RecordSchema) -> Self {
        Self::simple(name, FieldType::List(schema))
    }

    /// Shorthand for a recursive name → (leaf | mapping) tree field.
    pub const fn tree(name: &'static str) -> Self {
        Self::simple(name, FieldType::Tree)
    }

    /// Shorthand for a downloaded image, kept only in the cache.
    pub const fn image(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::Blob,
            required: false,
            role: FieldRole::Image,
        }
    }

    /// Shorthand for a "last updated" stamp, written by the cache codec.
    pub const fn last_updated(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::Timestamp,
            required: false,
            role: FieldRole::LastUpdated,
        }
    }

    /// Marks the field optional: absence decodes to `None`, never a placeholder.
    pub const fn optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }

    /// Returns true if the cache dictionary can hold this field.
    pub const fn is_cacheable(&self) -> bool {
        matches!(
            (self.field_type, self.role),
            (
                FieldType::Text | FieldType::Integer | FieldType::Bool | FieldType::Timestamp,
                FieldRole::Wire
            ) | (FieldType::Blob, FieldRole::Image)
                | (FieldType::Timestamp, FieldRole::LastUpdated)
        )
    }
}

/// The declared type of a field.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    Text,
    Integer,
    Bool,
    Timestamp,
    Blob,
    Record(&'static RecordSchema),
    List(&'static RecordSchema),
    Tree,
}

impl FieldType {
    /// Human-readable name used in type mismatch errors.
    pub const fn expected(&self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Integer => "integer",
            Self::Bool => "boolean",
            Self::Timestamp => "ISO-8601 string",
            Self::Blob => "base64 string",
            Self::Record(_) => "object",
            Self::List(_) => "array",
            Self::Tree => "object",
        }
    }
}

/// Where a field lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Exchanged on the wire and cached under its own name.
    Wire,
    /// Binary payload stored under the reserved image key; never on the wire.
    Image,
    /// Fed from the reserved normalization key; never on the wire.
    LastUpdated,
}
