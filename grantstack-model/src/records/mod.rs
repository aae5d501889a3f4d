//! Flat record shapes exchanged with the server and cached on device.
//!
//! Each shape is a plain value type with a `const`
//! [`RecordSchema`](crate::RecordSchema) and a [`Marshal`](crate::Marshal)
//! impl; the codecs do the rest.

mod notice;
mod plug;
mod profile;

pub use notice::Notice;
pub use plug::DataPlug;
pub use profile::ProfileField;
