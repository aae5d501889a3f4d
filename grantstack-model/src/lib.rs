//! Record model and codecs for GrantStack.
//!
//! Every record crosses three representations: wire JSON, a flat primitive
//! cache dictionary, and a typed Rust value. This crate owns the machinery
//! shared by all record shapes:
//! - [`RecordSchema`]: a declarative per-shape table of [`FieldDescriptor`]s
//! - [`Fields`] / [`FieldValue`]: the validated, typed intermediate form
//! - [`Marshal`]: implemented by each shape to move to and from [`Fields`]
//! - [`WireCodec`]: strict, all-or-nothing decode of network payloads
//! - [`CacheCodec`]: tolerant, total decode of on-device cache dictionaries
//! - [`CodecConfig`]: reserved cache keys and timestamp strictness
//!
//! The flat record shapes (plugs, notices, profile fields) live in
//! [`records`]; consent records live in `grantstack-consent`.

mod cache;
mod config;
mod error;
mod fields;
mod record;
pub mod records;
mod schema;
mod wire;

pub use cache::{CacheCodec, CacheDict, CacheValue};
pub use config::{CacheKeys, CodecConfig, WireConfig};
pub use error::{MarshalError, MarshalResult, json_kind};
pub use fields::{FieldValue, Fields};
pub use record::Marshal;
pub use schema::{FieldDescriptor, FieldRole, FieldType, RecordSchema};
pub use wire::{BatchDecode, ItemFailure, WireCodec};
