//! Core type definitions for GrantStack.
//!
//! This crate defines the shape-agnostic primitives every other crate in the
//! workspace builds on:
//! - [`Timestamp`], the UTC instant type used by wire and cache records
//! - Opaque record identifiers ([`DataDebitKey`], [`ApplicationId`])
//!
//! Record shapes and codecs live in `grantstack-model`; the consent lifecycle
//! lives in `grantstack-consent`.

mod ids;
mod timestamp;

pub use ids::{ApplicationId, DataDebitKey};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("timestamp requires a UTC 'Z' suffix: {0}")]
    NonUtcTimestamp(String),

    #[error("epoch milliseconds out of range: {0}")]
    EpochOutOfRange(i64),
}
