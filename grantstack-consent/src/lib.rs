//! Consent model for GrantStack.
//!
//! A [`DataDebit`] is a grant a user issues to a requesting client. Over its
//! lifetime it accumulates [`Permission`] versions; each carries a
//! [`GrantTree`] bundle of the data it covers and an optional condition tree
//! that narrows or overrides that bundle.
//!
//! This crate handles:
//! - Decoding and caching data debits and permissions through the
//!   `grantstack-model` codecs
//! - Resolving a bundle and its conditions into one effective grant
//!   ([`resolve`])
//! - Picking the active and the latest permission at an instant
//!   ([`evaluate`])
//!
//! Everything here is a pure function of its inputs. The evaluation instant is
//! always supplied by the caller.

mod bundle;
mod data_debit;
mod lifecycle;
mod permission;
mod resolver;

pub use bundle::{GrantTree, Node, NodeId, Requirement};
pub use data_debit::{DataDebit, DataDebitStatus};
pub use lifecycle::{PermissionState, evaluate};
pub use permission::Permission;
pub use resolver::resolve;
