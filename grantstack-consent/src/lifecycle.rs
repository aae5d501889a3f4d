//! Picks the active and the latest permission of a data debit.
//!
//! - latest: the maximum `date_created`
//! - active: among permissions that are accepted, flagged active, cover the
//!   evaluation instant and are not cancelled at period end, the maximum
//!   `date_created`
//!
//! Ties go to the permission that appears later in the list.

use crate::permission::Permission;
use grantstack_types::Timestamp;
use tracing::debug;

/// Positions of the derived permissions within the evaluated list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionState {
    pub active: Option<usize>,
    pub latest: Option<usize>,
}

impl PermissionState {
    /// Returns true if the latest permission is also the active one.
    #[must_use]
    pub fn latest_is_active(&self) -> bool {
        self.latest.is_some() && self.active == self.latest
    }
}

/// Evaluates `permissions` at instant `at`.
///
/// Pure: the result depends only on the inputs and is never cached.
#[must_use]
pub fn evaluate(permissions: &[Permission], at: Timestamp) -> PermissionState {
    let latest = latest(permissions);
    let active = permissions
        .iter()
        .enumerate()
        .filter(|(i, p)| {
            if p.active && p.is_cancelled_at(at) {
                debug!("Permission {} cancelled at period end, ignoring active flag", i);
            }
            p.is_candidate_at(at)
        })
        .max_by_key(|(_, p)| p.date_created)
        .map(|(i, _)| i);

    PermissionState { active, latest }
}

/// Position of the most recently created permission.
pub(crate) fn latest(permissions: &[Permission]) -> Option<usize> {
    // `max_by_key` keeps the last of equal maxima.
    permissions
        .iter()
        .enumerate()
        .max_by_key(|(_, p)| p.date_created)
        .map(|(i, _)| i)
}
