use crate::bundle::GrantTree;
use crate::lifecycle::{PermissionState, evaluate, latest};
use crate::permission::{PERMISSION_SCHEMA, Permission};
use grantstack_model::{FieldDescriptor, Fields, Marshal, MarshalResult, RecordSchema};
use grantstack_types::{ApplicationId, DataDebitKey, Timestamp};
use serde::{Deserialize, Serialize};

/// A grant issued by the user to a requesting client.
///
/// `permissions` keeps the server's order; the active and latest permission
/// are derived on demand and never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataDebit {
    pub data_debit_key: DataDebitKey,
    pub date_created: Timestamp,
    pub permissions: Vec<Permission>,
    pub request_client_name: String,
    pub request_client_url: String,
    pub request_client_logo_url: String,
    pub request_description: Option<String>,
    pub request_application_id: Option<ApplicationId>,
    pub active: bool,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

/// Overall state of a data debit at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataDebitStatus {
    /// Enabled, inside its window, with an active permission.
    Active,
    /// The latest permission awaits the user's acceptance.
    Pending,
    /// The debit's or its latest permission's window has closed.
    Expired,
    /// None of the above.
    Inactive,
}

impl DataDebitStatus {
    /// Returns true if the client may currently read the granted data.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Active)
    }
}

const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::text("dataDebitKey"),
    FieldDescriptor::timestamp("dateCreated"),
    FieldDescriptor::list("permissions", &PERMISSION_SCHEMA),
    FieldDescriptor::text("requestClientName"),
    FieldDescriptor::text("requestClientUrl"),
    FieldDescriptor::text("requestClientLogoUrl"),
    FieldDescriptor::text("requestDescription").optional(),
    FieldDescriptor::text("requestApplicationId").optional(),
    FieldDescriptor::bool("active"),
    FieldDescriptor::timestamp("start").optional(),
    FieldDescriptor::timestamp("end").optional(),
];

const DATA_DEBIT_SCHEMA: RecordSchema = RecordSchema {
    record_type: "DataDebit",
    fields: FIELDS,
};

impl DataDebit {
    /// Evaluates the permission versions at `at`.
    #[must_use]
    pub fn evaluate(&self, at: Timestamp) -> PermissionState {
        evaluate(&self.permissions, at)
    }

    /// The permission in force at `at`, if any.
    #[must_use]
    pub fn permissions_active(&self, at: Timestamp) -> Option<&Permission> {
        self.evaluate(at).active.map(|i| &self.permissions[i])
    }

    /// The most recently created permission; `None` only when there are none.
    #[must_use]
    pub fn permissions_latest(&self) -> Option<&Permission> {
        latest(&self.permissions).map(|i| &self.permissions[i])
    }

    /// Returns true if `at` falls within the debit's own `[start, end)` window.
    #[must_use]
    pub fn covers(&self, at: Timestamp) -> bool {
        self.start.is_none_or(|start| start <= at) && self.end.is_none_or(|end| at < end)
    }

    /// Folds the debit's flags, window and permissions into one status.
    #[must_use]
    pub fn status(&self, at: Timestamp) -> DataDebitStatus {
        let state = self.evaluate(at);
        if self.active && self.covers(at) && state.active.is_some() {
            return DataDebitStatus::Active;
        }

        let newest = state.latest.map(|i| &self.permissions[i]);
        if newest.is_some_and(|p| !p.accepted) {
            return DataDebitStatus::Pending;
        }

        let closed = |end: Option<Timestamp>| end.is_some_and(|end| end <= at);
        if closed(self.end) || newest.is_some_and(|p| closed(p.end)) {
            DataDebitStatus::Expired
        } else {
            DataDebitStatus::Inactive
        }
    }

    /// The effective grant of the permission active at `at`.
    ///
    /// # Errors
    ///
    /// Fails if that permission's conditions are inconsistent with its bundle.
    pub fn effective_grant(&self, at: Timestamp) -> MarshalResult<Option<GrantTree>> {
        self.permissions_active(at)
            .map(Permission::effective_grant)
            .transpose()
    }
}

impl Marshal for DataDebit {
    const SCHEMA: &'static RecordSchema = &DATA_DEBIT_SCHEMA;

    fn from_fields(mut f: Fields) -> MarshalResult<Self> {
        let permissions = f
            .take_list("permissions")
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                Permission::from_fields(item).map_err(|e| e.within(&format!("permissions[{i}]")))
            })
            .collect::<MarshalResult<Vec<_>>>()?;

        Ok(Self {
            data_debit_key: DataDebitKey::new(f.take_text("dataDebitKey")),
            date_created: f.take_timestamp("dateCreated"),
            permissions,
            request_client_name: f.take_text("requestClientName"),
            request_client_url: f.take_text("requestClientUrl"),
            request_client_logo_url: f.take_text("requestClientLogoUrl"),
            request_description: f.take_opt_text("requestDescription"),
            request_application_id: f.take_opt_text("requestApplicationId").map(ApplicationId::new),
            active: f.take_bool("active"),
            start: f.take_opt_timestamp("start"),
            end: f.take_opt_timestamp("end"),
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .text("dataDebitKey", self.data_debit_key.as_str())
            .timestamp("dateCreated", self.date_created)
            .list(
                "permissions",
                self.permissions.iter().map(Permission::to_fields).collect(),
            )
            .text("requestClientName", &self.request_client_name)
            .text("requestClientUrl", &self.request_client_url)
            .text("requestClientLogoUrl", &self.request_client_logo_url)
            .opt_text("requestDescription", self.request_description.as_deref())
            .opt_text(
                "requestApplicationId",
                self.request_application_id.as_ref().map(ApplicationId::as_str),
            )
            .bool("active", self.active)
            .opt_timestamp("start", self.start)
            .opt_timestamp("end", self.end)
    }
}
