use crate::bundle::GrantTree;
use crate::resolver::resolve;
use grantstack_model::{FieldDescriptor, Fields, Marshal, MarshalResult, RecordSchema};
use grantstack_types::Timestamp;

/// One version of the terms a data debit grants.
///
/// The window is `[start, end)`; an absent bound is unbounded. `active` is
/// asserted by the server, `accepted` by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Permission {
    pub date_created: Timestamp,
    pub purpose: Option<String>,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub cancel_at_period_end: bool,
    pub terms_url: Option<String>,
    /// Renewal duration; 0 means the permission does not recur.
    pub period: i64,
    pub active: bool,
    pub accepted: bool,
    pub bundle: GrantTree,
    pub conditions: Option<GrantTree>,
}

const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::timestamp("dateCreated"),
    FieldDescriptor::text("purpose").optional(),
    FieldDescriptor::timestamp("start").optional(),
    FieldDescriptor::timestamp("end").optional(),
    FieldDescriptor::bool("cancelAtPeriodEnd"),
    FieldDescriptor::text("termsUrl").optional(),
    FieldDescriptor::integer("period"),
    FieldDescriptor::bool("active"),
    FieldDescriptor::bool("accepted"),
    FieldDescriptor::tree("bundle"),
    FieldDescriptor::tree("conditions").optional(),
];

pub(crate) const PERMISSION_SCHEMA: RecordSchema = RecordSchema {
    record_type: "Permission",
    fields: FIELDS,
};

impl Permission {
    /// Returns true if `at` falls within `[start, end)`.
    #[must_use]
    pub fn covers(&self, at: Timestamp) -> bool {
        self.start.is_none_or(|start| start <= at) && self.end.is_none_or(|end| at < end)
    }

    /// Returns true once a permission set to cancel at period end has reached
    /// its end, whatever its `active` flag says.
    #[must_use]
    pub fn is_cancelled_at(&self, at: Timestamp) -> bool {
        self.cancel_at_period_end && self.end.is_some_and(|end| at >= end)
    }

    /// Returns true if the permission can be the active one at `at`.
    #[must_use]
    pub fn is_candidate_at(&self, at: Timestamp) -> bool {
        self.accepted && self.active && self.covers(at) && !self.is_cancelled_at(at)
    }

    /// Returns true if the permission renews every `period`.
    #[must_use]
    pub fn is_recurring(&self) -> bool {
        self.period > 0
    }

    /// Resolves the bundle and conditions into one effective grant.
    ///
    /// # Errors
    ///
    /// Fails if the conditions name a child the bundle lacks.
    pub fn effective_grant(&self) -> MarshalResult<GrantTree> {
        resolve(&self.bundle, self.conditions.as_ref())
    }
}

impl Marshal for Permission {
    const SCHEMA: &'static RecordSchema = &PERMISSION_SCHEMA;

    fn from_fields(mut f: Fields) -> MarshalResult<Self> {
        let bundle = match f.take_tree("bundle") {
            Some(tree) => GrantTree::from_json(&tree).map_err(|e| e.within("bundle"))?,
            None => GrantTree::new(),
        };
        let conditions = f
            .take_tree("conditions")
            .map(|tree| GrantTree::from_json(&tree).map_err(|e| e.within("conditions")))
            .transpose()?;

        Ok(Self {
            date_created: f.take_timestamp("dateCreated"),
            purpose: f.take_opt_text("purpose"),
            start: f.take_opt_timestamp("start"),
            end: f.take_opt_timestamp("end"),
            cancel_at_period_end: f.take_bool("cancelAtPeriodEnd"),
            terms_url: f.take_opt_text("termsUrl"),
            period: f.take_integer("period"),
            active: f.take_bool("active"),
            accepted: f.take_bool("accepted"),
            bundle,
            conditions,
        })
    }

    fn to_fields(&self) -> Fields {
        Fields::new()
            .timestamp("dateCreated", self.date_created)
            .opt_text("purpose", self.purpose.as_deref())
            .opt_timestamp("start", self.start)
            .opt_timestamp("end", self.end)
            .bool("cancelAtPeriodEnd", self.cancel_at_period_end)
            .opt_text("termsUrl", self.terms_url.as_deref())
            .integer("period", self.period)
            .bool("active", self.active)
            .bool("accepted", self.accepted)
            .tree("bundle", self.bundle.to_json())
            .opt_tree("conditions", self.conditions.as_ref().map(GrantTree::to_json))
    }
}
