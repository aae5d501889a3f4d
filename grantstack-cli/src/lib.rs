//! Reports behind the `grantstack` command.
//!
//! Kept apart from `main.rs` so they can be driven from tests without a
//! process or a config file.

use anyhow::{Context, Result};
use clap::ValueEnum;
use grantstack_consent::{DataDebit, DataDebitStatus, Permission};
use grantstack_model::records::{DataPlug, Notice, ProfileField};
use grantstack_model::{CacheCodec, CodecConfig, Marshal, WireCodec};
use grantstack_types::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// What `grantstack inspect` prints for a data debit.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InspectReport {
    pub data_debit_key: String,
    pub at: Timestamp,
    pub status: DataDebitStatus,
    pub permission_count: usize,
    pub active_permission: Option<usize>,
    pub latest_permission: Option<usize>,
    pub endpoints: Vec<String>,
    pub effective_grant: Option<Value>,
}

/// Reports for an `inspect` input, shaped like the input.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Inspection {
    /// The input was a single data debit object.
    Single(InspectReport),
    /// The input was an array; undecodable or unresolvable items are left out.
    Batch(Vec<InspectReport>),
}

impl Inspection {
    /// The reports, whichever way the input was shaped.
    #[must_use]
    pub fn reports(&self) -> &[InspectReport] {
        match self {
            Self::Single(report) => std::slice::from_ref(report),
            Self::Batch(reports) => reports,
        }
    }
}

/// Record shapes the `cache` command accepts.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Debit,
    Permission,
    Plug,
    Notice,
    Profile,
}

/// Decodes a data debit payload and evaluates it at `at`.
pub fn inspect(raw: &str, at: Timestamp, config: &CodecConfig) -> Result<InspectReport> {
    let wire = WireCodec::new(config.wire.clone());
    let debit: DataDebit = wire.decode_str(raw).context("Failed to decode data debit")?;
    report(&debit, at)
}

/// Like [`inspect`], but also accepts a JSON array of data debits.
///
/// Array items that fail to decode or whose grant cannot be resolved are
/// logged and skipped.
pub fn inspect_all(raw: &str, at: Timestamp, config: &CodecConfig) -> Result<Inspection> {
    let value: Value = serde_json::from_str(raw).context("Failed to parse JSON")?;
    if !value.is_array() {
        return inspect(raw, at, config).map(Inspection::Single);
    }

    let wire = WireCodec::new(config.wire.clone());
    let batch = wire
        .decode_list::<DataDebit>(&value)
        .context("Failed to decode data debits")?;
    for failure in &batch.failures {
        warn!("Skipping data debit {}: {}", failure.index, failure.error);
    }

    let reports = batch
        .records
        .iter()
        .filter_map(|debit| match report(debit, at) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Skipping data debit {}: {:#}", debit.data_debit_key, e);
                None
            }
        })
        .collect();
    Ok(Inspection::Batch(reports))
}

fn report(debit: &DataDebit, at: Timestamp) -> Result<InspectReport> {
    let state = debit.evaluate(at);
    debug!(
        "{}: {} permission(s), active {:?}, latest {:?}",
        debit.data_debit_key,
        debit.permissions.len(),
        state.active,
        state.latest
    );

    let grant = debit
        .effective_grant(at)
        .with_context(|| format!("Failed to resolve the grant of {}", debit.data_debit_key))?;

    Ok(InspectReport {
        data_debit_key: debit.data_debit_key.to_string(),
        at,
        status: debit.status(at),
        permission_count: debit.permissions.len(),
        active_permission: state.active,
        latest_permission: state.latest,
        endpoints: grant
            .as_ref()
            .map(|g| g.endpoints().into_iter().map(str::to_string).collect())
            .unwrap_or_default(),
        effective_grant: grant.as_ref().map(|g| g.to_json()),
    })
}

/// Decodes a wire payload of `shape` and returns its cache entry as JSON.
pub fn cache_entry(
    raw: &str,
    shape: Shape,
    now: Timestamp,
    config: &CodecConfig,
) -> Result<Value> {
    let wire = WireCodec::new(config.wire.clone());
    let cache = CacheCodec::try_new(config.cache.clone()).context("Invalid cache keys")?;
    match shape {
        Shape::Debit => to_cache::<DataDebit>(&wire, &cache, raw, now),
        Shape::Permission => to_cache::<Permission>(&wire, &cache, raw, now),
        Shape::Plug => to_cache::<DataPlug>(&wire, &cache, raw, now),
        Shape::Notice => to_cache::<Notice>(&wire, &cache, raw, now),
        Shape::Profile => to_cache::<ProfileField>(&wire, &cache, raw, now),
    }
}

fn to_cache<T: Marshal>(
    wire: &WireCodec,
    cache: &CacheCodec,
    raw: &str,
    now: Timestamp,
) -> Result<Value> {
    cache.check::<T>()?;
    let record: T = wire
        .decode_str(raw)
        .with_context(|| format!("Failed to decode {}", T::SCHEMA.record_type))?;
    Ok(cache.export_json(&cache.encode_at(&record, now)))
}
