//! Reporting adapters over the result records
//!
//! Plain-text tables (`text`), flat CSV (`csv`) and JSON. Adapters only read
//! results; every number they print comes straight from a result record.

pub mod csv;
pub mod text;

use anyhow::Context;
use serde::Serialize;
use std::path::Path;

/// Pretty-printed JSON for any result record
pub fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Write a result record as pretty-printed JSON
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> anyhow::Result<()> {
    let json = to_json(value)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write JSON report to {}", path.display()))?;
    tracing::info!(path = %path.display(), "JSON report written");
    Ok(())
}

/// Fixed-precision number, `-` when absent
pub(crate) fn format_number(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", precision, v),
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}
