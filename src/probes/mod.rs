//! Probe implementations, one module per tool.
//!
//! Each submodule exposes an `execute` entry point taking the caller's JSON
//! parameters and returning the tool-specific result fields. The executor
//! adds the common envelope (success flag, timing, error text).

pub mod dns;
pub mod geo;
pub mod mac;
pub mod ping;
pub mod port_scan;
pub mod ssl;
pub mod subnet;
pub mod traceroute;
pub mod whois;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ProbeError;

/// Deserialize caller parameters into a probe's typed input.
pub(crate) fn parse_input<T: DeserializeOwned>(raw: Value) -> Result<T, ProbeError> {
    serde_json::from_value(raw).map_err(|e| ProbeError::InvalidInput(format!("Invalid input: {e}")))
}

/// Required non-empty string field, capped at 255 characters.
pub(crate) fn validate_field(field: &str, value: &str) -> Result<(), ProbeError> {
    if value.trim().is_empty() {
        return Err(ProbeError::InvalidInput(format!(
            "The {field} field is required."
        )));
    }
    if value.len() > 255 {
        return Err(ProbeError::InvalidInput(format!(
            "The {field} field must not be greater than 255 characters."
        )));
    }
    Ok(())
}
