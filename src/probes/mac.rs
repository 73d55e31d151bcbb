//! mac_lookup — OUI vendor resolution
//!
//! Accepts any of the usual separator styles (colons, hyphens, dots, spaces)
//! by stripping everything that is not a hex digit before the lookup.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_input, validate_field};
use crate::error::ProbeError;
use crate::lookup::VendorLookup;

#[derive(Deserialize)]
struct Input {
    mac: String,
}

pub async fn execute(vendors: &dyn VendorLookup, raw: Value) -> Result<Value, ProbeError> {
    let input: Input = parse_input(raw)?;
    validate_field("mac", &input.mac)?;

    let normalized: String = input
        .mac
        .chars()
        .filter(char::is_ascii_hexdigit)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if normalized.len() < 6 {
        return Err(ProbeError::InvalidInput("Invalid MAC address format".into()));
    }
    let oui = normalized[..6].to_string();
    let vendor = vendors.vendor_for(&normalized).await?;

    Ok(json!({
        "mac": normalized,
        "oui": oui,
        "vendor": vendor,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticVendor(&'static str);

    #[async_trait]
    impl VendorLookup for StaticVendor {
        async fn vendor_for(&self, _mac: &str) -> Result<String, ProbeError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_normalizes_separators() {
        let vendors = StaticVendor("Acme Networks");
        let result = execute(&vendors, json!({ "mac": "00:11:22:33:44:55" }))
            .await
            .unwrap();
        assert_eq!(result["mac"], "001122334455");
        assert_eq!(result["oui"], "001122");
        assert_eq!(result["vendor"], "Acme Networks");
    }

    #[tokio::test]
    async fn test_accepts_mixed_notation() {
        let vendors = StaticVendor("Acme Networks");
        let result = execute(&vendors, json!({ "mac": "aa-bb.cc dd" }))
            .await
            .unwrap();
        assert_eq!(result["mac"], "AABBCCDD");
        assert_eq!(result["oui"], "AABBCC");
    }

    #[tokio::test]
    async fn test_rejects_short_mac() {
        let vendors = StaticVendor("unused");
        let err = execute(&vendors, json!({ "mac": "00:11" })).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid MAC address format");
    }

    #[tokio::test]
    async fn test_mac_required() {
        let vendors = StaticVendor("unused");
        let err = execute(&vendors, json!({ "mac": "  " })).await.unwrap_err();
        assert_eq!(err.to_string(), "The mac field is required.");
    }
}
