//! whois — domain registration data via the configured provider

use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_input, validate_field};
use crate::error::ProbeError;
use crate::lookup::RegistrationLookup;

#[derive(Deserialize)]
struct Input {
    domain: String,
}

pub async fn execute(
    registrations: &dyn RegistrationLookup,
    raw: Value,
) -> Result<Value, ProbeError> {
    let input: Input = parse_input(raw)?;
    validate_field("domain", &input.domain)?;
    let domain = input.domain.trim().to_string();
    let data = registrations.registration_for(&domain).await?;

    Ok(json!({
        "domain": domain,
        "data": data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticRegistration(Value);

    #[async_trait]
    impl RegistrationLookup for StaticRegistration {
        async fn registration_for(&self, _domain: &str) -> Result<Value, ProbeError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_passes_provider_payload_through() {
        let registrations = StaticRegistration(json!({
            "registrar": "Example Registrar Inc",
            "created": "1995-08-14",
        }));
        let result = execute(&registrations, json!({ "domain": "example.com" }))
            .await
            .unwrap();
        assert_eq!(result["domain"], "example.com");
        assert_eq!(result["data"]["registrar"], "Example Registrar Inc");
    }

    #[tokio::test]
    async fn test_domain_required() {
        let registrations = StaticRegistration(json!({}));
        let err = execute(&registrations, json!({ "domain": " " }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "The domain field is required.");
    }
}
