//! External data providers
//!
//! Vendor, geolocation, and registration data come from third-party HTTP
//! services. The probes only see the narrow traits here, so tests can swap
//! in canned providers and the services can be changed without touching
//! probe code.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::config::LookupConfig;
use crate::error::ProbeError;

#[async_trait]
pub trait VendorLookup: Send + Sync {
    async fn vendor_for(&self, mac: &str) -> Result<String, ProbeError>;
}

#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn locate(&self, ip: &str) -> Result<Value, ProbeError>;
}

#[async_trait]
pub trait RegistrationLookup: Send + Sync {
    async fn registration_for(&self, domain: &str) -> Result<Value, ProbeError>;
}

/// Single reqwest-backed implementation of all three lookup traits.
pub struct HttpLookupClient {
    client: reqwest::Client,
    vendor_url: String,
    geo_url: String,
    whois_url: String,
}

impl HttpLookupClient {
    pub fn new(config: &LookupConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            vendor_url: config.vendor_url.trim_end_matches('/').to_string(),
            geo_url: config.geo_url.trim_end_matches('/').to_string(),
            whois_url: config.whois_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl VendorLookup for HttpLookupClient {
    async fn vendor_for(&self, mac: &str) -> Result<String, ProbeError> {
        let url = format!("{}/{mac}", self.vendor_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProbeError::Collaborator(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProbeError::Collaborator("Vendor not found".into()));
        }
        response
            .text()
            .await
            .map_err(|e| ProbeError::Collaborator(e.to_string()))
    }
}

#[async_trait]
impl GeoLookup for HttpLookupClient {
    async fn locate(&self, ip: &str) -> Result<Value, ProbeError> {
        let url = format!("{}/{ip}", self.geo_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProbeError::Collaborator(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProbeError::Collaborator(
                "Failed to get geolocation data".into(),
            ));
        }
        response
            .json()
            .await
            .map_err(|_| ProbeError::Collaborator("Failed to get geolocation data".into()))
    }
}

#[async_trait]
impl RegistrationLookup for HttpLookupClient {
    async fn registration_for(&self, domain: &str) -> Result<Value, ProbeError> {
        let response = self
            .client
            .get(&self.whois_url)
            .query(&[("q", domain)])
            .send()
            .await
            .map_err(|e| ProbeError::Collaborator(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProbeError::Collaborator("WHOIS service unavailable".into()));
        }
        response
            .json()
            .await
            .map_err(|_| ProbeError::Collaborator("WHOIS service unavailable".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpLookupClient {
        HttpLookupClient::new(&LookupConfig {
            vendor_url: server.uri(),
            geo_url: server.uri(),
            whois_url: server.uri(),
            timeout_seconds: 5,
        })
    }

    #[test]
    fn test_trims_trailing_slash() {
        let client = HttpLookupClient::new(&LookupConfig {
            vendor_url: "https://api.macvendors.com/".into(),
            geo_url: "http://ip-api.com/json/".into(),
            whois_url: "https://api.whois.vu/".into(),
            timeout_seconds: 5,
        });
        assert_eq!(client.vendor_url, "https://api.macvendors.com");
        assert_eq!(client.geo_url, "http://ip-api.com/json");
    }

    #[tokio::test]
    async fn test_vendor_for_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/001122334455"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Acme Networks"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let vendor = client.vendor_for("001122334455").await.unwrap();
        assert_eq!(vendor, "Acme Networks");
    }

    #[tokio::test]
    async fn test_vendor_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.vendor_for("FFFFFF000000").await.unwrap_err();
        assert_eq!(err.to_string(), "Vendor not found");
    }

    #[tokio::test]
    async fn test_locate_parses_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/8.8.8.8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "country": "United States",
                "lat": 37.386,
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let data = client.locate("8.8.8.8").await.unwrap();
        assert_eq!(data["country"], "United States");
        assert_eq!(data["lat"], 37.386);
    }

    #[tokio::test]
    async fn test_locate_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.locate("8.8.8.8").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to get geolocation data");
    }

    #[tokio::test]
    async fn test_registration_for_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "registrar": "Example Registrar Inc",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let data = client.registration_for("example.com").await.unwrap();
        assert_eq!(data["registrar"], "Example Registrar Inc");
    }

    #[tokio::test]
    async fn test_registration_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.registration_for("example.com").await.unwrap_err();
        assert_eq!(err.to_string(), "WHOIS service unavailable");
    }
}
