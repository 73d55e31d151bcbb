//! Service configuration loading and parsing

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "/etc/netprobe/config.toml";

/// Root configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Per-tool admission limits, requests per window.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    #[serde(default = "default_ping_limit")]
    pub ping: u32,
    #[serde(default = "default_lookup_limit")]
    pub dns_lookup: u32,
    #[serde(default = "default_scan_limit")]
    pub port_scan: u32,
    #[serde(default = "default_lookup_limit")]
    pub subnet_calculator: u32,
    #[serde(default = "default_scan_limit")]
    pub ssl_checker: u32,
    #[serde(default = "default_lookup_limit")]
    pub mac_lookup: u32,
    #[serde(default = "default_lookup_limit")]
    pub reverse_dns: u32,
    #[serde(default = "default_lookup_limit")]
    pub ip_geolocation: u32,
    #[serde(default = "default_lookup_limit")]
    pub whois: u32,
    #[serde(default = "default_scan_limit")]
    pub traceroute: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            ping: default_ping_limit(),
            dns_lookup: default_lookup_limit(),
            port_scan: default_scan_limit(),
            subnet_calculator: default_lookup_limit(),
            ssl_checker: default_scan_limit(),
            mac_lookup: default_lookup_limit(),
            reverse_dns: default_lookup_limit(),
            ip_geolocation: default_lookup_limit(),
            whois: default_lookup_limit(),
            traceroute: default_scan_limit(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// External lookup collaborators. Tests point the URLs at local fakes.
#[derive(Debug, Deserialize)]
pub struct LookupConfig {
    #[serde(default = "default_vendor_url")]
    pub vendor_url: String,
    #[serde(default = "default_geo_url")]
    pub geo_url: String,
    #[serde(default = "default_whois_url")]
    pub whois_url: String,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            vendor_url: default_vendor_url(),
            geo_url: default_geo_url(),
            whois_url: default_whois_url(),
            timeout_seconds: default_lookup_timeout(),
        }
    }
}

// Default value functions
fn default_bind() -> String { "0.0.0.0:8080".into() }
fn default_window_seconds() -> u64 { 60 }
fn default_ping_limit() -> u32 { 20 }
fn default_lookup_limit() -> u32 { 30 }
fn default_scan_limit() -> u32 { 10 }
fn default_db_path() -> String { "/var/lib/netprobe/usage.db".into() }
fn default_vendor_url() -> String { "https://api.macvendors.com".into() }
fn default_geo_url() -> String { "http://ip-api.com/json".into() }
fn default_whois_url() -> String { "https://api.whois.vu".into() }
fn default_lookup_timeout() -> u64 { 10 }

/// Load configuration from the default path or `NETPROBE_CONFIG`.
pub fn load_config() -> Result<Config> {
    let config_path =
        std::env::var("NETPROBE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    if Path::new(&config_path).exists() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {config_path}"))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {config_path}"))?;
        Ok(config)
    } else {
        tracing::warn!("Config file not found at {config_path}, using defaults");
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.limits.window_seconds, 60);
        assert_eq!(config.limits.ping, 20);
        assert_eq!(config.limits.dns_lookup, 30);
        assert_eq!(config.limits.port_scan, 10);
        assert_eq!(config.lookup.timeout_seconds, 10);
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml_str = r#"
[server]
bind = "127.0.0.1:9000"

[limits]
ping = 5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.limits.ping, 5);
        // Untouched fields keep their defaults
        assert_eq!(config.limits.dns_lookup, 30);
        assert_eq!(config.audit.db_path, "/var/lib/netprobe/usage.db");
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[server]
bind = "0.0.0.0:8080"

[limits]
window_seconds = 30
ping = 10
dns_lookup = 15
port_scan = 5
ssl_checker = 5

[audit]
db_path = "/tmp/netprobe-test.db"

[lookup]
vendor_url = "http://localhost:9100"
geo_url = "http://localhost:9101"
whois_url = "http://localhost:9102"
timeout_seconds = 2
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.limits.window_seconds, 30);
        assert_eq!(config.limits.ssl_checker, 5);
        assert_eq!(config.audit.db_path, "/tmp/netprobe-test.db");
        assert_eq!(config.lookup.vendor_url, "http://localhost:9100");
        assert_eq!(config.lookup.timeout_seconds, 2);
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.limits.ping, 20);
        assert_eq!(config.lookup.vendor_url, "https://api.macvendors.com");
    }
}
