//! netprobe — network diagnostics service
//!
//! Probe tools (ping, port scan, subnet calculator, DNS, TLS certificate
//! inspection, and provider-backed vendor/geolocation/WHOIS lookups) behind
//! an HTTP API with per-caller rate limiting and SQLite usage recording.

pub mod audit;
pub mod config;
pub mod error;
pub mod executor;
pub mod lookup;
pub mod probes;
pub mod rate_limit;
pub mod registry;
pub mod server;
