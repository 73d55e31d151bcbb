//! dns_lookup / reverse_dns — record queries via the system resolver

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::TokioAsyncResolver;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::IpAddr;

use super::{parse_input, validate_field};
use crate::error::ProbeError;

const RECORD_TYPES: [RecordType; 6] = [
    RecordType::A,
    RecordType::AAAA,
    RecordType::MX,
    RecordType::NS,
    RecordType::CNAME,
    RecordType::TXT,
];

#[derive(Deserialize)]
struct ForwardInput {
    domain: String,
}

#[derive(Deserialize)]
struct ReverseInput {
    ip: String,
}

/// Resolver backed by /etc/resolv.conf, falling back to the public defaults
/// when the system configuration cannot be read.
pub fn system_resolver() -> TokioAsyncResolver {
    match TokioAsyncResolver::tokio_from_system_conf() {
        Ok(resolver) => resolver,
        Err(e) => {
            tracing::warn!("Failed to read system resolver config: {e}, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        }
    }
}

pub async fn execute_forward(
    resolver: &TokioAsyncResolver,
    raw: Value,
) -> Result<Value, ProbeError> {
    let input: ForwardInput = parse_input(raw)?;
    validate_field("domain", &input.domain)?;
    let domain = input.domain.trim().to_string();

    // Types with no answers (or whose query fails) are left out entirely
    // rather than reported as empty lists.
    let mut records = serde_json::Map::new();
    for rtype in RECORD_TYPES {
        let values: Vec<String> = match resolver.lookup(domain.as_str(), rtype).await {
            Ok(lookup) => lookup
                .records()
                .iter()
                .filter(|r| r.record_type() == rtype)
                .filter_map(|r| r.data().map(ToString::to_string))
                .collect(),
            Err(_) => Vec::new(),
        };
        if !values.is_empty() {
            records.insert(rtype.to_string(), json!(values));
        }
    }

    Ok(json!({
        "domain": domain,
        "records": records,
    }))
}

pub async fn execute_reverse(
    resolver: &TokioAsyncResolver,
    raw: Value,
) -> Result<Value, ProbeError> {
    let input: ReverseInput = parse_input(raw)?;
    let ip: IpAddr = input
        .ip
        .trim()
        .parse()
        .map_err(|_| ProbeError::InvalidInput("Invalid IP address".into()))?;

    let hostname = match resolver.reverse_lookup(ip).await {
        Ok(lookup) => lookup
            .iter()
            .next()
            .map(|ptr| ptr.to_string().trim_end_matches('.').to_string()),
        Err(_) => None,
    };

    Ok(json!({
        "ip": ip.to_string(),
        "hostname": hostname,
    }))
}
