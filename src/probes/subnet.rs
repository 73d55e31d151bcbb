//! subnet_calculator — IPv4 subnet arithmetic
//!
//! The subnet argument is accepted in three forms: CIDR with a leading slash
//! ("/24"), a dotted mask ("255.255.255.0"), or a bare prefix length ("24").

use serde::Deserialize;
use serde_json::{json, Value};
use std::net::Ipv4Addr;

use super::parse_input;
use crate::error::ProbeError;

#[derive(Deserialize)]
struct Input {
    ip: String,
    subnet: String,
}

pub async fn execute(raw: Value) -> Result<Value, ProbeError> {
    let input: Input = parse_input(raw)?;
    let ip: Ipv4Addr = input
        .ip
        .trim()
        .parse()
        .map_err(|_| ProbeError::InvalidInput("Invalid IP address".into()))?;
    let prefix = parse_prefix(input.subnet.trim())?;
    Ok(calculate(ip, prefix))
}

fn parse_prefix(subnet: &str) -> Result<u8, ProbeError> {
    let prefix = if let Some(rest) = subnet.strip_prefix('/') {
        rest.parse::<u8>()
            .map_err(|_| ProbeError::InvalidInput("Invalid subnet".into()))?
    } else if subnet.contains('.') {
        let mask: Ipv4Addr = subnet
            .parse()
            .map_err(|_| ProbeError::InvalidInput("Invalid subnet mask".into()))?;
        mask_to_prefix(u32::from(mask))?
    } else {
        subnet
            .parse::<u8>()
            .map_err(|_| ProbeError::InvalidInput("Invalid subnet".into()))?
    };
    if prefix > 32 {
        return Err(ProbeError::InvalidInput("Invalid subnet".into()));
    }
    Ok(prefix)
}

/// Convert a dotted mask to a prefix length. Only contiguous masks (an
/// unbroken run of ones followed by zeros) describe a real subnet; anything
/// else is rejected rather than mapped to a bogus prefix.
fn mask_to_prefix(mask: u32) -> Result<u8, ProbeError> {
    let inverted = !mask;
    if inverted & inverted.wrapping_add(1) != 0 {
        return Err(ProbeError::InvalidInput("Invalid subnet mask".into()));
    }
    Ok(mask.count_ones() as u8)
}

fn calculate(ip: Ipv4Addr, prefix: u8) -> Value {
    let host_bits = 32 - u32::from(prefix);
    // Shift in u64 so /0 (host_bits = 32) stays defined.
    let mask = ((!0u64) << host_bits) as u32;

    let addr = u32::from(ip);
    let network = addr & mask;
    let broadcast = network | !mask;
    let total_hosts: u64 = 1u64 << host_bits;
    let usable_hosts = total_hosts.saturating_sub(2);

    json!({
        "ip": ip.to_string(),
        "cidr": prefix,
        "subnet_mask": Ipv4Addr::from(mask).to_string(),
        "network_address": Ipv4Addr::from(network).to_string(),
        "broadcast_address": Ipv4Addr::from(broadcast).to_string(),
        "first_host": Ipv4Addr::from(network.wrapping_add(1)).to_string(),
        "last_host": Ipv4Addr::from(broadcast.wrapping_sub(1)).to_string(),
        "total_hosts": total_hosts,
        "usable_hosts": usable_hosts,
    })
}
