//! ping — TCP reachability probe
//!
//! Raw ICMP needs CAP_NET_RAW, so reachability is measured by timing a TCP
//! connect to port 80 instead. Timing covers name resolution plus the
//! handshake, which is close enough for a liveness check.

use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::{parse_input, validate_field};
use crate::error::ProbeError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_PORT: u16 = 80;

#[derive(Deserialize)]
struct Input {
    host: String,
    #[serde(default = "default_count")]
    count: u32,
    #[serde(default = "default_interval")]
    interval: u64,
}

fn default_count() -> u32 {
    4
}

fn default_interval() -> u64 {
    1
}

pub async fn execute(raw: Value) -> Result<Value, ProbeError> {
    let input: Input = parse_input(raw)?;
    validate_field("host", &input.host)?;
    if !(1..=10).contains(&input.count) {
        return Err(ProbeError::InvalidInput(
            "count must be between 1 and 10".into(),
        ));
    }
    if !(1..=5).contains(&input.interval) {
        return Err(ProbeError::InvalidInput(
            "interval must be between 1 and 5".into(),
        ));
    }

    let host = input.host.trim().to_string();
    let mut responses = Vec::with_capacity(input.count as usize);
    let mut times: Vec<f64> = Vec::new();

    for attempt in 0..input.count {
        match connect_once(&host, PROBE_PORT).await {
            Some(elapsed) => {
                times.push(elapsed);
                responses.push(json!({
                    "response_time": elapsed,
                    "ttl": Value::Null,
                    "raw": format!("Reply from {host}: time={elapsed}ms"),
                }));
            }
            None => {
                responses.push(json!({
                    "response_time": Value::Null,
                    "ttl": Value::Null,
                    "raw": format!("Request timeout for {host}"),
                }));
            }
        }
        if attempt + 1 < input.count {
            tokio::time::sleep(Duration::from_secs(input.interval)).await;
        }
    }

    let received = times.len();
    let loss =
        ((1.0 - received as f64 / input.count as f64) * 100.0).round() as u64;
    let mut statistics = serde_json::Map::new();
    statistics.insert("packets_sent".into(), json!(input.count));
    statistics.insert("packets_received".into(), json!(received));
    statistics.insert("packet_loss".into(), json!(loss));
    if received > 0 {
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(0.0f64, f64::max);
        let avg = times.iter().sum::<f64>() / received as f64;
        statistics.insert("min_time".into(), json!(min));
        statistics.insert("avg_time".into(), json!(round2(avg)));
        statistics.insert("max_time".into(), json!(max));
    }

    Ok(json!({
        "host": host,
        "count": input.count,
        "interval": input.interval,
        "responses": responses,
        "statistics": statistics,
    }))
}

/// One timed connect attempt. Returns the elapsed milliseconds on success,
/// None on timeout or any connect error.
async fn connect_once(host: &str, port: u16) -> Option<f64> {
    let started = Instant::now();
    match timeout(CONNECT_TIMEOUT, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => Some(round2(started.elapsed().as_secs_f64() * 1000.0)),
        _ => None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
