//! port_scan — TCP connect scan over a bounded port range

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::{parse_input, validate_field};
use crate::error::ProbeError;

const PORT_TIMEOUT: Duration = Duration::from_secs(1);
const MAX_SPAN: u16 = 100;
const CONCURRENCY: usize = 16;

#[derive(Deserialize)]
struct Input {
    host: String,
    #[serde(default = "default_start")]
    start_port: i64,
    #[serde(default = "default_end")]
    end_port: i64,
}

fn default_start() -> i64 {
    1
}

fn default_end() -> i64 {
    100
}

pub async fn execute(raw: Value) -> Result<Value, ProbeError> {
    let input: Input = parse_input(raw)?;
    validate_field("host", &input.host)?;

    let start = input.start_port.clamp(1, 65535) as u16;
    let mut end = input.end_port.clamp(1, 65535) as u16;
    end = end.max(start);
    if end - start > MAX_SPAN {
        end = start + MAX_SPAN;
    }

    let host = input.host.trim().to_string();
    let ip = resolve(&host).await?;

    // buffered() keeps completion order equal to submission order, so the
    // result list stays ascending by port regardless of which connects
    // finish first.
    let results: Vec<Value> = stream::iter(start..=end)
        .map(|port| async move {
            let state = if probe_port(ip, port).await {
                "open"
            } else {
                "closed"
            };
            json!({ "port": port, "status": state })
        })
        .buffered(CONCURRENCY)
        .collect()
        .await;

    Ok(json!({
        "host": ip.to_string(),
        "port_range": format!("{start}-{end}"),
        "results": results,
    }))
}

async fn resolve(host: &str) -> Result<IpAddr, ProbeError> {
    let mut addrs = tokio::net::lookup_host((host, 0u16))
        .await
        .map_err(|_| ProbeError::Resolution(host.to_string()))?;
    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| ProbeError::Resolution(host.to_string()))
}

async fn probe_port(ip: IpAddr, port: u16) -> bool {
    matches!(
        timeout(PORT_TIMEOUT, TcpStream::connect(SocketAddr::new(ip, port))).await,
        Ok(Ok(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_finds_open_port_on_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = execute(json!({
            "host": "127.0.0.1",
            "start_port": port,
            "end_port": port,
        }))
        .await
        .unwrap();

        assert_eq!(result["host"], "127.0.0.1");
        assert_eq!(result["port_range"], format!("{port}-{port}"));
        let results = result["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["port"], port);
        assert_eq!(results[0]["status"], "open");
    }

    #[tokio::test]
    async fn test_span_is_truncated_and_ordered() {
        let result = execute(json!({
            "host": "127.0.0.1",
            "start_port": 1,
            "end_port": 500,
        }))
        .await
        .unwrap();

        assert_eq!(result["port_range"], "1-101");
        let results = result["results"].as_array().unwrap();
        assert_eq!(results.len(), 101);
        for (i, entry) in results.iter().enumerate() {
            assert_eq!(entry["port"], (i + 1) as u16);
        }
    }

    #[tokio::test]
    async fn test_out_of_range_ports_clamp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let _keep = listener;

        let result = execute(json!({
            "host": "127.0.0.1",
            "start_port": -5,
            "end_port": 0,
        }))
        .await
        .unwrap();
        assert_eq!(result["port_range"], "1-1");

        let result = execute(json!({
            "host": "127.0.0.1",
            "start_port": 70000,
            "end_port": 90000,
        }))
        .await
        .unwrap();
        assert_eq!(result["port_range"], "65535-65535");
    }

    #[tokio::test]
    async fn test_inverted_range_collapses_to_start() {
        let result = execute(json!({
            "host": "127.0.0.1",
            "start_port": 300,
            "end_port": 200,
        }))
        .await
        .unwrap();
        assert_eq!(result["port_range"], "300-300");
    }

    #[tokio::test]
    async fn test_unresolvable_host() {
        let err = execute(json!({ "host": "host.invalid", "start_port": 1, "end_port": 1 }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Could not resolve host: host.invalid");
    }
}
