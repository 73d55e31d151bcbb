//! traceroute — registered but unavailable without raw sockets

use serde_json::Value;

use crate::error::ProbeError;

pub async fn execute(_raw: Value) -> Result<Value, ProbeError> {
    Err(ProbeError::Unsupported(
        "Traceroute requires raw socket privileges and is not supported on this build".into(),
    ))
}
