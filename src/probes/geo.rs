//! ip_geolocation — provider-backed location data for an address

use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_input, validate_field};
use crate::error::ProbeError;
use crate::lookup::GeoLookup;

#[derive(Deserialize)]
struct Input {
    ip: String,
}

pub async fn execute(geo: &dyn GeoLookup, raw: Value) -> Result<Value, ProbeError> {
    let input: Input = parse_input(raw)?;
    validate_field("ip", &input.ip)?;
    let ip = input.ip.trim().to_string();
    let data = geo.locate(&ip).await?;

    // Common fields are lifted to the top level; the full provider payload
    // rides along under "data" for anything not covered.
    Ok(json!({
        "ip": ip,
        "country": field(&data, "country"),
        "city": field(&data, "city"),
        "isp": field(&data, "isp"),
        "latitude": field(&data, "lat"),
        "longitude": field(&data, "lon"),
        "timezone": field(&data, "timezone"),
        "data": data,
    }))
}

fn field(data: &Value, key: &str) -> Value {
    data.get(key).cloned().unwrap_or(Value::Null)
}
