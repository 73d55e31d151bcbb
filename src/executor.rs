//! Probe dispatch
//!
//! Tools are keyed by name in a handler map. Every run is folded into a
//! [`ProbeReport`] whether the probe succeeded or not, so callers always get
//! the same envelope shape.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ProbeError;
use crate::lookup::{GeoLookup, RegistrationLookup, VendorLookup};
use crate::probes;

type ProbeFuture = Pin<Box<dyn Future<Output = Result<Value, ProbeError>> + Send>>;
type ProbeHandler = Box<dyn Fn(Value) -> ProbeFuture + Send + Sync>;

/// Uniform result envelope. Probe output fields are flattened next to the
/// bookkeeping keys, and `error` is omitted entirely on success.
#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_ms: u64,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

pub struct Executor {
    handlers: HashMap<String, ProbeHandler>,
}

impl Executor {
    pub fn new(
        resolver: Arc<hickory_resolver::TokioAsyncResolver>,
        vendors: Arc<dyn VendorLookup>,
        geo: Arc<dyn GeoLookup>,
        registrations: Arc<dyn RegistrationLookup>,
    ) -> Self {
        let mut handlers: HashMap<String, ProbeHandler> = HashMap::new();

        handlers.insert(
            "ping".into(),
            Box::new(|params| Box::pin(probes::ping::execute(params))),
        );
        handlers.insert(
            "port_scan".into(),
            Box::new(|params| Box::pin(probes::port_scan::execute(params))),
        );
        handlers.insert(
            "subnet_calculator".into(),
            Box::new(|params| Box::pin(probes::subnet::execute(params))),
        );
        handlers.insert(
            "ssl_checker".into(),
            Box::new(|params| Box::pin(probes::ssl::execute(params))),
        );
        handlers.insert(
            "traceroute".into(),
            Box::new(|params| Box::pin(probes::traceroute::execute(params))),
        );

        handlers.insert("dns_lookup".into(), {
            let resolver = resolver.clone();
            Box::new(move |params| {
                let resolver = resolver.clone();
                Box::pin(async move { probes::dns::execute_forward(&resolver, params).await })
            })
        });
        handlers.insert("reverse_dns".into(), {
            let resolver = resolver.clone();
            Box::new(move |params| {
                let resolver = resolver.clone();
                Box::pin(async move { probes::dns::execute_reverse(&resolver, params).await })
            })
        });
        handlers.insert("mac_lookup".into(), {
            let vendors = vendors.clone();
            Box::new(move |params| {
                let vendors = vendors.clone();
                Box::pin(async move { probes::mac::execute(vendors.as_ref(), params).await })
            })
        });
        handlers.insert("ip_geolocation".into(), {
            let geo = geo.clone();
            Box::new(move |params| {
                let geo = geo.clone();
                Box::pin(async move { probes::geo::execute(geo.as_ref(), params).await })
            })
        });
        handlers.insert("whois".into(), {
            let registrations = registrations.clone();
            Box::new(move |params| {
                let registrations = registrations.clone();
                Box::pin(async move {
                    probes::whois::execute(registrations.as_ref(), params).await
                })
            })
        });

        Self { handlers }
    }

    pub async fn run(&self, tool: &str, params: Value) -> ProbeReport {
        let execution_id = Uuid::new_v4();
        let started = Instant::now();
        info!("Executing {tool} [{execution_id}]");

        let outcome = match self.handlers.get(tool) {
            Some(handler) => handler(params).await,
            None => Err(ProbeError::Unsupported(format!("Unsupported tool: {tool}"))),
        };
        let execution_time_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(value) => {
                debug!("Probe {tool} [{execution_id}] finished in {execution_time_ms}ms");
                ProbeReport {
                    success: true,
                    error: None,
                    execution_time_ms,
                    fields: value.as_object().cloned().unwrap_or_default(),
                }
            }
            Err(e) => {
                debug!("Probe {tool} [{execution_id}] failed: {e}");
                ProbeReport {
                    success: false,
                    error: Some(e.to_string()),
                    execution_time_ms,
                    fields: serde_json::Map::new(),
                }
            }
        }
    }
}
