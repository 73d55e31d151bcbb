//! ssl_checker — TLS certificate inspection
//!
//! The handshake uses a verifier that accepts any chain, so expired,
//! self-signed, and otherwise untrusted certificates can still be fetched
//! and described. Nothing is sent over the connection after the handshake.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{aws_lc_rs, CryptoProvider};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio_rustls::TlsConnector;
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;
use x509_parser::x509::X509Name;

use super::{parse_input, validate_field};
use crate::error::ProbeError;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const HTTPS_PORT: u16 = 443;

#[derive(Deserialize)]
struct Input {
    domain: String,
}

pub async fn execute(raw: Value) -> Result<Value, ProbeError> {
    let input: Input = parse_input(raw)?;
    validate_field("domain", &input.domain)?;
    let domain = input.domain.trim().to_string();
    check_certificate(&domain, HTTPS_PORT).await
}

async fn check_certificate(domain: &str, port: u16) -> Result<Value, ProbeError> {
    let server_name = ServerName::try_from(domain.to_string())
        .map_err(|_| ProbeError::InvalidInput("Invalid domain name".into()))?;
    let config = insecure_client_config()
        .map_err(|e| ProbeError::Network(format!("TLS setup failed: {e}")))?;
    let connector = TlsConnector::from(Arc::new(config));

    let handshake = timeout(HANDSHAKE_TIMEOUT, async {
        let tcp = TcpStream::connect((domain, port)).await?;
        let tls = connector.connect(server_name, tcp).await?;
        Ok::<_, std::io::Error>(tls)
    })
    .await;

    let tls = match handshake {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            return Err(ProbeError::Network(format!(
                "Failed to connect to {domain}:{port} - {e}"
            )))
        }
        Err(_) => {
            return Err(ProbeError::Network(format!(
                "Failed to connect to {domain}:{port} - connection timed out"
            )))
        }
    };

    let (_, session) = tls.get_ref();
    let der = session
        .peer_certificates()
        .and_then(|certs| certs.first())
        .ok_or_else(|| ProbeError::Network("No SSL certificate found".into()))?;
    describe_certificate(domain, der.as_ref())
}

fn describe_certificate(domain: &str, der: &[u8]) -> Result<Value, ProbeError> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| ProbeError::Network(format!("Failed to parse certificate: {e}")))?;

    let not_before = cert.validity().not_before.timestamp();
    let not_after = cert.validity().not_after.timestamp();
    let now = Utc::now().timestamp();

    Ok(json!({
        "domain": domain,
        "issuer": common_name(cert.issuer()),
        "subject": common_name(cert.subject()),
        "valid_from": format_timestamp(not_before),
        "valid_to": format_timestamp(not_after),
        "days_until_expiry": days_until(not_after, now),
        "is_valid": not_after > now,
    }))
}

fn common_name(name: &X509Name<'_>) -> String {
    name.iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .unwrap_or("Unknown")
        .to_string()
}

fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Whole days left before expiry, rounded up. Expired certificates report 0.
fn days_until(not_after: i64, now: i64) -> i64 {
    let remaining = (not_after - now).max(0);
    (remaining + 86_399) / 86_400
}

// The provider is named explicitly; automatic selection has no answer when
// the dependency graph enables more than one.
fn insecure_client_config() -> Result<ClientConfig, tokio_rustls::rustls::Error> {
    Ok(
        ClientConfig::builder_with_provider(Arc::new(aws_lc_rs::default_provider()))
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new()))
            .with_no_client_auth(),
    )
}

/// Verifier that trusts every presented chain. Handshake signatures are
/// still checked so a live server is required, but chain validity is not.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: CryptoProvider,
}

impl AcceptAnyServerCert {
    fn new() -> Self {
        Self {
            provider: aws_lc_rs::default_provider(),
        }
    }
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, tokio_rustls::rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        tokio_rustls::rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        tokio_rustls::rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
