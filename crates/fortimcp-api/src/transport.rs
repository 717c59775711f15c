// Shared transport configuration for building reqwest::Client instances.
//
// Every session builds its own client from this, so TLS verification and
// the request timeout are per device while the builder logic stays in one
// place.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};

const USER_AGENT: &str = concat!("fortimcp/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Verify the appliance certificate against the webpki roots.
    Verify,
    /// Accept any certificate (factory self-signed appliances).
    DangerAcceptInvalid,
}

impl TlsMode {
    pub fn from_verify(verify: bool) -> Self {
        if verify {
            Self::Verify
        } else {
            Self::DangerAcceptInvalid
        }
    }

    pub fn verifies(self) -> bool {
        matches!(self, Self::Verify)
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Bounds connect + read for a whole request.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Headers every FortiGate request carries.
    pub fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        self.build_client_with_headers(Self::json_headers())
    }

    /// Build a `reqwest::Client` with explicit default headers.
    pub fn build_client_with_headers(
        &self,
        headers: HeaderMap,
    ) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers);

        if !self.tls.verifies() {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_mode_maps_verify_flag() {
        assert_eq!(TlsMode::from_verify(true), TlsMode::Verify);
        assert_eq!(TlsMode::from_verify(false), TlsMode::DangerAcceptInvalid);
        assert!(!TlsMode::DangerAcceptInvalid.verifies());
    }

    #[test]
    fn json_headers_are_set() {
        let headers = TransportConfig::json_headers();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[ACCEPT], "application/json");
    }

    #[test]
    fn default_client_builds() {
        assert!(TransportConfig::default().build_client().is_ok());
    }
}
