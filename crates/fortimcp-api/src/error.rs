use thiserror::Error;

/// Top-level error type for the `fortimcp-api` crate.
///
/// Every failed call is classified into exactly one variant and always
/// carries the id of the device it was issued against. There is no retry
/// layer: a `Network` error means the single attempt failed.
#[derive(Debug, Error)]
pub enum Error {
    // ── HTTP ────────────────────────────────────────────────────────
    /// The appliance answered with a status >= 400.
    #[error("{message}")]
    Api {
        device_id: String,
        status: u16,
        message: String,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// DNS, TLS, connect, read or timeout failure. No status available.
    #[error("Network error: {message}")]
    Network { device_id: String, message: String },

    // ── Configuration ───────────────────────────────────────────────
    /// The device configuration cannot produce a working session.
    #[error("Invalid configuration for device '{device_id}': {reason}")]
    InvalidConfig { device_id: String, reason: String },
}

impl Error {
    /// The device the failing call was issued against.
    pub fn device_id(&self) -> &str {
        match self {
            Self::Api { device_id, .. }
            | Self::Network { device_id, .. }
            | Self::InvalidConfig { device_id, .. } => device_id,
        }
    }

    /// HTTP status, when the appliance produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the request never produced an HTTP response.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_expose_status_and_device() {
        let err = Error::Api {
            device_id: "fw1".into(),
            status: 404,
            message: "API request failed: 404".into(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.device_id(), "fw1");
        assert!(err.is_not_found());
        assert!(!err.is_network());
        assert_eq!(err.to_string(), "API request failed: 404");
    }

    #[test]
    fn network_errors_have_no_status() {
        let err = Error::Network {
            device_id: "fw2".into(),
            message: "connection refused".into(),
        };
        assert_eq!(err.status(), None);
        assert!(err.is_network());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }
}
