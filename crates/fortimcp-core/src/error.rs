// ── Core error types ──
//
// Domain errors from fortimcp-core. Transport failures arrive as
// `fortimcp_api::Error` and map 1:1 through the `From` impl below; the
// registry and the argument checks add their own variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Registry errors ──────────────────────────────────────────────
    #[error("Device '{device_id}' not found")]
    UnknownDevice { device_id: String },

    #[error("Device '{device_id}' already exists")]
    DuplicateDevice { device_id: String },

    #[error("Invalid configuration for device '{device_id}': {reason}")]
    InvalidConfig { device_id: String, reason: String },

    // ── Appliance errors ─────────────────────────────────────────────
    #[error("{message}")]
    Api {
        device_id: String,
        status: u16,
        message: String,
    },

    #[error("Network error: {message}")]
    Network { device_id: String, message: String },

    // ── Caller errors ────────────────────────────────────────────────
    #[error("Parameter '{name}' {reason}")]
    InvalidArgument { name: String, reason: String },
}

impl CoreError {
    pub fn missing(name: &str) -> Self {
        Self::InvalidArgument {
            name: name.to_owned(),
            reason: "is required".into(),
        }
    }

    /// HTTP status, for appliance errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The device involved, when the error concerns one.
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Self::UnknownDevice { device_id }
            | Self::DuplicateDevice { device_id }
            | Self::InvalidConfig { device_id, .. }
            | Self::Api { device_id, .. }
            | Self::Network { device_id, .. } => Some(device_id),
            Self::InvalidArgument { .. } => None,
        }
    }

    /// Returns `true` if the request never reached the appliance.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fortimcp_api::Error> for CoreError {
    fn from(err: fortimcp_api::Error) -> Self {
        match err {
            fortimcp_api::Error::Api {
                device_id,
                status,
                message,
            } => Self::Api {
                device_id,
                status,
                message,
            },
            fortimcp_api::Error::Network { device_id, message } => {
                Self::Network { device_id, message }
            }
            fortimcp_api::Error::InvalidConfig { device_id, reason } => {
                Self::InvalidConfig { device_id, reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_keep_status_and_device() {
        let err: CoreError = fortimcp_api::Error::Api {
            device_id: "fw1".into(),
            status: 403,
            message: "API request failed: 403 - permission denied".into(),
        }
        .into();

        assert_eq!(err.status(), Some(403));
        assert_eq!(err.device_id(), Some("fw1"));
        assert_eq!(
            err.to_string(),
            "API request failed: 403 - permission denied"
        );
    }

    #[test]
    fn network_errors_map_without_status() {
        let err: CoreError = fortimcp_api::Error::Network {
            device_id: "fw1".into(),
            message: "request timed out after 30s".into(),
        }
        .into();

        assert!(err.is_network());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn missing_argument_message() {
        assert_eq!(
            CoreError::missing("name").to_string(),
            "Parameter 'name' is required"
        );
    }
}
