use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

/// Which authentication scheme a session uses.
///
/// Marker enum (no data) -- the actual secrets live in [`Credentials`].
/// Safe to log and to show in device listings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuthMode {
    /// `Authorization: Bearer <token>` on every request.
    Token,
    /// HTTP Basic with username and password on every request.
    Basic,
}

/// Credentials for authenticating with a FortiGate appliance.
///
/// Exactly one form per device. Construction goes through
/// [`DeviceConfig::from_settings`](crate::DeviceConfig::from_settings),
/// which prefers the token when both forms are configured.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// REST API administrator token.
    ApiToken { token: SecretString },

    /// Local administrator account.
    Basic {
        username: String,
        password: SecretString,
    },
}

impl Credentials {
    pub fn mode(&self) -> AuthMode {
        match self {
            Self::ApiToken { .. } => AuthMode::Token,
            Self::Basic { .. } => AuthMode::Basic,
        }
    }

    /// Attach the authorization header for this credential form.
    pub(crate) fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::ApiToken { token } => builder.bearer_auth(token.expose_secret()),
            Self::Basic { username, password } => {
                builder.basic_auth(username, Some(password.expose_secret()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_follows_variant() {
        let token = Credentials::ApiToken {
            token: SecretString::from("abc".to_string()),
        };
        let basic = Credentials::Basic {
            username: "admin".into(),
            password: SecretString::from("pw".to_string()),
        };
        assert_eq!(token.mode(), AuthMode::Token);
        assert_eq!(basic.mode(), AuthMode::Basic);
        assert_eq!(AuthMode::Token.to_string(), "token");
        assert_eq!(AuthMode::Basic.as_ref(), "basic");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let token = Credentials::ApiToken {
            token: SecretString::from("super-secret".to_string()),
        };
        assert!(!format!("{token:?}").contains("super-secret"));
    }
}
