//! Credential and endpoint configuration.
//!
//! Credentials are supplied per invocation (flags or environment) and never
//! persisted or cached by this crate.

use serde::Deserialize;

/// Fixed vendor base URL; overridable per context for testing.
pub const DEFAULT_BASE_URL: &str = "https://api-beijing.klingai.com";

/// Environment variable holding the access key.
pub const ACCESS_KEY_ENV: &str = "KLING_ACCESS_KEY";
/// Environment variable holding the secret key.
pub const SECRET_KEY_ENV: &str = "KLING_SECRET_KEY";

/// Access/secret key pair for the Kling API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl Credentials {
    #[must_use]
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Resolve credentials from explicit values, falling back to the
    /// environment. Missing sources yield empty keys; emptiness is reported
    /// by credential validation rather than here.
    #[must_use]
    pub fn resolve(access_key: Option<String>, secret_key: Option<String>) -> Self {
        let access_key = access_key
            .or_else(|| std::env::var(ACCESS_KEY_ENV).ok())
            .unwrap_or_default();
        let secret_key = secret_key
            .or_else(|| std::env::var(SECRET_KEY_ENV).ok())
            .unwrap_or_default();
        Self {
            access_key,
            secret_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_values_win_over_environment() {
        let creds = Credentials::resolve(Some("ak".to_string()), Some("sk".to_string()));
        assert_eq!(creds.access_key, "ak");
        assert_eq!(creds.secret_key, "sk");
    }

    #[test]
    fn new_accepts_empty_keys_without_validating() {
        let creds = Credentials::new("", "");
        assert!(creds.access_key.is_empty());
        assert!(creds.secret_key.is_empty());
    }
}
