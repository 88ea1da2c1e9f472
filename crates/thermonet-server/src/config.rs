//! Server configuration file.
//!
//! ```toml
//! password = "correct horse"
//! key = "<64 hex chars>"
//! poll_period_ms = 50
//!
//! [[endpoints]]
//! name = "infant"
//! bind = "127.0.0.1:23456"
//! kelvin = 309.0
//! ```
//!
//! All endpoints share the password and key. The password is hashed when the
//! endpoints are built and is never logged.

use std::{net::SocketAddr, path::Path, time::Duration};

use serde::Deserialize;
use thermonet_core::EndpointConfig;
use thermonet_crypto::SecretKey;
use thiserror::Error;

/// Poll period used when the file does not set one.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(50);

/// Reading reported by an endpoint's fixed source when the file omits it
/// (20 °C).
pub const DEFAULT_KELVIN: f64 = 293.0;

/// Errors loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the schema.
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The key is not 32 hex-encoded bytes.
    #[error("invalid key: {0}")]
    Key(#[from] thermonet_crypto::CodecError),

    /// Semantically invalid configuration.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// One sensor endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EndpointSpec {
    /// Name used in logs.
    pub name: String,
    /// UDP address to bind.
    pub bind: SocketAddr,
    /// Reading reported by the endpoint's fixed telemetry source.
    #[serde(default = "default_kelvin")]
    pub kelvin: f64,
}

fn default_kelvin() -> f64 {
    DEFAULT_KELVIN
}

fn default_poll_period_ms() -> u64 {
    50
}

/// Server configuration for the production runtime.
#[derive(Clone, Deserialize)]
pub struct ServerRuntimeConfig {
    /// Plaintext password shared by all endpoints.
    pub password: String,
    /// Hex-encoded 32-byte envelope key.
    pub key: String,
    /// Listener poll period in milliseconds.
    #[serde(default = "default_poll_period_ms")]
    pub poll_period_ms: u64,
    /// Endpoints to run, one listener each.
    pub endpoints: Vec<EndpointSpec>,
}

impl std::fmt::Debug for ServerRuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerRuntimeConfig")
            .field("password", &"<redacted>")
            .field("key", &"<redacted>")
            .field("poll_period_ms", &self.poll_period_ms)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl ServerRuntimeConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;

        Self::from_toml_str(&text)
    }

    /// Parse and validate configuration text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that the schema alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::Invalid("no endpoints configured".to_string()));
        }

        if self.poll_period_ms == 0 {
            return Err(ConfigError::Invalid("poll_period_ms must be positive".to_string()));
        }

        for (i, spec) in self.endpoints.iter().enumerate() {
            if self.endpoints[..i].iter().any(|other| other.name == spec.name) {
                return Err(ConfigError::Invalid(format!("duplicate endpoint name {}", spec.name)));
            }
        }

        SecretKey::from_hex(&self.key)?;
        Ok(())
    }

    /// Poll period as a duration.
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    /// Endpoint secrets derived from the password and key.
    pub fn endpoint_config(&self) -> Result<EndpointConfig, ConfigError> {
        let key = SecretKey::from_hex(&self.key)?;
        Ok(EndpointConfig::new(&self.password, key))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn key_hex() -> String {
        "ab".repeat(32)
    }

    fn sample() -> String {
        format!(
            r#"
password = "pw"
key = "{}"

[[endpoints]]
name = "infant"
bind = "127.0.0.1:23456"
kelvin = 309.0

[[endpoints]]
name = "incubator"
bind = "127.0.0.1:23457"
"#,
            key_hex()
        )
    }

    #[test]
    fn parses_sample_with_defaults() {
        let config = ServerRuntimeConfig::from_toml_str(&sample()).unwrap();

        assert_eq!(config.poll_period(), DEFAULT_POLL_PERIOD);
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[0].kelvin, 309.0);
        assert_eq!(config.endpoints[1].kelvin, DEFAULT_KELVIN);
        assert_eq!(config.endpoints[1].bind, "127.0.0.1:23457".parse().unwrap());
    }

    #[test]
    fn endpoint_config_hashes_password() {
        let config = ServerRuntimeConfig::from_toml_str(&sample()).unwrap();
        let endpoint = config.endpoint_config().unwrap();

        assert_eq!(endpoint.password, thermonet_crypto::PasswordDigest::of_password("pw"));
        assert_eq!(endpoint.key.to_hex(), key_hex());
    }

    #[test]
    fn rejects_bad_key() {
        let text = sample().replace(&key_hex(), "abcd");
        let err = ServerRuntimeConfig::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Key(_)));
    }

    #[test]
    fn rejects_empty_endpoint_list() {
        let text = format!("password = \"pw\"\nkey = \"{}\"\nendpoints = []\n", key_hex());
        let err = ServerRuntimeConfig::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_poll_period() {
        let text = format!("poll_period_ms = 0\n{}", sample());
        let err = ServerRuntimeConfig::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_duplicate_names() {
        let text = sample().replace("incubator", "infant");
        let err = ServerRuntimeConfig::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_missing_password() {
        let text = sample().replace("password = \"pw\"", "");
        let err = ServerRuntimeConfig::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = ServerRuntimeConfig::from_toml_str(&sample()).unwrap();
        let debug = format!("{config:?}");

        assert!(!debug.contains(&key_hex()));
        assert!(!debug.contains("\"pw\""));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample().as_bytes()).unwrap();

        let config = ServerRuntimeConfig::load(file.path()).unwrap();
        assert_eq!(config.endpoints[0].name, "infant");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ServerRuntimeConfig::load("/nonexistent/thermonet.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
