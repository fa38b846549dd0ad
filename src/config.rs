//! Configuration for the payment client.
//!
//! The protocol version and the timing knobs are passed explicitly to
//! [`ExactEvmClient`](crate::v1_evm_exact::client::ExactEvmClient); nothing
//! here is global state.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::chain::EvmChainReference;
use crate::networks::known_evm_chains;

/// The h402 protocol revision stamped into every payload envelope.
pub const H402_VERSION: u8 = 1;

/// Default lifetime of a transfer authorization, in seconds.
pub const DEFAULT_AUTHORIZATION_VALIDITY_SECS: u64 = 300;

/// Longest accepted authorization lifetime, in seconds (one day).
pub const MAX_AUTHORIZATION_VALIDITY_SECS: u64 = 86_400;

/// Client configuration.
///
/// Durations are expressed in whole seconds on the wire:
///
/// ```
/// use h402_chain_evm::config::ExactEvmClientConfig;
///
/// let config: ExactEvmClientConfig =
///     serde_json::from_str(r#"{"authorizationValiditySecs": 60}"#).unwrap();
/// assert_eq!(config.protocol_version, 1);
/// assert_eq!(config.authorization_validity.as_secs(), 60);
/// assert!(config.confirmation_timeout.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmClientConfig {
    /// Protocol version written to the `version` envelope field.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u8,

    /// Upper bound on how long a signed authorization stays valid.
    #[serde(
        rename = "authorizationValiditySecs",
        default = "default_authorization_validity",
        with = "duration_secs"
    )]
    pub authorization_validity: Duration,

    /// Bound on waiting for a fallback transaction to be mined.
    ///
    /// `None` leaves the wait to the wallet's own timeout.
    #[serde(
        rename = "confirmationTimeoutSecs",
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_duration_secs"
    )]
    pub confirmation_timeout: Option<Duration>,

    /// Chains the client agrees to pay on. Defaults to the known networks.
    #[serde(
        default = "known_evm_chains",
        skip_serializing_if = "is_default_supported_chains"
    )]
    pub supported_chains: Vec<EvmChainReference>,
}

impl Default for ExactEvmClientConfig {
    fn default() -> Self {
        Self {
            protocol_version: H402_VERSION,
            authorization_validity: default_authorization_validity(),
            confirmation_timeout: None,
            supported_chains: known_evm_chains(),
        }
    }
}

impl ExactEvmClientConfig {
    /// Reads the configuration from the environment.
    ///
    /// - `H402_VERSION` - protocol version (default: 1)
    /// - `H402_AUTHORIZATION_VALIDITY_SECS` - authorization window (default: 300)
    /// - `H402_CONFIRMATION_TIMEOUT_SECS` - fallback confirmation bound (default: unset)
    /// - `H402_SUPPORTED_CHAIN_IDS` - comma-separated chain ids (default: known networks)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(version) = read_var::<u8>("H402_VERSION")? {
            config.protocol_version = version;
        }
        if let Some(secs) = read_var::<u64>("H402_AUTHORIZATION_VALIDITY_SECS")? {
            config.authorization_validity = Duration::from_secs(secs);
        }
        if let Some(secs) = read_var::<u64>("H402_CONFIRMATION_TIMEOUT_SECS")? {
            config.confirmation_timeout = Some(Duration::from_secs(secs));
        }
        if let Ok(raw) = env::var("H402_SUPPORTED_CHAIN_IDS") {
            config.supported_chains = parse_chain_list(&raw).ok_or(ConfigError::InvalidVar {
                name: "H402_SUPPORTED_CHAIN_IDS",
                value: raw,
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Sets the authorization validity window.
    pub fn with_authorization_validity(mut self, validity: Duration) -> Self {
        self.authorization_validity = validity;
        self
    }

    /// Sets the confirmation timeout for fallback transactions.
    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = Some(timeout);
        self
    }

    /// Replaces the set of chains the client pays on.
    pub fn with_supported_chains(
        mut self,
        chains: impl IntoIterator<Item = EvmChainReference>,
    ) -> Self {
        self.supported_chains = chains.into_iter().collect();
        self
    }

    /// Whether payments on `chain` are allowed.
    pub fn supports_chain(&self, chain: EvmChainReference) -> bool {
        self.supported_chains.contains(&chain)
    }

    /// Checks invariants the client relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let validity = self.authorization_validity.as_secs();
        if validity == 0 {
            return Err(ConfigError::Invalid(
                "authorization validity must be at least one second".to_string(),
            ));
        }
        if validity > MAX_AUTHORIZATION_VALIDITY_SECS {
            return Err(ConfigError::Invalid(format!(
                "authorization validity of {validity}s exceeds the maximum of {MAX_AUTHORIZATION_VALIDITY_SECS}s"
            )));
        }
        if self.supported_chains.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one supported chain is required".to_string(),
            ));
        }
        Ok(())
    }
}

fn read_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { name, value: raw }),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidVar {
            name,
            value: "<non-unicode>".to_string(),
        }),
    }
}

fn parse_chain_list(raw: &str) -> Option<Vec<EvmChainReference>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

fn is_default_supported_chains(chains: &[EvmChainReference]) -> bool {
    chains == known_evm_chains().as_slice()
}

fn default_protocol_version() -> u8 {
    H402_VERSION
}

fn default_authorization_validity() -> Duration {
    Duration::from_secs(DEFAULT_AUTHORIZATION_VALIDITY_SECS)
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

mod opt_duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|v| v.map(Duration::from_secs))
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable holds an unparsable value.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidVar { name: &'static str, value: String },
    /// The configuration violates an invariant.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExactEvmClientConfig::default();
        assert_eq!(config.protocol_version, H402_VERSION);
        assert_eq!(config.authorization_validity, Duration::from_secs(300));
        assert!(config.confirmation_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = ExactEvmClientConfig::default()
            .with_authorization_validity(Duration::from_secs(90))
            .with_confirmation_timeout(Duration::from_secs(30));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(
            json,
            r#"{"protocolVersion":1,"authorizationValiditySecs":90,"confirmationTimeoutSecs":30}"#
        );
        let back: ExactEvmClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_config_empty_json_uses_defaults() {
        let config: ExactEvmClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ExactEvmClientConfig::default());
    }

    #[test]
    fn test_oversized_validity_is_rejected() {
        let config = ExactEvmClientConfig::default()
            .with_authorization_validity(Duration::from_secs(u64::MAX));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ExactEvmClientConfig::default().with_authorization_validity(
            Duration::from_secs(MAX_AUTHORIZATION_VALIDITY_SECS),
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_supported_chains() {
        let config = ExactEvmClientConfig::default();
        assert!(config.supports_chain(EvmChainReference::new(8453)));
        assert!(config.supports_chain(EvmChainReference::new(56)));
        assert!(!config.supports_chain(EvmChainReference::new(999_999_999)));

        let config = config.with_supported_chains([EvmChainReference::new(137)]);
        assert!(config.supports_chain(EvmChainReference::new(137)));
        assert!(!config.supports_chain(EvmChainReference::new(8453)));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["supportedChains"], serde_json::json!(["137"]));

        assert!(config.with_supported_chains([]).validate().is_err());
    }

    #[test]
    fn test_parse_chain_list() {
        assert_eq!(
            parse_chain_list("8453, 56,"),
            Some(vec![EvmChainReference::new(8453), EvmChainReference::new(56)])
        );
        assert_eq!(parse_chain_list("8453,base"), None);
    }

    #[test]
    fn test_zero_validity_is_rejected() {
        let config =
            ExactEvmClientConfig::default().with_authorization_validity(Duration::from_secs(0));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
