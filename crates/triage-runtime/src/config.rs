//! Runtime settings.
//!
//! Settings come from three layers, later layers winning:
//! 1. Built-in defaults
//! 2. An optional YAML file
//! 3. Environment variables
//!
//! [`Settings::validate`] runs after loading so a bad deployment fails at
//! startup rather than on the first ticket.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::providers::{ApiCredential, CredentialSource, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::resilience::CircuitBreakerConfig;

/// Minimum accepted value for `max_input_length`.
pub const MIN_INPUT_LENGTH: usize = 100;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Map a configured log level onto a `tracing` level name.
///
/// Case-insensitive. `warning` is accepted for `warn`, and `critical` or
/// `fatal` for `error`.
pub fn normalize_log_level(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" | "critical" | "fatal" => Some("error"),
        _ => None,
    }
}

/// Errors from loading or validating settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" => Some(Environment::Development),
            "staging" => Some(Environment::Staging),
            "production" => Some(Environment::Production),
            _ => None,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub environment: Environment,

    /// Default log filter, overridable by `RUST_LOG`
    pub log_level: String,

    /// Maximum ticket length in characters
    pub max_input_length: usize,

    /// Retries after the first attempt (timeouts only)
    pub max_retries: u32,

    /// Per-attempt timeout
    pub timeout_seconds: u64,

    /// Chat-completions endpoint for the remote caller
    pub endpoint: String,

    /// Model name for the remote caller
    pub model: String,

    pub circuit_breaker: CircuitBreakerConfig,

    /// Never serialised; loaded from `api_key` or `LLM_API_KEY`
    #[serde(skip)]
    pub credential: Option<Arc<ApiCredential>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            log_level: "INFO".to_string(),
            max_input_length: 5000,
            max_retries: 2,
            timeout_seconds: 30,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            circuit_breaker: CircuitBreakerConfig::default(),
            credential: None,
        }
    }
}

/// On-disk shape: settings plus an optional inline key.
#[derive(Deserialize)]
struct SettingsFile {
    #[serde(flatten)]
    settings: Settings,
    #[serde(default)]
    api_key: Option<String>,
}

impl Settings {
    /// Defaults overridden by the process environment, then validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    /// YAML file overridden by the process environment, then validated.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse YAML without applying overrides or validation.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        let file: SettingsFile = serde_yaml::from_str(text)?;
        let mut settings = file.settings;
        if let Some(key) = file.api_key {
            settings.credential = Some(Arc::new(ApiCredential::new(
                key,
                CredentialSource::Config,
                "LLM API key",
            )));
        }
        Ok(settings)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ENVIRONMENT") {
            self.environment = Environment::parse(&value).ok_or(ConfigError::InvalidEnv {
                var: "ENVIRONMENT",
                value,
            })?;
        }
        if let Some(value) = lookup("LOG_LEVEL") {
            self.log_level = value;
        }
        if let Some(value) = lookup("MAX_INPUT_LENGTH") {
            self.max_input_length = parse_number("MAX_INPUT_LENGTH", value)?;
        }
        if let Some(value) = lookup("MAX_RETRIES") {
            self.max_retries = parse_number("MAX_RETRIES", value)?;
        }
        if let Some(value) = lookup("TIMEOUT_SECONDS") {
            self.timeout_seconds = parse_number("TIMEOUT_SECONDS", value)?;
        }
        if let Some(value) = lookup("LLM_ENDPOINT") {
            self.endpoint = value;
        }
        if let Some(value) = lookup("LLM_MODEL") {
            self.model = value;
        }
        if let Some(value) = lookup("LLM_API_KEY") {
            self.credential = Some(Arc::new(ApiCredential::new(
                value,
                CredentialSource::Environment,
                "LLM API key",
            )));
        }
        Ok(())
    }

    /// Reject settings the runtime cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if normalize_log_level(&self.log_level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "log_level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.log_level
            )));
        }
        if self.max_input_length < MIN_INPUT_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "max_input_length must be at least {}, got {}",
                MIN_INPUT_LENGTH, self.max_input_length
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "timeout_seconds must be positive".to_string(),
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "circuit_breaker.failure_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Level name for the log filter; `info` if the setting is unrecognised.
    pub fn log_filter(&self) -> &'static str {
        normalize_log_level(&self.log_level).unwrap_or("info")
    }

    /// Whether a usable credential is configured (otherwise stub mode).
    pub fn credential_present(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| c.is_usable())
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// `"llm"` with a usable credential, `"stub"` otherwise.
    pub fn mode(&self) -> &'static str {
        if self.credential_present() {
            "llm"
        } else {
            "stub"
        }
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Development);
        assert_eq!(settings.log_level, "INFO");
        assert_eq!(settings.max_input_length, 5000);
        assert_eq!(settings.max_retries, 2);
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert_eq!(settings.circuit_breaker.failure_threshold, 5);
        assert_eq!(
            settings.circuit_breaker.recovery_timeout,
            Duration::from_secs(60)
        );
        assert!(!settings.credential_present());
        assert_eq!(settings.mode(), "stub");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(lookup(&[
                ("ENVIRONMENT", "production"),
                ("LOG_LEVEL", "debug"),
                ("MAX_INPUT_LENGTH", "8000"),
                ("MAX_RETRIES", "4"),
                ("TIMEOUT_SECONDS", "10"),
                ("LLM_MODEL", "gpt-4o"),
                ("LLM_API_KEY", "sk-live"),
            ]))
            .unwrap();

        assert_eq!(settings.environment, Environment::Production);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.max_input_length, 8000);
        assert_eq!(settings.max_retries, 4);
        assert_eq!(settings.timeout_seconds, 10);
        assert_eq!(settings.model, "gpt-4o");
        assert!(settings.credential_present());
        assert_eq!(settings.mode(), "llm");
    }

    #[test]
    fn test_mock_key_means_stub_mode() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(lookup(&[("LLM_API_KEY", "mock")]))
            .unwrap();
        assert!(settings.credential.is_some());
        assert!(!settings.credential_present());
        assert_eq!(settings.mode(), "stub");
    }

    #[test]
    fn test_bad_number_names_variable() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(lookup(&[("MAX_RETRIES", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("MAX_RETRIES"));
    }

    #[test]
    fn test_unknown_environment_rejected() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(lookup(&[("ENVIRONMENT", "qa")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: "ENVIRONMENT", .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let short = Settings {
            max_input_length: 10,
            ..Settings::default()
        };
        assert!(short.validate().is_err());

        let no_timeout = Settings {
            timeout_seconds: 0,
            ..Settings::default()
        };
        assert!(no_timeout.validate().is_err());

        let loud = Settings {
            log_level: "VERBOSE".to_string(),
            ..Settings::default()
        };
        assert!(loud.validate().is_err());

        let mut breaker = Settings::default();
        breaker.circuit_breaker.failure_threshold = 0;
        assert!(breaker.validate().is_err());
    }

    #[test]
    fn test_log_level_aliases() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(lookup(&[("LOG_LEVEL", "WARNING")]))
            .unwrap();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.log_filter(), "warn");

        settings
            .apply_overrides(lookup(&[("LOG_LEVEL", "CRITICAL")]))
            .unwrap();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.log_filter(), "error");

        assert_eq!(Settings::default().log_filter(), "info");
        assert_eq!(normalize_log_level("Debug"), Some("debug"));
        assert_eq!(normalize_log_level("verbose"), None);
    }

    #[test]
    fn test_yaml_partial_file_keeps_defaults() {
        let yaml = r#"
environment: staging
max_retries: 1
circuit_breaker:
  failure_threshold: 3
  recovery_timeout: 15
api_key: sk-from-file
"#;
        let settings = Settings::from_yaml_str(yaml).unwrap();
        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.max_retries, 1);
        assert_eq!(settings.timeout_seconds, 30);
        assert_eq!(settings.circuit_breaker.failure_threshold, 3);
        assert_eq!(
            settings.circuit_breaker.recovery_timeout,
            Duration::from_secs(15)
        );
        let credential = settings.credential.as_ref().unwrap();
        assert_eq!(credential.source(), CredentialSource::Config);
        assert!(settings.credential_present());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Settings::from_yaml_file("/nonexistent/triage-settings.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_credential_never_serialised() {
        let settings = Settings {
            credential: Some(Arc::new(ApiCredential::new(
                "sk-secret-value",
                CredentialSource::Programmatic,
                "LLM API key",
            ))),
            ..Settings::default()
        };
        let yaml = serde_yaml::to_string(&settings).unwrap();
        assert!(!yaml.contains("sk-secret-value"));
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("sk-secret-value"));
    }
}
