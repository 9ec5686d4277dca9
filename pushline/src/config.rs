use std::time::Duration;

use crate::error::Error;

const PRODUCTION_HOST: &str = "api.push.apple.com";
const SANDBOX_HOST: &str = "api.development.push.apple.com";
const DEFAULT_PORT: u16 = 443;
const ALTERNATIVE_PORT: u16 = 2197;

/// Which push service deployment to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

/// Host and port of the push service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

/// Connection retry behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total connect attempts before giving up. Must be > 0.
    pub max_attempts: u32,
    /// Wait between failed attempts. Zero retries immediately.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }
}

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub environment: Environment,
    /// Use port 2197 instead of 443.
    pub alternative_port: bool,
    pub connect: RetryPolicy,
    /// Upper bound on the wait for each stream's response. `None` waits
    /// forever, so a single hung stream stalls the whole batch.
    pub response_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn sandbox() -> Self {
        Self {
            environment: Environment::Sandbox,
            ..Default::default()
        }
    }

    /// The host and port selected by `environment` and `alternative_port`.
    pub fn endpoint(&self) -> Endpoint {
        let host = match self.environment {
            Environment::Production => PRODUCTION_HOST,
            Environment::Sandbox => SANDBOX_HOST,
        };
        let port = if self.alternative_port {
            ALTERNATIVE_PORT
        } else {
            DEFAULT_PORT
        };
        Endpoint {
            host: host.to_string(),
            port,
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), Error> {
        if self.connect.max_attempts == 0 {
            return Err(Error::Config("connect.max_attempts must be > 0".into()));
        }
        if self.response_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::Config("response_timeout must be non-zero".into()));
        }
        Ok(())
    }

    /// Build a configuration from environment variables.
    ///
    /// Uses:
    /// - `APNS_SANDBOX` (`1`/`true`/`yes`) to select the sandbox environment
    /// - `APNS_ALTERNATIVE_PORT` (`1`/`true`/`yes`) to use port 2197
    /// - `APNS_CONNECT_ATTEMPTS` for the connect retry budget
    /// - `APNS_CONNECT_RETRY_DELAY_MS` for the wait between attempts
    /// - `APNS_RESPONSE_TIMEOUT_MS` for the per-stream response timeout
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();

        if let Some(value) = lookup("APNS_SANDBOX")
            && parse_flag("APNS_SANDBOX", &value)?
        {
            config.environment = Environment::Sandbox;
        }
        if let Some(value) = lookup("APNS_ALTERNATIVE_PORT") {
            config.alternative_port = parse_flag("APNS_ALTERNATIVE_PORT", &value)?;
        }
        if let Some(value) = lookup("APNS_CONNECT_ATTEMPTS") {
            config.connect.max_attempts = parse_number("APNS_CONNECT_ATTEMPTS", &value)?;
        }
        if let Some(value) = lookup("APNS_CONNECT_RETRY_DELAY_MS") {
            let ms: u64 = parse_number("APNS_CONNECT_RETRY_DELAY_MS", &value)?;
            config.connect.delay = Duration::from_millis(ms);
        }
        if let Some(value) = lookup("APNS_RESPONSE_TIMEOUT_MS") {
            let ms: u64 = parse_number("APNS_RESPONSE_TIMEOUT_MS", &value)?;
            config.response_timeout = Some(Duration::from_millis(ms));
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(Error::Config(format!("{key}: expected a boolean, got {other:?}"))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key}: expected a number, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn default_endpoint_is_production() {
        let endpoint = ClientConfig::default().endpoint();
        assert_eq!(endpoint.host, "api.push.apple.com");
        assert_eq!(endpoint.port, 443);
    }

    #[test]
    fn sandbox_alternative_port() {
        let config = ClientConfig {
            alternative_port: true,
            ..ClientConfig::sandbox()
        };
        let endpoint = config.endpoint();
        assert_eq!(endpoint.host, "api.development.push.apple.com");
        assert_eq!(endpoint.port, 2197);
    }

    #[test]
    fn default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert!(policy.delay.is_zero());
    }

    #[test]
    fn zero_attempts_rejected() {
        let mut config = ClientConfig::default();
        config.connect.max_attempts = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn from_lookup_reads_all_keys() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("APNS_SANDBOX", "true"),
            ("APNS_ALTERNATIVE_PORT", "1"),
            ("APNS_CONNECT_ATTEMPTS", "5"),
            ("APNS_CONNECT_RETRY_DELAY_MS", "250"),
            ("APNS_RESPONSE_TIMEOUT_MS", "10000"),
        ]))
        .unwrap();
        assert_eq!(config.environment, Environment::Sandbox);
        assert!(config.alternative_port);
        assert_eq!(config.connect.max_attempts, 5);
        assert_eq!(config.connect.delay, Duration::from_millis(250));
        assert_eq!(config.response_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn from_lookup_empty_is_default() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.connect, RetryPolicy::default());
        assert_eq!(config.response_timeout, None);
    }

    #[test]
    fn from_lookup_rejects_garbage() {
        assert!(ClientConfig::from_lookup(lookup(&[("APNS_SANDBOX", "maybe")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("APNS_CONNECT_ATTEMPTS", "x")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("APNS_CONNECT_ATTEMPTS", "0")])).is_err());
    }
}
