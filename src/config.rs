use std::net::SocketAddr;
use std::time::Duration;

// ── Constants ────────────────────────────────────────────────────────────────

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const PORT_ENV: &str = "PORT";
const FETCH_TIMEOUT_ENV: &str = "IMAGE_LISTER_FETCH_TIMEOUT_SECS";
const INSECURE_ENV: &str = "IMAGE_LISTER_INSECURE_SSL";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORT must be a port number, got {0:?}")]
    InvalidPort(String),
    #[error("IMAGE_LISTER_FETCH_TIMEOUT_SECS must be a positive number of seconds, got {0:?}")]
    InvalidTimeout(String),
}

// ── Startup configuration ────────────────────────────────────────────────────

/// Read once in `main` and handed to the server; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub fetch_timeout: Duration,
    pub connect_timeout: Duration,
    pub insecure_tls: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            connect_timeout: CONNECT_TIMEOUT,
            insecure_tls: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(raw) = lookup(PORT_ENV) {
            config.port = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?;
        }

        if let Some(raw) = lookup(FETCH_TIMEOUT_ENV) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            if secs == 0 {
                return Err(ConfigError::InvalidTimeout(raw));
            }
            config.fetch_timeout = Duration::from_secs(secs);
        }

        config.insecure_tls = lookup(INSECURE_ENV).as_deref() == Some("1");

        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert!(!config.insecure_tls);
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn reads_port_and_timeout() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("IMAGE_LISTER_FETCH_TIMEOUT_SECS", "3"),
            ("IMAGE_LISTER_INSECURE_SSL", "1"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert!(config.insecure_tls);
    }

    #[test]
    fn rejects_bad_values() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(_)));

        let err = Config::from_lookup(lookup_from(&[("IMAGE_LISTER_FETCH_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));
    }
}
