//! Configuration types.

use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CHAT_DELAY_MS: u64 = 1500;
const DEFAULT_WEATHER_DELAY_MS: u64 = 1000;
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

/// Server and mock-responder configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP / WebSocket listen port.
    pub port: u16,
    /// Simulated latency of the mock AI responder.
    pub chat_delay: Duration,
    /// Simulated latency of the mock weather responder.
    pub weather_delay: Duration,
    /// Allowed CORS origin. Permissive when unset.
    pub cors_origin: Option<String>,
    /// Sessions with no socket and no requests for this long are dropped.
    pub session_idle: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            chat_delay: Duration::from_millis(DEFAULT_CHAT_DELAY_MS),
            weather_delay: Duration::from_millis(DEFAULT_WEATHER_DELAY_MS),
            cors_origin: None,
            session_idle: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        }
    }
}

impl AppConfig {
    /// Load from `OUTFIT_PLANNER_*` environment variables.
    ///
    /// Unparseable values are logged and replaced by their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (used by `from_env` and tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = or_default(
            parse_var(&lookup, "OUTFIT_PLANNER_PORT"),
            defaults.port,
        );
        let chat_delay_ms = or_default(
            parse_var(&lookup, "OUTFIT_PLANNER_CHAT_DELAY_MS"),
            DEFAULT_CHAT_DELAY_MS,
        );
        let weather_delay_ms = or_default(
            parse_var(&lookup, "OUTFIT_PLANNER_WEATHER_DELAY_MS"),
            DEFAULT_WEATHER_DELAY_MS,
        );
        let session_idle_secs = or_default(
            parse_var(&lookup, "OUTFIT_PLANNER_SESSION_IDLE_SECS"),
            DEFAULT_SESSION_IDLE_SECS,
        );
        let cors_origin = lookup("OUTFIT_PLANNER_CORS_ORIGIN")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            port,
            chat_delay: Duration::from_millis(chat_delay_ms),
            weather_delay: Duration::from_millis(weather_delay_ms),
            cors_origin,
            session_idle: Duration::from_secs(session_idle_secs),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
    }
}

fn or_default<T>(parsed: Result<Option<T>, ConfigError>, default: T) -> T {
    match parsed {
        Ok(Some(v)) => v,
        Ok(None) => default,
        Err(e) => {
            warn!("{}, using default", e);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.chat_delay, Duration::from_millis(1500));
        assert_eq!(config.weather_delay, Duration::from_millis(1000));
        assert!(config.cors_origin.is_none());
        assert_eq!(config.session_idle, Duration::from_secs(1800));
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OUTFIT_PLANNER_PORT", "9090"),
            ("OUTFIT_PLANNER_CHAT_DELAY_MS", "10"),
            ("OUTFIT_PLANNER_WEATHER_DELAY_MS", " 20 "),
            ("OUTFIT_PLANNER_CORS_ORIGIN", "http://localhost:5173"),
            ("OUTFIT_PLANNER_SESSION_IDLE_SECS", "90"),
        ]));
        assert_eq!(config.port, 9090);
        assert_eq!(config.chat_delay, Duration::from_millis(10));
        assert_eq!(config.weather_delay, Duration::from_millis(20));
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:5173"));
        assert_eq!(config.session_idle, Duration::from_secs(90));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("OUTFIT_PLANNER_PORT", "not-a-port"),
            ("OUTFIT_PLANNER_CHAT_DELAY_MS", "-5"),
            ("OUTFIT_PLANNER_CORS_ORIGIN", "   "),
            ("OUTFIT_PLANNER_SESSION_IDLE_SECS", "soon"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.session_idle, Duration::from_secs(1800));
        assert_eq!(config.chat_delay, Duration::from_millis(1500));
        assert!(config.cors_origin.is_none());
    }

    #[test]
    fn parse_error_names_the_key() {
        let lookup = lookup_from(&[("OUTFIT_PLANNER_PORT", "99999")]);
        let err = parse_var::<u16>(&lookup, "OUTFIT_PLANNER_PORT").unwrap_err();
        assert!(err.to_string().contains("OUTFIT_PLANNER_PORT"));
    }
}
