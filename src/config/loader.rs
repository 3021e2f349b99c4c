//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    /// An environment variable held a value that could not be parsed.
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => ServerConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment-style overrides read through `lookup`.
///
/// `PORT` accepts both `8080` and `:8080`; it replaces only the port of the
/// configured bind address.
pub fn apply_overrides<F>(config: &mut ServerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(port) = get("PORT") {
        let port: u16 = port
            .trim()
            .trim_start_matches(':')
            .parse()
            .map_err(|_| ConfigError::Env {
                var: "PORT",
                message: format!("'{}' is not a valid port", port),
            })?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }
    if let Some(path) = get("DB_PATH") {
        config.store.path = path;
    }
    if let Some(user_id) = get("BASIC_AUTH_USER_ID") {
        config.auth.user_id = user_id;
    }
    if let Some(password) = get("BASIC_AUTH_PASSWORD") {
        config.auth.password = password;
    }
    if let Some(tz) = get("LOG_TIMEZONE") {
        config.observability.timezone = tz;
    }
    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(format) = get("LOG_FORMAT") {
        config.observability.log_format = format
            .parse()
            .map_err(|message| ConfigError::Env { var: "LOG_FORMAT", message })?;
    }
    if let Some(secs) = get("SHUTDOWN_TIMEOUT_SECS") {
        config.shutdown.timeout_secs = parse_number("SHUTDOWN_TIMEOUT_SECS", &secs)?;
    }
    if let Some(ms) = get("HEALTHZ_DELAY_MS") {
        config.health.delay_ms = parse_number("HEALTHZ_DELAY_MS", &ms)?;
    }

    Ok(())
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        message: format!("'{}' is not a non-negative integer", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn port_override_accepts_colon_prefix() {
        let mut config = ServerConfig::default();
        apply_overrides(&mut config, env(&[("PORT", ":9999")])).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:9999");

        apply_overrides(&mut config, env(&[("PORT", "8081")])).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8081");
    }

    #[test]
    fn credentials_and_paths_come_from_env() {
        let mut config = ServerConfig::default();
        apply_overrides(
            &mut config,
            env(&[
                ("BASIC_AUTH_USER_ID", "admin"),
                ("BASIC_AUTH_PASSWORD", "pw"),
                ("DB_PATH", "/tmp/todo.db"),
                ("LOG_FORMAT", "json"),
            ]),
        )
        .unwrap();

        assert_eq!(config.auth.user_id, "admin");
        assert_eq!(config.auth.password, "pw");
        assert_eq!(config.store.path, "/tmp/todo.db");
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn empty_values_are_ignored() {
        let mut config = ServerConfig::default();
        apply_overrides(&mut config, env(&[("DB_PATH", "  ")])).unwrap();
        assert_eq!(config.store.path, ".sqlite3/todo.db");
    }

    #[test]
    fn invalid_numbers_are_errors() {
        let mut config = ServerConfig::default();
        let err = apply_overrides(&mut config, env(&[("SHUTDOWN_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "SHUTDOWN_TIMEOUT_SECS", .. }));

        let err = apply_overrides(&mut config, env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "PORT", .. }));
    }
}
