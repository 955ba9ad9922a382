use secrecy::SecretString;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::Level;

/// Default endpoint of the OpenAI Realtime API, with the model pinned in the query.
pub const DEFAULT_REALTIME_URL: &str =
    "wss://api.openai.com/v1/realtime?model=gpt-4o-realtime-preview-2024-10-01";

const DEFAULT_PORT: u16 = 8080;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Debug)]
pub struct Config {
    /// Address the client-facing WebSocket listener binds to.
    pub bind_address: SocketAddr,
    /// Address of the liveness responder, always one port above `bind_address`.
    pub health_address: SocketAddr,
    pub openai_api_key: SecretString,
    pub realtime_url: String,
    pub log_level: Level,
    /// Optional file replacing the built-in session instructions.
    pub instructions_path: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let port = match std::env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?,
            Err(_) => DEFAULT_PORT,
        };
        let health_port = port.checked_add(1).ok_or_else(|| {
            ConfigError::InvalidValue(
                "PORT".to_string(),
                format!("{} leaves no room for the health check port", port),
            )
        })?;

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;

        let realtime_url = std::env::var("OPENAI_REALTIME_URL")
            .unwrap_or_else(|_| DEFAULT_REALTIME_URL.to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let instructions_path = std::env::var("INSTRUCTIONS_PATH").ok().map(PathBuf::from);

        Ok(Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            health_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, health_port)),
            openai_api_key,
            realtime_url,
            log_level,
            instructions_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("PORT");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("OPENAI_REALTIME_URL");
            env::remove_var("RUST_LOG");
            env::remove_var("INSTRUCTIONS_PATH");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:8080");
        assert_eq!(config.health_address.to_string(), "0.0.0.0:8081");
        assert_eq!(config.openai_api_key.expose_secret(), "test-openai-key");
        assert_eq!(config.realtime_url, DEFAULT_REALTIME_URL);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.instructions_path, None);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("PORT", "9000");
            env::set_var("OPENAI_API_KEY", "custom-openai-key");
            env::set_var("OPENAI_REALTIME_URL", "ws://127.0.0.1:4000/realtime");
            env::set_var("RUST_LOG", "debug");
            env::set_var("INSTRUCTIONS_PATH", "/custom/instructions.md");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.port(), 9000);
        assert_eq!(config.health_address.port(), 9001);
        assert_eq!(config.realtime_url, "ws://127.0.0.1:4000/realtime");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(
            config.instructions_path,
            Some(PathBuf::from("/custom/instructions.md"))
        );
    }

    #[test]
    #[serial]
    fn test_config_missing_openai_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("OPENAI_API_KEY")),
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_port() {
        clear_env_vars();
        unsafe {
            env::set_var("PORT", "not-a-port");
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "PORT"),
            _ => panic!("Expected InvalidValue for PORT"),
        }
    }

    #[test]
    #[serial]
    fn test_config_port_without_room_for_health_check() {
        clear_env_vars();
        unsafe {
            env::set_var("PORT", "65535");
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, reason) => {
                assert_eq!(var, "PORT");
                assert!(reason.contains("65535"));
            }
            _ => panic!("Expected InvalidValue for PORT"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }

    #[test]
    fn test_config_debug_redacts_api_key() {
        let config = Config {
            bind_address: "127.0.0.1:8080".parse().unwrap(),
            health_address: "127.0.0.1:8081".parse().unwrap(),
            openai_api_key: SecretString::from("sk-very-secret".to_string()),
            realtime_url: DEFAULT_REALTIME_URL.to_string(),
            log_level: Level::INFO,
            instructions_path: None,
        };

        assert!(!format!("{:?}", config).contains("sk-very-secret"));
    }
}
