//! Server configuration from the environment.

use crate::game::DEFAULT_BOARD_SIZE;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Allowed CORS origin; `None` means permissive.
    pub cors_origin: Option<String>,
    /// Side length of newly created boards.
    pub board_size: usize,
}

impl ServerConfig {
    /// Reads configuration from environment variables, with defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.port),
            cors_origin: std::env::var("CORS_ALLOWED_ORIGIN").ok(),
            board_size: std::env::var("BOARD_SIZE")
                .ok()
                .and_then(|value| value.parse().ok())
                .filter(|&n| n >= 2)
                .unwrap_or(defaults.board_size),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origin: None,
            board_size: DEFAULT_BOARD_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.board_size, 4);
        assert!(config.cors_origin.is_none());
    }
}
