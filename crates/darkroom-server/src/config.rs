// ABOUTME: Configuration loading and validation for the darkroom server.
// ABOUTME: Reads environment variables with sensible defaults for home directory and bind address.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DARKROOM_BIND is not a valid socket address: {0}")]
    InvalidBind(String),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DarkroomConfig {
    pub home: PathBuf,
    pub bind: SocketAddr,
    pub public_base_url: String,
}

impl DarkroomConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - DARKROOM_HOME: data directory (default: ~/.darkroom)
    /// - DARKROOM_BIND: socket address to bind (default: 127.0.0.1:7341)
    /// - DARKROOM_PUBLIC_BASE_URL: public URL for the server (default: http://<bind>)
    pub fn from_env() -> Result<Self, ConfigError> {
        let home = std::env::var("DARKROOM_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                std::env::var("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/tmp"))
                    .join(".darkroom")
            });

        let bind_str =
            std::env::var("DARKROOM_BIND").unwrap_or_else(|_| "127.0.0.1:7341".to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let public_base_url = std::env::var("DARKROOM_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}", bind));

        Ok(Self {
            home,
            bind,
            public_base_url,
        })
    }
}
