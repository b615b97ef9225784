//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Explicit SQLite database path. When unset the platform data
    /// directory is used.
    /// Env: `GUICHET_DB_PATH`
    pub db_path: Option<PathBuf>,

    /// Session lifetime in seconds.
    /// Env: `SESSION_TTL_SECS`
    /// Default: 8 hours.
    pub session_ttl_secs: u64,

    /// First-run bootstrap account, created as `super_admin` when the
    /// user table is empty.
    /// Env: `GUICHET_ADMIN_USERNAME`, `GUICHET_ADMIN_EMAIL`,
    /// `GUICHET_ADMIN_PASSWORD`
    pub admin_username: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            db_path: None,
            session_ttl_secs: 8 * 60 * 60,
            admin_username: None,
            admin_email: None,
            admin_password: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(path) = std::env::var("GUICHET_DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Ok(val) = std::env::var("SESSION_TTL_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.session_ttl_secs = secs;
            } else {
                tracing::warn!(value = %val, "Invalid SESSION_TTL_SECS, using default");
            }
        }

        if let Ok(username) = std::env::var("GUICHET_ADMIN_USERNAME") {
            if !username.is_empty() {
                config.admin_username = Some(username);
            }
        }
        if let Ok(email) = std::env::var("GUICHET_ADMIN_EMAIL") {
            if !email.is_empty() {
                config.admin_email = Some(email);
            }
        }
        if let Ok(password) = std::env::var("GUICHET_ADMIN_PASSWORD") {
            if !password.is_empty() {
                config.admin_password = Some(password);
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
