// src/config/server.rs
// Server, logging, and session configuration

use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: super::helpers::env_or("SAWT_HOST", "0.0.0.0"),
            port: super::helpers::env_or("SAWT_PORT", "8040")
                .parse()
                .unwrap_or(8040),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration, including the safety audit file sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub audit_log_path: String,
    pub audit_max_bytes: u64,
    pub audit_max_backups: usize,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            level: super::helpers::env_or("SAWT_LOG_LEVEL", "info"),
            audit_log_path: super::helpers::env_or(
                "SAWT_AUDIT_LOG_PATH",
                "logs/safety_audit.log",
            ),
            audit_max_bytes: super::helpers::env_u64("SAWT_AUDIT_MAX_BYTES", 10 * 1024 * 1024),
            audit_max_backups: super::helpers::env_usize("SAWT_AUDIT_MAX_BACKUPS", 5),
        }
    }
}

/// Per-connection session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sliding window over conversation history, counted in messages.
    /// Trimming removes whole user/assistant pairs from the front.
    pub history_max_messages: usize,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self {
            history_max_messages: super::helpers::env_usize("SAWT_HISTORY_MAX_MESSAGES", 40),
        }
    }
}
