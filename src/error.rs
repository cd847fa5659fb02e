//! Error types for wafprobe

use thiserror::Error;

/// Main error type for wafprobe operations
#[derive(Debug, Error)]
pub enum WafProbeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Target unreachable: {0}")]
    TargetUnreachable(String),
}

/// Result type alias for wafprobe operations
pub type Result<T> = std::result::Result<T, WafProbeError>;
