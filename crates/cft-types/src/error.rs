//! Error types for Content Farm Terminator.

use std::io;

/// Errors produced by the interstitial and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CftError {
    #[error("malformed navigation intent: {0}")]
    MalformedIntent(String),

    #[error("warning context is retired")]
    Retired,

    #[error("channel error: {0}")]
    Channel(String),

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CftError>;
