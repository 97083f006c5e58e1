// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for privacybot

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PrivacyError>;

#[derive(Error, Debug)]
pub enum PrivacyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Unsupported by this session: {0}")]
    Unsupported(String),

    /// The page inspection session could not be started at all
    #[error("Inspection session unavailable: {0}")]
    SessionUnavailable(String),

    #[error("Check already registered: {0}")]
    DuplicateCheck(String),

    #[error("Unknown check: {0}")]
    UnknownCheck(String),
}

impl PrivacyError {
    /// Whether this error means the whole audit could not start
    pub fn is_session_failure(&self) -> bool {
        matches!(self, PrivacyError::SessionUnavailable(_))
    }
}
