// src/error.rs

//! Unified error handling for the crawler application.

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// The hidden __VIEWSTATE field is absent from a form response
    #[error("missing __VIEWSTATE field in {context}")]
    MissingViewState { context: String },

    /// A response has fewer select elements than the form chain expects
    #[error("select #{index} not found in {context}")]
    MissingSelect { index: usize, context: String },

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a missing-view-state error for the given page context.
    pub fn missing_view_state(context: impl Into<String>) -> Self {
        Self::MissingViewState {
            context: context.into(),
        }
    }

    /// Create a missing-select error for the given page context.
    pub fn missing_select(index: usize, context: impl Into<String>) -> Self {
        Self::MissingSelect {
            index,
            context: context.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
