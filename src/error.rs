// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Error types for the firmware notifier

use axum::http::StatusCode;
use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// CAPTCHA token rejected by the verifier
    #[error("Captcha verification failed")]
    CaptchaFailed,

    /// Device has no firmware history upstream
    #[error("Unsupported device: {0}")]
    UnsupportedDevice(String),

    /// Catalog or firmware source could not be reached
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Unsubscribe token unknown or already used
    #[error("No active subscription found for the provided token")]
    InvalidOrConsumedToken,

    /// Notification template missing
    #[error("Template {0} not found")]
    TemplateNotFound(String),

    /// Notification could not be handed to the mail relay
    #[error("Notification error: {0}")]
    Notification(String),

    /// Subscription or cache storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON encoding or decoding failure
    #[error("Serialization error")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),

    /// Address parsing error
    #[error("Address parse error")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        Self::Storage(format!("migration failed: {error}"))
    }
}

impl AppError {
    /// HTTP status equivalent of the error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UnsupportedDevice(_) => StatusCode::BAD_REQUEST,
            Self::CaptchaFailed => StatusCode::FORBIDDEN,
            Self::InvalidOrConsumedToken => StatusCode::NOT_FOUND,
            Self::UpstreamUnavailable(_)
            | Self::TemplateNotFound(_)
            | Self::Notification(_)
            | Self::Storage(_)
            | Self::Serialization(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::AddrParse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convenient alias for Result with application error
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation("Missing email or device".to_string());
        assert_eq!(err.to_string(), "Validation error: Missing email or device");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_captcha_failed_is_forbidden() {
        assert_eq!(AppError::CaptchaFailed.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_unsupported_device() {
        let err = AppError::UnsupportedDevice("Foo1,1".to_string());
        assert_eq!(err.to_string(), "Unsupported device: Foo1,1");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_consumed_token_is_not_found() {
        assert_eq!(
            AppError::InvalidOrConsumedToken.status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_upstream_unavailable_is_server_error() {
        let err = AppError::UpstreamUnavailable("timeout".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_template_not_found() {
        let err = AppError::TemplateNotFound("email_version".to_string());
        assert_eq!(err.to_string(), "Template email_version not found");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_addr_parse_error_conversion() {
        let parse_result = "invalid".parse::<std::net::IpAddr>();
        assert!(parse_result.is_err());
        let app_err: AppError = parse_result.unwrap_err().into();
        assert!(matches!(app_err, AppError::AddrParse(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Serialization(_)));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let app_err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(app_err, AppError::Storage(_)));
    }
}
