// src/core/error.rs

//! Error taxonomy shared by every provider adapter and the orchestrator.
//!
//! Adapter errors are data: they are stored in the report slot of the provider
//! that produced them and are never propagated past the adapter boundary. The
//! only error the orchestrator returns to its caller is `InvalidInput`.

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// The category of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ScanErrorKind {
    /// A poll loop or request ran out of time.
    #[strum(serialize = "timed out")]
    Timeout,
    #[strum(serialize = "rate limited")]
    RateLimited,
    #[strum(serialize = "unauthorized")]
    Unauthorized,
    /// The provider answered with a payload we could not understand.
    #[strum(serialize = "malformed response")]
    MalformedResponse,
    #[strum(serialize = "network error")]
    NetworkError,
    /// A required credential is missing from the configuration.
    #[strum(serialize = "not configured")]
    NotConfigured,
    /// The provider accepted the request but reported that the job failed.
    #[strum(serialize = "provider failed")]
    ProviderFailed,
    /// The provider does not apply to this target (e.g. TLS grading on plain HTTP).
    #[strum(serialize = "skipped")]
    Skipped,
    /// The scan target could not be parsed. Aborts the whole scan.
    #[strum(serialize = "invalid input")]
    InvalidInput,
}

/// A structured failure from one provider.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{provider} {kind}: {message}")]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub provider: String,
    pub message: String,
}

impl ScanError {
    pub fn new(kind: ScanErrorKind, provider: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn timeout(provider: &str, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::Timeout, provider, message)
    }

    pub fn rate_limited(provider: &str, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::RateLimited, provider, message)
    }

    pub fn unauthorized(provider: &str, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::Unauthorized, provider, message)
    }

    pub fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::MalformedResponse, provider, message)
    }

    pub fn network(provider: &str, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::NetworkError, provider, message)
    }

    pub fn not_configured(provider: &str, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::NotConfigured, provider, message)
    }

    pub fn provider_failed(provider: &str, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::ProviderFailed, provider, message)
    }

    pub fn skipped(provider: &str, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::Skipped, provider, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::InvalidInput, "target", message)
    }

    /// Errors that may disappear on a later attempt. Reports carrying one are
    /// not cached.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ScanErrorKind::Timeout | ScanErrorKind::RateLimited | ScanErrorKind::NetworkError
        )
    }

    /// Short text shown by report renderers in place of a provider section.
    pub fn unavailable_reason(&self) -> String {
        format!("unavailable: {} ({})", self.message, self.kind)
    }
}

/// Reasons a raw input string cannot become a `ScanTarget`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("no URL was provided")]
    Empty,
    #[error("could not decode URL: {0}")]
    Decode(String),
    #[error("'{input}' is not a valid URL: {reason}")]
    Invalid { input: String, reason: String },
    #[error("unsupported scheme '{0}', only http and https can be scanned")]
    UnsupportedScheme(String),
    #[error("URL has no host name")]
    MissingHost,
}

impl From<TargetError> for ScanError {
    fn from(err: TargetError) -> Self {
        ScanError::invalid_input(err.to_string())
    }
}
