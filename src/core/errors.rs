//! CTC-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, TempoError>;

/// Top-level error type for the tracker client.
#[derive(Debug, Error)]
pub enum TempoError {
    #[error("[CTC-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CTC-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[CTC-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[CTC-1101] missing credentials: {details} (run `cleevio-tempo-cli login`)")]
    MissingCredentials { details: String },

    #[error("[CTC-2001] {service} request failed: {details}")]
    Http {
        service: &'static str,
        details: String,
    },

    #[error("[CTC-2002] {service} responded with status {status}: {details}")]
    HttpStatus {
        service: &'static str,
        status: u16,
        details: String,
    },

    #[error("[CTC-2003] {service} rejected the credentials")]
    Unauthorized { service: &'static str },

    #[error("[CTC-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[CTC-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CTC-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[CTC-3101] terminal failure: {source}")]
    Terminal {
        #[source]
        source: std::io::Error,
    },

    #[error("[CTC-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl TempoError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "CTC-1001",
            Self::MissingConfig { .. } => "CTC-1002",
            Self::ConfigParse { .. } => "CTC-1003",
            Self::MissingCredentials { .. } => "CTC-1101",
            Self::Http { .. } => "CTC-2001",
            Self::HttpStatus { .. } => "CTC-2002",
            Self::Unauthorized { .. } => "CTC-2003",
            Self::Serialization { .. } => "CTC-2101",
            Self::Io { .. } => "CTC-3002",
            Self::ChannelClosed { .. } => "CTC-3003",
            Self::Terminal { .. } => "CTC-3101",
            Self::Runtime { .. } => "CTC-3900",
        }
    }

    /// Whether retrying on the next tick might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Http { .. } | Self::Io { .. } | Self::ChannelClosed { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for TempoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for TempoError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for TempoError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for TempoError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http {
            service: "http",
            details: value.to_string(),
        }
    }
}
