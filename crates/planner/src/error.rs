//! Error types for the planner

use thiserror::Error;

/// Result type alias using the planner Error
pub type Result<T> = std::result::Result<T, Error>;

/// Planner error types
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Common(#[from] headerprobe_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Persisting response for {label} failed after {attempts} attempts: {source}")]
    UpsertExhausted {
        label: String,
        attempts: u32,
        #[source]
        source: headerprobe_common::Error,
    },

    #[error("Unknown header family: {0}")]
    UnknownFamily(String),
}

/// Malformed template metadata.
///
/// Fatal to the offending template only; the rest of the plan still builds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("template {file} ({label}): {reason}")]
pub struct TemplateError {
    pub file: String,
    pub label: String,
    pub reason: String,
}
