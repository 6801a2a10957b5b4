// Error taxonomy for the TP pipeline
//
// Only whole-invocation failures live here. Row-level problems (bad numbers,
// short CSV lines, unmatched names) are recovered where they happen.

use std::path::PathBuf;
use thiserror::Error;

use crate::holdings::Pool;

/// Failure of the JSON-fetching collaborator
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {resource} failed: {source}")]
    Transport {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{resource} answered with status {status}")]
    Status { resource: String, status: u16 },

    #[error("{resource} did not return valid JSON: {reason}")]
    Decode { resource: String, reason: String },

    #[error("unknown resource: {0}")]
    NotFound(String),
}

/// Fatal error of one pipeline invocation
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{pool} snapshot unavailable: {source}")]
    SnapshotUnavailable {
        pool: Pool,
        #[source]
        source: FetchError,
    },

    #[error("{pool} snapshot is malformed: {reason}")]
    MalformedSnapshot { pool: Pool, reason: String },

    #[error("TP reference file {} unavailable: {source}", .path.display())]
    ReferenceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid or missing configuration value
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// A field that should hold a number did not
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumberError {
    #[error("field is absent")]
    Absent,

    #[error("not a number: {0}")]
    NotNumeric(String),

    #[error("number is not finite")]
    NotFinite,
}
