//! Shared value types for weighted transducers.
//!
//! This crate holds the pieces that the transducer engine treats as plain
//! values: symbolic weights, numeric parameter sets and the JSON documents
//! they are stored in.
//!
//! # Architecture
//!
//! - [`weight`] -- Symbolic weight expressions and their evaluation
//! - [`params`] -- Parameter assignments (name to value)
//! - [`schema`] -- Structural validation of persisted documents
//! - [`jsonio`] -- Loading and storing JSON documents

use std::path::PathBuf;

pub mod jsonio;
pub mod params;
pub mod schema;
pub mod weight;

pub use params::Params;
pub use schema::SchemaKind;
pub use weight::WeightExpr;

/// Error type for weights, parameters and persisted documents.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("parameter not defined: {0}")]
    MissingParam(String),
    #[error("malformed weight expression: {0}")]
    MalformedWeight(String),
    #[error("{kind} document does not match schema at {path}: {reason}")]
    SchemaViolation {
        kind: SchemaKind,
        path: String,
        reason: String,
    },
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
