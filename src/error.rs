//! Error types for fetching, reshaping, dereferencing and writing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading a JSON document from a file, string or URL.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON in {origin}: {source}")]
    InvalidJson {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid registry document from {origin}: {source}")]
    InvalidRegistry {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors while resolving `$ref` pointers.
#[derive(Debug, Error)]
pub enum RefError {
    #[error("cannot load reference target: {0}")]
    Load(#[from] LoadError),

    #[error("unresolvable reference \"{reference}\": {message}")]
    Unresolvable { reference: String, message: String },

    #[error("circular reference detected: {reference}")]
    Circular { reference: String },

    #[error("remote reference \"{reference}\" requires the `remote` feature")]
    UnsupportedRemote { reference: String },
}

impl RefError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RefError::Load(e) => e.exit_code(),
            _ => 2,
        }
    }
}

/// Errors while reshaping registry records.
#[derive(Debug, Error)]
pub enum ReshapeError {
    #[error("destination #{index}: missing required field {field}")]
    MissingField { index: usize, field: String },

    #[error("destination #{index}: field {field} should be {expected}, got {actual}")]
    UnexpectedType {
        index: usize,
        field: String,
        expected: &'static str,
        actual: String,
    },

    #[error("destination #{index}: duplicate connector id {id}")]
    DuplicateId { index: usize, id: String },
}

impl ReshapeError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while serializing or writing output.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot serialize output: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            WriteError::Serialize { .. } => 2,
            WriteError::Io { .. } => 3,
        }
    }
}

/// Any failure of a full pipeline run.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Ref(#[from] RefError),

    #[error(transparent)]
    Reshape(#[from] ReshapeError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl SeedError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SeedError::Load(e) => e.exit_code(),
            SeedError::Ref(e) => e.exit_code(),
            SeedError::Reshape(e) => e.exit_code(),
            SeedError::Write(e) => e.exit_code(),
        }
    }
}
