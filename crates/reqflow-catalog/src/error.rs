//! Error types for the catalog store

use crate::validation::CatalogIssue;
use std::path::PathBuf;

/// Catalog loading and maintenance errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Source text did not parse
    #[error("failed to parse {format} catalog: {message}")]
    Parse {
        /// Source format (toml, yaml, json)
        format: &'static str,
        /// Parser message
        message: String,
    },

    /// Catalog file could not be read
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Data violates a catalog rule
    #[error("invalid catalog: {0}")]
    Invalid(CatalogIssue),

    /// File extension not recognised
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}
