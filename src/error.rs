//! Error types for docbook-adoc operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can abort a conversion.
///
/// Only problems with the top-level document surface here. Anomalies inside
/// the tree (unknown elements, malformed tables, broken includes) are logged
/// and rendered best-effort instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Source file not found: {}", .0.display())]
    MissingSource(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
