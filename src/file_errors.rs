//! # File Manager Error Types Module
//!
//! This module defines the error type returned by photo storage operations.
//! Every public file manager operation reports failure through this type
//! instead of panicking, so handlers can answer "photo unavailable" and move on.

/// Custom error types for photo storage operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileManagerError {
    /// The path resolver could not produce a usable location
    ResolutionFailed(String),
    /// Reading, writing or deleting a file failed
    Io(String),
    /// The requested photo does not exist
    NotFound(String),
}

impl std::fmt::Display for FileManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileManagerError::ResolutionFailed(msg) => write!(f, "Resolution error: {msg}"),
            FileManagerError::Io(msg) => write!(f, "I/O error: {msg}"),
            FileManagerError::NotFound(msg) => write!(f, "Not found: {msg}"),
        }
    }
}

impl std::error::Error for FileManagerError {}

impl From<std::io::Error> for FileManagerError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FileManagerError::NotFound(err.to_string()),
            _ => FileManagerError::Io(err.to_string()),
        }
    }
}
