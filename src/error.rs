//! Error types for the element exporter.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading a building model.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read the model file from disk.
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The STEP format is invalid or malformed.
    #[error("invalid STEP format at line {line}: {message}")]
    InvalidStep { line: usize, message: String },
}

/// Errors that can occur while running an export job.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The user cancelled the job. Not a fault.
    #[error("export cancelled")]
    Cancelled,

    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {source}")]
    Write {
        #[from]
        source: std::io::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },

    /// An element carries two parameters with the same name and the job
    /// runs with strict duplicate handling.
    #[error("element '{element}' has more than one parameter named '{name}'")]
    DuplicateParameter { element: String, name: String },

    /// The finished file could not be moved onto the target path.
    #[error("failed to finalize '{path}': {source}")]
    Commit {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Copying a finished export elsewhere failed.
    #[error("could not save the file to '{path}': {source}")]
    Copy {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ExportError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors that can occur when loading or saving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No per-user directory could be resolved on this platform.
    #[error("could not determine the configuration directory")]
    NoConfigDir,

    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write config '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize config: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
}
