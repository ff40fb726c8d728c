//! Error types for multisample building

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for multisampler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a build.
///
/// Problems with individual sample names are not errors: the parser reports
/// them as a [`Rejection`](crate::filename::Rejection) and the file is skipped.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error while reading samples or writing the package
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A note token resolved to an unknown pitch class or a key outside 0-127.
    ///
    /// The filename grammar should never let such a token through, so this
    /// aborts the whole run.
    #[error("Invalid note '{note}{octave}': {reason}")]
    InvalidNote {
        /// Note letter as captured from the filename
        note: String,
        /// Octave digit as captured from the filename
        octave: u8,
        /// What went wrong
        reason: String,
    },

    /// Nothing survived filtering, so there is no instrument to build
    #[error("No valid samples found")]
    NoSamples,

    /// The target archive is already there
    #[error("Package already exists: {}", .0.display())]
    ArchiveExists(PathBuf),

    /// Zip archive error
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Descriptor rendering error
    #[error("Descriptor error: {0}")]
    Xml(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}
