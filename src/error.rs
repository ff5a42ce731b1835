//! Error handling for the sciforge hooks.
//! Defines custom error types and results used throughout the crate.

use std::io;
use thiserror::Error;

/// Custom error types for hook operations.
///
/// Validation problems in the pre-generation gate are reported through
/// [`crate::validator::ValidationReport`]; this enum covers everything that can
/// go wrong while loading the context or mutating the generated tree.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// The generation context could not be read or is malformed
    #[error("Context error: {0}.")]
    ContextError(String),

    /// Represents validation failures in user input
    #[error("Validation error: {0}.")]
    ValidationError(String),

    /// A TOML document could not be parsed structurally
    #[error("TOML parse error: {0}.")]
    TomlError(#[from] toml::de::Error),

    /// A TOML document could not be parsed for format-preserving editing
    #[error("TOML edit error: {0}.")]
    TomlEditError(#[from] toml_edit::TomlError),

    /// A TOML document could not be serialized
    #[error("TOML serialize error: {0}.")]
    TomlSerializeError(#[from] toml::ser::Error),

    /// The metadata document has an unexpected shape or could not be rewritten
    #[error("Metadata error: {0}.")]
    MetadataError(String),
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
