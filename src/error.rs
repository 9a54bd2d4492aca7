use miette::Diagnostic;
use thiserror::Error;

/// Main error type for iconpress operations.
///
/// Only run-aborting conditions live here. Per-asset and per-file
/// conditions (a source that fails to decode, an intermediate that cannot
/// be deleted) are reported as warnings where they occur and never
/// propagate through this type.
#[derive(Error, Diagnostic, Debug)]
pub enum PressError {
    #[error("IO error: {0}")]
    #[diagnostic(code(iconpress::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(iconpress::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Naming error: {message}")]
    #[diagnostic(code(iconpress::naming))]
    Naming {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Plan error: {message}")]
    #[diagnostic(code(iconpress::plan))]
    Plan {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Catalog error: {message}")]
    #[diagnostic(code(iconpress::catalog))]
    Catalog {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Order error: {message}")]
    #[diagnostic(code(iconpress::order))]
    Order {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Compose error: {message}")]
    #[diagnostic(code(iconpress::compose))]
    Compose {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Convert error: {message}")]
    #[diagnostic(code(iconpress::convert))]
    Convert {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Validation failed: {message}")]
    #[diagnostic(code(iconpress::validate))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },
}

pub type Result<T> = std::result::Result<T, PressError>;
