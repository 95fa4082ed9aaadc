//! Error types for the records core
//!
//! Errors are classified by who can fix them:
//! - Caller bugs: invalid arguments passed to an analytics call
//! - User-fixable: bad config, broken category files, unknown ids
//! - Environment: IO failures
//!
//! Unparseable dates are deliberately absent: they never surface as errors,
//! the affected record is just left out of the date-dependent computation.

use std::path::PathBuf;
use thiserror::Error;

/// Error types for registry, analytics and config loading
#[derive(Debug, Error)]
pub enum RegistroError {
    // Caller bugs
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // User-fixable
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse {what}: {message}")]
    ParseError { what: String, message: String },

    #[error("Invalid category '{category}': {reason}")]
    InvalidCategory { category: String, reason: String },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown field '{field}' in category '{category}'")]
    UnknownField { category: String, field: String },

    // Environment
    #[error("IO error: {0}")]
    IoError(String),
}

impl RegistroError {
    pub(crate) fn parse(what: impl Into<String>, err: impl std::fmt::Display) -> Self {
        RegistroError::ParseError {
            what: what.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_category(category: &str, reason: impl Into<String>) -> Self {
        RegistroError::InvalidCategory {
            category: category.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true if the user can resolve this by editing their data or config
    pub fn is_user_fixable(&self) -> bool {
        matches!(
            self,
            RegistroError::ConfigurationError(_)
                | RegistroError::ConfigNotFound(_)
                | RegistroError::ParseError { .. }
                | RegistroError::InvalidCategory { .. }
                | RegistroError::UnknownCategory(_)
                | RegistroError::UnknownField { .. }
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RegistroError::InvalidArgument(_) => "This is a bug in the caller; check the arguments.",
            RegistroError::ConfigurationError(_) => {
                "Check your configuration in ~/.registro/config.json"
            }
            RegistroError::ConfigNotFound(_) => {
                "Create ~/.registro/config.json or run without one to use defaults."
            }
            RegistroError::ParseError { .. } => "Check the file is valid JSON in the expected format.",
            RegistroError::InvalidCategory { .. } => {
                "Fix the category definition: unique keys, select options, valid dependencies."
            }
            RegistroError::UnknownCategory(_) | RegistroError::UnknownField { .. } => {
                "Reload the category list; it may have been edited elsewhere."
            }
            RegistroError::IoError(_) => "Check file permissions and disk space.",
        }
    }
}

impl From<std::io::Error> for RegistroError {
    fn from(err: std::io::Error) -> Self {
        RegistroError::IoError(err.to_string())
    }
}
