//! Centralized error types for iosevidence.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the iosevidence library.
///
/// Lookup misses (no matching contact, attachment not in the backup) are not
/// errors; they surface as `None` in the tabular output.
#[derive(Error, Debug)]
pub enum EvidenceError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The backup directory does not exist or is not a directory.
    #[error("'{0}' is not a directory")]
    BackupNotFound(PathBuf),

    /// A store required by the module is not part of the backup.
    #[error("iOS {store} DB does not exist in the backup directory ({path})")]
    StoreMissing { store: &'static str, path: PathBuf },

    /// A required option was left empty.
    #[error("Required option '{0}' is not set")]
    MissingOption(String),

    /// The option is not part of the module's option list.
    #[error("Option '{0}' does not exist")]
    UnknownOption(String),

    /// The option value has the wrong shape (e.g. text where a flag is expected).
    #[error("Invalid value for option '{name}': {reason}")]
    InvalidOptionValue { name: String, reason: String },

    /// A conversation id list could not be parsed.
    #[error("Invalid conversation id range '{0}'")]
    InvalidRange(String),

    /// A date bound is not in `YYYY-MM-DD` form.
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The relational store failed to open or to run a query.
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// A report could not be rendered.
    #[error("Export error: {0}")]
    Export(String),
}

/// Convenience alias for `Result<T, EvidenceError>`.
pub type Result<T> = std::result::Result<T, EvidenceError>;

impl EvidenceError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error stems from investigator input rather than the
    /// evidence itself. Configuration errors stop a run before any query.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::BackupNotFound(_)
                | Self::StoreMissing { .. }
                | Self::MissingOption(_)
                | Self::UnknownOption(_)
                | Self::InvalidOptionValue { .. }
                | Self::InvalidRange(_)
                | Self::InvalidDate(_)
        )
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `EvidenceError::io`).
impl From<std::io::Error> for EvidenceError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_flagged() {
        assert!(EvidenceError::MissingOption("BACKUP_DIR".into()).is_configuration());
        assert!(EvidenceError::InvalidRange("9-5".into()).is_configuration());
        assert!(!EvidenceError::Export("boom".into()).is_configuration());
    }

    #[test]
    fn test_missing_option_message() {
        let err = EvidenceError::MissingOption("CONVERSATION_IDS".into());
        assert_eq!(err.to_string(), "Required option 'CONVERSATION_IDS' is not set");
    }
}
