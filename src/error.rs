//! Error taxonomy shared by every finblog component.
//!
//! Library code returns [`FinblogError`]; the CLI wraps it in `anyhow` for
//! context and `main` downcasts back to pick an exit code.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Result alias using [`FinblogError`]
pub type Result<T> = std::result::Result<T, FinblogError>;

/// Exit code for generic failures
pub const EXIT_FAILURE: u8 = 1;
/// Exit code for date/output/topic collisions
pub const EXIT_DUPLICATE: u8 = 2;
/// Exit code for missing or invalid configuration
pub const EXIT_CONFIG: u8 = 3;
/// Exit code when another invocation holds the ledger lock
pub const EXIT_LOCKED: u8 = 4;

#[derive(Debug, Error)]
pub enum FinblogError {
    #[error("a post for {0} already exists in the ledger")]
    DuplicateDate(NaiveDate),

    #[error("topic '{topic}' was used on {last_used}, within the last {window} posts")]
    TopicConflict {
        topic: String,
        last_used: NaiveDate,
        window: usize,
    },

    #[error("failed to extract text from {}: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },

    #[error("generation failed after {attempts} attempt(s): {reason}")]
    Generation { attempts: u32, reason: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to overwrite existing file {}", .0.display())]
    DuplicateOutput(PathBuf),

    #[error("ledger {} could not be persisted: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("ledger lock {} is held by another finblog process", .0.display())]
    Lock(PathBuf),
}

impl FinblogError {
    /// Stable kind name printed next to the message on stderr
    pub fn kind(&self) -> &'static str {
        match self {
            FinblogError::DuplicateDate(_) => "DuplicateDateError",
            FinblogError::TopicConflict { .. } => "TopicConflictError",
            FinblogError::Extraction { .. } => "ExtractionError",
            FinblogError::Generation { .. } => "GenerationError",
            FinblogError::Write { .. } => "WriteError",
            FinblogError::DuplicateOutput(_) => "DuplicateOutputError",
            FinblogError::Persistence { .. } => "PersistenceError",
            FinblogError::Config(_) => "ConfigError",
            FinblogError::Lock(_) => "LockError",
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            FinblogError::DuplicateDate(_)
            | FinblogError::DuplicateOutput(_)
            | FinblogError::TopicConflict { .. } => EXIT_DUPLICATE,
            FinblogError::Config(_) => EXIT_CONFIG,
            FinblogError::Lock(_) => EXIT_LOCKED,
            _ => EXIT_FAILURE,
        }
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        FinblogError::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn extraction(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        FinblogError::Extraction {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FinblogError::Write {
            path: path.into(),
            source,
        }
    }
}
