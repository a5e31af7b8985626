//! Typed failures for engine operations.

/// Errors returned by engine mutations and reads.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No issue row with this id.
    #[error("issue {0} not found")]
    IssueNotFound(i64),

    /// No user row with this id.
    #[error("user {0} not found")]
    UserNotFound(i64),

    /// The caller's expected version no longer matches the stored row.
    /// The row was left untouched; re-read and retry with `actual`.
    #[error("version conflict on issue {issue_id}: expected {expected}, found {actual}")]
    VersionConflict {
        issue_id: i64,
        expected: i64,
        actual: i64,
    },

    /// Input rejected before any write happened.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A store constraint rejected the write (duplicate email, unknown
    /// assignee at insert, and similar).
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Underlying SQLite failure.
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

/// Result alias for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Stable machine-readable code for CLI and log output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::IssueNotFound(_) => "E1001",
            Self::UserNotFound(_) => "E1002",
            Self::VersionConflict { .. } => "E1101",
            Self::Validation(_) => "E1201",
            Self::Constraint(_) => "E1301",
            Self::Db(_) => "E1900",
        }
    }

    /// Hint shown under CLI errors, when one exists.
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::IssueNotFound(id) => {
                Some(format!("issue {id} does not exist; run `mw list` to see current ids"))
            }
            Self::UserNotFound(id) => {
                Some(format!("user {id} does not exist; run `mw user ls` to see current ids"))
            }
            Self::VersionConflict {
                issue_id, actual, ..
            } => Some(format!(
                "someone changed issue {issue_id} first; re-read with `mw show {issue_id}` and retry with --expect-version {actual}"
            )),
            Self::Validation(_) | Self::Constraint(_) | Self::Db(_) => None,
        }
    }
}
