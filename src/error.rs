//! Error types for the migration system
//!
//! Every failure surfaced to a caller carries enough context to identify
//! which step and which schema object was involved. Step-level failures
//! abort the run; there is no retry.

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Error types for migration operations
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The store is unreachable. Fatal for the whole run.
    #[error("store connection failed: {0}")]
    Connection(String),

    /// The inspector reported a state inconsistent with the action's
    /// expectation, e.g. the column exists with a different type.
    #[error("schema conflict on {table}.{column}: {detail}")]
    SchemaConflict {
        table: String,
        column: String,
        detail: String,
    },

    /// The store rejected a DDL action.
    #[error("failed to execute {action}: {detail}")]
    ActionExecution { action: String, detail: String },

    /// Reading or writing the migration tracking table failed.
    #[error("ledger operation failed: {0}")]
    Ledger(String),

    /// Two steps share the same version and name.
    #[error("duplicate migration step {version} '{name}'")]
    DuplicateStep { version: String, name: String },

    /// The ledger records a migration with no matching step definition.
    #[error("no step definition for applied migration {version} '{name}'")]
    UnknownStep { version: String, name: String },

    /// A step failed mid-run. Wraps the underlying error with the identity
    /// of the step that was executing when the run aborted.
    #[error("migration step {version} '{name}' failed: {source}")]
    Step {
        version: String,
        name: String,
        #[source]
        source: Box<MigrationError>,
    },
}

impl MigrationError {
    /// Attach step identity to an error surfaced mid-run.
    pub(crate) fn for_step(self, version: &str, name: &str) -> Self {
        match self {
            // Already attributed, do not double-wrap.
            err @ MigrationError::Step { .. } => err,
            other => MigrationError::Step {
                version: version.to_string(),
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The identity of the failing step, when the error carries one.
    pub fn step_identity(&self) -> Option<(&str, &str)> {
        match self {
            MigrationError::Step { version, name, .. } => {
                Some((version.as_str(), name.as_str()))
            }
            _ => None,
        }
    }
}

/// Classify a driver error: pool and transport failures mean the store is
/// unreachable, everything else means the store rejected the statement.
pub(crate) fn classify_sqlx(err: sqlx::Error, action: &str) -> MigrationError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => MigrationError::Connection(err.to_string()),
        other => MigrationError::ActionExecution {
            action: action.to_string(),
            detail: other.to_string(),
        },
    }
}
