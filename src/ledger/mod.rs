//! Migration ledger - persistent record of applied steps
//!
//! The ledger is the single source of truth for "has this step run". The
//! runner owns its write path exclusively; nothing else records or removes
//! entries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MigrationResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedger;
pub use postgres::PgLedger;

/// One applied migration step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub version: String,
    pub name: String,
    /// When the step's forward actions completed.
    pub applied_at: DateTime<Utc>,
}

/// Configuration for ledger storage.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Table name for tracking applied migrations.
    pub table: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            table: "stepwise_migrations".to_string(),
        }
    }
}

/// Persistent record of which steps have been applied.
///
/// Recording happens after the step's actions succeed. A crash between the
/// actions and the record leaves a partially-applied-but-unrecorded step;
/// the step layer's existence checks make re-applying it safe, after which
/// recording succeeds.
#[async_trait]
pub trait MigrationLedger: Send + Sync {
    /// Prepare ledger storage, e.g. create the tracking table.
    async fn ensure_ready(&self) -> MigrationResult<()>;

    /// All applied entries, ascending by version then name.
    async fn list_applied(&self) -> MigrationResult<Vec<LedgerEntry>>;

    /// Record a step as applied.
    async fn record_applied(&self, version: &str, name: &str) -> MigrationResult<()>;

    /// Remove a step's entry after its reverse actions completed.
    async fn record_reverted(&self, version: &str, name: &str) -> MigrationResult<()>;
}
