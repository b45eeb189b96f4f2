//! Store abstraction - the relational store consumed by the runner
//!
//! [`SchemaInspector`] is the read-only view of the live catalog;
//! [`SchemaStore`] adds DDL execution. The runner never talks SQL itself,
//! it hands typed [`Action`]s to the store and lets the driver render them.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::MigrationResult;
use crate::schema::{Action, ColumnInfo};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Read-only structural metadata about the store.
///
/// Implementations must reflect the live state of the store at call time.
/// No caching across calls: a step's idempotency checks depend on seeing the
/// effect of the action that just ran.
#[async_trait]
pub trait SchemaInspector: Send + Sync {
    /// Whether `table` currently exists.
    async fn table_exists(&self, table: &str) -> MigrationResult<bool>;

    /// Columns of `table`, keyed by column name. An absent table yields an
    /// empty map; callers gate on [`table_exists`](Self::table_exists) when
    /// the distinction matters.
    async fn describe_table(&self, table: &str)
        -> MigrationResult<BTreeMap<String, ColumnInfo>>;
}

/// A store the runner can mutate.
#[async_trait]
pub trait SchemaStore: SchemaInspector {
    /// Execute one schema mutation as a single unit against the store.
    ///
    /// Implementations do not perform existence checks; the step layer has
    /// already decided the action is necessary. A rejected statement
    /// surfaces as `ActionExecution`, an unreachable store as `Connection`.
    async fn execute_ddl(&self, action: &Action) -> MigrationResult<()>;
}
