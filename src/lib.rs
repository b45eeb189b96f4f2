//! # stepwise: ordered, idempotent schema-migration runner
//!
//! Applies a sequence of versioned, reversible schema-change steps to a
//! relational store. Each step checks the live catalog before every action
//! and skips work whose target state already holds, so applying a step
//! twice, or re-applying after an interrupted run, converges on the same
//! structural state instead of failing.
//!
//! The pieces:
//! - [`schema::Action`] describes one DDL mutation as a closed enum.
//! - [`step::MigrationStep`] bundles forward and reverse actions under a
//!   unique (version, name) identity.
//! - [`store::SchemaStore`] is the consumed store interface, with a
//!   PostgreSQL driver and an in-memory double.
//! - [`ledger::MigrationLedger`] persists which steps have run.
//! - [`runner::MigrationRunner`] orders the steps, applies what is pending,
//!   and reverts on request.
//!
//! ```no_run
//! use stepwise::{
//!     Action, ColumnSpec, ColumnType, MemoryLedger, MemoryStore, MigrationRunner,
//!     MigrationStep,
//! };
//!
//! # async fn demo() -> stepwise::MigrationResult<()> {
//! let steps = vec![MigrationStep::new("2.31.0", "add_podcast_video_support")
//!     .up(Action::add_column(
//!         "podcastEpisodes",
//!         ColumnSpec::nullable("videoURL", ColumnType::Text),
//!     ))
//!     .down(Action::remove_column("podcastEpisodes", "videoURL"))];
//!
//! let runner = MigrationRunner::new(MemoryStore::new(), MemoryLedger::new());
//! let report = runner.run_up(&steps).await?;
//! assert_eq!(report.applied_count, 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod ledger;
pub mod log;
pub mod runner;
pub mod schema;
pub mod step;
pub mod store;

pub use error::{MigrationError, MigrationResult};
pub use ledger::{LedgerConfig, LedgerEntry, MemoryLedger, MigrationLedger, PgLedger};
pub use log::{MemoryLog, MigrationLog, TracingLog};
pub use runner::{MigrationRunner, RollbackReport, RunReport};
pub use schema::{Action, ColumnInfo, ColumnSpec, ColumnType};
pub use step::MigrationStep;
pub use store::{MemoryStore, PgStore, SchemaInspector, SchemaStore};
