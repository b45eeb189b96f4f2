//! Migration steps - named, versioned, reversible units of schema change
//!
//! A step carries forward and reverse action lists. Before executing any
//! action it consults the inspector and skips actions whose target state
//! already holds, so `apply` and `revert` are safely repeatable: running
//! either twice leaves the same structural state as running it once.

use crate::error::{MigrationError, MigrationResult};
use crate::log::MigrationLog;
use crate::schema::Action;
use crate::store::SchemaStore;

/// One forward+reverse schema change unit, uniquely identified by
/// (version, name). Immutable once defined.
#[derive(Debug, Clone)]
pub struct MigrationStep {
    version: String,
    name: String,
    forward: Vec<Action>,
    reverse: Vec<Action>,
}

/// Outcome of checking one action against the live catalog.
enum Disposition {
    Execute,
    Skip(&'static str),
}

impl MigrationStep {
    /// Create an empty step. `version` must sort monotonically against the
    /// other steps of the same set; `name` disambiguates within a version.
    pub fn new(version: &str, name: &str) -> Self {
        Self {
            version: version.to_string(),
            name: name.to_string(),
            forward: Vec::new(),
            reverse: Vec::new(),
        }
    }

    /// Append a forward action.
    pub fn up(mut self, action: Action) -> Self {
        self.forward.push(action);
        self
    }

    /// Append a reverse action.
    pub fn down(mut self, action: Action) -> Self {
        self.reverse.push(action);
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn forward_actions(&self) -> &[Action] {
        &self.forward
    }

    pub fn reverse_actions(&self) -> &[Action] {
        &self.reverse
    }

    /// Execute the forward actions, skipping any whose target state already
    /// holds.
    pub async fn apply<S>(&self, store: &S, log: &dyn MigrationLog) -> MigrationResult<()>
    where
        S: SchemaStore + ?Sized,
    {
        self.run_actions(&self.forward, store, log).await
    }

    /// Execute the reverse actions with the same idempotency discipline.
    ///
    /// Reversal restores column and table presence, not data: whatever was
    /// stored in a removed column is gone. Lossy by design of the reverse
    /// actions themselves.
    pub async fn revert<S>(&self, store: &S, log: &dyn MigrationLog) -> MigrationResult<()>
    where
        S: SchemaStore + ?Sized,
    {
        self.run_actions(&self.reverse, store, log).await
    }

    async fn run_actions<S>(
        &self,
        actions: &[Action],
        store: &S,
        log: &dyn MigrationLog,
    ) -> MigrationResult<()>
    where
        S: SchemaStore + ?Sized,
    {
        for action in actions {
            match check_action(action, store).await? {
                Disposition::Execute => {
                    store.execute_ddl(action).await?;
                    log.info(&format!("[{}] {}", self.version, action.describe()));
                }
                Disposition::Skip(reason) => {
                    log.info(&format!(
                        "[{}] skipping {}: {}",
                        self.version,
                        action.describe(),
                        reason
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Decide whether an action is still necessary given the live catalog.
///
/// Inspector reads happen per action, never cached, so each check sees the
/// effect of the actions executed before it.
async fn check_action<S>(action: &Action, store: &S) -> MigrationResult<Disposition>
where
    S: SchemaStore + ?Sized,
{
    match action {
        Action::AddColumn { table, column } => {
            if !store.table_exists(table).await? {
                return Ok(Disposition::Skip("table does not exist"));
            }
            let columns = store.describe_table(table).await?;
            match columns.get(&column.name) {
                None => Ok(Disposition::Execute),
                Some(info) if info.matches(column) => {
                    Ok(Disposition::Skip("column already exists"))
                }
                Some(info) => Err(MigrationError::SchemaConflict {
                    table: table.clone(),
                    column: column.name.clone(),
                    detail: format!(
                        "expected {} (nullable: {}), found {} (nullable: {})",
                        column.ty.to_sql(),
                        column.nullable,
                        info.data_type,
                        info.nullable
                    ),
                }),
            }
        }
        Action::RemoveColumn { table, column } => {
            if !store.table_exists(table).await? {
                return Ok(Disposition::Skip("table does not exist"));
            }
            let columns = store.describe_table(table).await?;
            if columns.contains_key(column) {
                Ok(Disposition::Execute)
            } else {
                Ok(Disposition::Skip("column does not exist"))
            }
        }
        Action::CreateTable { table, .. } => {
            if store.table_exists(table).await? {
                Ok(Disposition::Skip("table already exists"))
            } else {
                Ok(Disposition::Execute)
            }
        }
        Action::DropTable { table } => {
            if store.table_exists(table).await? {
                Ok(Disposition::Execute)
            } else {
                Ok(Disposition::Skip("table does not exist"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryLog;
    use crate::schema::{ColumnSpec, ColumnType};
    use crate::store::{MemoryStore, SchemaInspector};

    fn video_step() -> MigrationStep {
        MigrationStep::new("2.31.0", "add_podcast_video_support")
            .up(Action::add_column(
                "episodes",
                ColumnSpec::nullable("videoURL", ColumnType::Text),
            ))
            .up(Action::add_column(
                "episodes",
                ColumnSpec::nullable("videoType", ColumnType::Text),
            ))
            .down(Action::remove_column("episodes", "videoType"))
            .down(Action::remove_column("episodes", "videoURL"))
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed_table(
            "episodes",
            &[
                ColumnSpec::not_null("id", ColumnType::Uuid),
                ColumnSpec::nullable("title", ColumnType::Text),
            ],
        );
        store
    }

    #[tokio::test]
    async fn test_apply_adds_columns() {
        let store = seeded_store();
        let log = MemoryLog::new();

        video_step().apply(&store, &log).await.unwrap();

        let columns = store.describe_table("episodes").await.unwrap();
        assert!(columns.contains_key("videoURL"));
        assert!(columns.contains_key("videoType"));
        assert!(columns["videoURL"].nullable);
    }

    #[tokio::test]
    async fn test_apply_twice_is_idempotent() {
        let store = seeded_store();
        let log = MemoryLog::new();
        let step = video_step();

        step.apply(&store, &log).await.unwrap();
        let after_first = store.describe_table("episodes").await.unwrap();

        step.apply(&store, &log).await.unwrap();
        let after_second = store.describe_table("episodes").await.unwrap();

        assert_eq!(after_first, after_second);
        assert!(log.contains("skipping add column videoURL to episodes"));
    }

    #[tokio::test]
    async fn test_apply_then_revert_restores_columns() {
        let store = seeded_store();
        let log = MemoryLog::new();
        let step = video_step();

        let before = store.describe_table("episodes").await.unwrap();
        step.apply(&store, &log).await.unwrap();
        step.revert(&store, &log).await.unwrap();
        let after = store.describe_table("episodes").await.unwrap();

        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_revert_without_apply_is_noop() {
        let store = seeded_store();
        let log = MemoryLog::new();

        video_step().revert(&store, &log).await.unwrap();

        let columns = store.describe_table("episodes").await.unwrap();
        assert_eq!(columns.len(), 2);
        assert!(log.contains("skipping remove column videoType from episodes"));
    }

    #[tokio::test]
    async fn test_apply_skips_missing_table() {
        let store = MemoryStore::new();
        let log = MemoryLog::new();

        video_step().apply(&store, &log).await.unwrap();

        assert!(!store.table_exists("episodes").await.unwrap());
        assert!(log.contains("table does not exist"));
    }

    #[tokio::test]
    async fn test_existing_column_with_other_type_conflicts() {
        let store = MemoryStore::new();
        let log = MemoryLog::new();
        store.seed_table(
            "episodes",
            &[
                ColumnSpec::not_null("id", ColumnType::Uuid),
                ColumnSpec::not_null("videoURL", ColumnType::Integer),
            ],
        );

        let err = video_step().apply(&store, &log).await.unwrap_err();
        match err {
            MigrationError::SchemaConflict { table, column, .. } => {
                assert_eq!(table, "episodes");
                assert_eq!(column, "videoURL");
            }
            other => panic!("expected schema conflict, got {:?}", other),
        }
    }
}
