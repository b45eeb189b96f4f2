//! In-memory store backend
//!
//! Holds the catalog as ordered maps behind a lock. Behaves like a strict
//! relational store: executing an action whose precondition does not hold is
//! an error, exactly as a real database would reject the DDL. That keeps
//! tests honest about the step layer's existence checks.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{MigrationError, MigrationResult};
use crate::schema::{Action, ColumnInfo, ColumnSpec};
use crate::store::{SchemaInspector, SchemaStore};

type Catalog = BTreeMap<String, BTreeMap<String, ColumnInfo>>;

/// In-process store double for deterministic tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: RwLock<Catalog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table directly, bypassing the DDL path. Test setup only.
    pub fn seed_table(&self, table: &str, columns: &[ColumnSpec]) {
        let cols = columns
            .iter()
            .map(|spec| (spec.name.clone(), ColumnInfo::from(spec)))
            .collect();
        self.catalog.write().insert(table.to_string(), cols);
    }

    /// Current column names of `table`, for structural assertions.
    pub fn column_names(&self, table: &str) -> Vec<String> {
        self.catalog
            .read()
            .get(table)
            .map(|cols| cols.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn rejected(action: &Action, detail: &str) -> MigrationError {
        MigrationError::ActionExecution {
            action: action.describe(),
            detail: detail.to_string(),
        }
    }
}

#[async_trait]
impl SchemaInspector for MemoryStore {
    async fn table_exists(&self, table: &str) -> MigrationResult<bool> {
        Ok(self.catalog.read().contains_key(table))
    }

    async fn describe_table(
        &self,
        table: &str,
    ) -> MigrationResult<BTreeMap<String, ColumnInfo>> {
        Ok(self.catalog.read().get(table).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl SchemaStore for MemoryStore {
    async fn execute_ddl(&self, action: &Action) -> MigrationResult<()> {
        let mut catalog = self.catalog.write();
        match action {
            Action::AddColumn { table, column } => {
                let cols = catalog
                    .get_mut(table)
                    .ok_or_else(|| Self::rejected(action, "table does not exist"))?;
                if cols.contains_key(&column.name) {
                    return Err(Self::rejected(action, "column already exists"));
                }
                cols.insert(column.name.clone(), ColumnInfo::from(column));
            }
            Action::RemoveColumn { table, column } => {
                let cols = catalog
                    .get_mut(table)
                    .ok_or_else(|| Self::rejected(action, "table does not exist"))?;
                if cols.remove(column).is_none() {
                    return Err(Self::rejected(action, "column does not exist"));
                }
            }
            Action::CreateTable { table, columns } => {
                if catalog.contains_key(table) {
                    return Err(Self::rejected(action, "table already exists"));
                }
                let cols = columns
                    .iter()
                    .map(|spec| (spec.name.clone(), ColumnInfo::from(spec)))
                    .collect();
                catalog.insert(table.clone(), cols);
            }
            Action::DropTable { table } => {
                if catalog.remove(table).is_none() {
                    return Err(Self::rejected(action, "table does not exist"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    #[tokio::test]
    async fn test_create_and_describe() {
        let store = MemoryStore::new();
        store
            .execute_ddl(&Action::create_table(
                "episodes",
                vec![
                    ColumnSpec::not_null("id", ColumnType::Uuid),
                    ColumnSpec::nullable("title", ColumnType::Text),
                ],
            ))
            .await
            .unwrap();

        assert!(store.table_exists("episodes").await.unwrap());
        let cols = store.describe_table("episodes").await.unwrap();
        assert_eq!(cols.len(), 2);
        assert!(!cols["id"].nullable);
        assert_eq!(cols["title"].data_type, "TEXT");
    }

    #[tokio::test]
    async fn test_rejects_duplicate_column() {
        let store = MemoryStore::new();
        store.seed_table("episodes", &[ColumnSpec::nullable("title", ColumnType::Text)]);

        let action =
            Action::add_column("episodes", ColumnSpec::nullable("title", ColumnType::Text));
        let err = store.execute_ddl(&action).await.unwrap_err();
        assert!(matches!(err, MigrationError::ActionExecution { .. }));
    }

    #[tokio::test]
    async fn test_describe_missing_table_is_empty() {
        let store = MemoryStore::new();
        assert!(!store.table_exists("missing").await.unwrap());
        assert!(store.describe_table("missing").await.unwrap().is_empty());
    }
}
