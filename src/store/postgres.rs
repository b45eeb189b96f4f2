//! PostgreSQL store backend
//!
//! Renders actions to DDL and executes them over a sqlx connection pool.
//! Inspection reads `information_schema` and normalizes catalog types to the
//! same canonical form [`ColumnType::to_sql`] produces, so the step layer's
//! conflict check is one string comparison.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::error::{classify_sqlx, MigrationError, MigrationResult};
use crate::schema::{Action, ColumnInfo};
use crate::store::{SchemaInspector, SchemaStore};

/// PostgreSQL-backed [`SchemaStore`].
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to a database URL and wrap the pool.
    pub async fn connect(database_url: &str) -> MigrationResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| MigrationError::Connection(format!("failed to connect: {}", e)))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Normalize an `information_schema` type to the canonical rendering.
fn canonical_type(data_type: &str, max_length: Option<i32>) -> String {
    match data_type {
        "text" => "TEXT".to_string(),
        "character varying" => match max_length {
            Some(len) => format!("VARCHAR({})", len),
            None => "TEXT".to_string(),
        },
        "integer" => "INTEGER".to_string(),
        "bigint" => "BIGINT".to_string(),
        "boolean" => "BOOLEAN".to_string(),
        "timestamp with time zone" | "timestamp without time zone" => {
            "TIMESTAMPTZ".to_string()
        }
        "uuid" => "UUID".to_string(),
        other => other.to_uppercase(),
    }
}

#[async_trait]
impl SchemaInspector for PgStore {
    async fn table_exists(&self, table: &str) -> MigrationResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify_sqlx(e, "inspect tables"))?;

        row.try_get(0)
            .map_err(|e| MigrationError::Connection(format!("failed to read catalog row: {}", e)))
    }

    async fn describe_table(
        &self,
        table: &str,
    ) -> MigrationResult<BTreeMap<String, ColumnInfo>> {
        let rows = sqlx::query(
            "SELECT column_name, data_type, character_maximum_length, is_nullable
             FROM information_schema.columns
             WHERE table_schema = current_schema() AND table_name = $1
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| classify_sqlx(e, "inspect columns"))?;

        let mut columns = BTreeMap::new();
        for row in rows {
            let name: String = row.try_get("column_name").map_err(|e| {
                MigrationError::Connection(format!("failed to read catalog row: {}", e))
            })?;
            let data_type: String = row.try_get("data_type").map_err(|e| {
                MigrationError::Connection(format!("failed to read catalog row: {}", e))
            })?;
            let max_length: Option<i32> =
                row.try_get("character_maximum_length").unwrap_or(None);
            let is_nullable: String = row.try_get("is_nullable").map_err(|e| {
                MigrationError::Connection(format!("failed to read catalog row: {}", e))
            })?;

            columns.insert(
                name,
                ColumnInfo {
                    data_type: canonical_type(&data_type, max_length),
                    nullable: is_nullable == "YES",
                },
            );
        }

        Ok(columns)
    }
}

#[async_trait]
impl SchemaStore for PgStore {
    async fn execute_ddl(&self, action: &Action) -> MigrationResult<()> {
        sqlx::query(&action.to_sql())
            .execute(&self.pool)
            .await
            .map_err(|e| classify_sqlx(e, &action.describe()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_type_normalization() {
        assert_eq!(canonical_type("text", None), "TEXT");
        assert_eq!(canonical_type("character varying", Some(255)), "VARCHAR(255)");
        assert_eq!(canonical_type("character varying", None), "TEXT");
        assert_eq!(canonical_type("integer", None), "INTEGER");
        assert_eq!(canonical_type("timestamp with time zone", None), "TIMESTAMPTZ");
        assert_eq!(canonical_type("uuid", None), "UUID");
        assert_eq!(canonical_type("jsonb", None), "JSONB");
    }
}
