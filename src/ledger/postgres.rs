//! PostgreSQL ledger backend
//!
//! Tracks applied migrations in a dedicated table, created on demand. The
//! table name comes from [`LedgerConfig`] so several runners can share one
//! database without clashing.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};

use crate::error::{classify_sqlx, MigrationError, MigrationResult};
use crate::ledger::{LedgerConfig, LedgerEntry, MigrationLedger};

/// PostgreSQL-backed [`MigrationLedger`].
pub struct PgLedger {
    config: LedgerConfig,
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self::with_config(LedgerConfig::default(), pool)
    }

    pub fn with_config(config: LedgerConfig, pool: PgPool) -> Self {
        Self { config, pool }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// SQL to create the tracking table.
    fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                version VARCHAR(255) NOT NULL,\n    \
                name VARCHAR(255) NOT NULL,\n    \
                applied_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,\n    \
                PRIMARY KEY (version, name)\n\
            );",
            self.config.table
        )
    }

    /// SQL to list applied entries in version order.
    fn list_applied_sql(&self) -> String {
        format!(
            "SELECT version, name, applied_at FROM {} ORDER BY version ASC, name ASC",
            self.config.table
        )
    }

    /// SQL to record a step as applied.
    fn record_applied_sql(&self) -> String {
        format!(
            "INSERT INTO {} (version, name, applied_at) VALUES ($1, $2, $3)",
            self.config.table
        )
    }

    /// SQL to remove a step's entry.
    fn record_reverted_sql(&self) -> String {
        format!(
            "DELETE FROM {} WHERE version = $1 AND name = $2",
            self.config.table
        )
    }

    fn ledger_err(err: sqlx::Error) -> MigrationError {
        match classify_sqlx(err, "ledger") {
            conn @ MigrationError::Connection(_) => conn,
            other => MigrationError::Ledger(other.to_string()),
        }
    }
}

#[async_trait]
impl MigrationLedger for PgLedger {
    async fn ensure_ready(&self) -> MigrationResult<()> {
        sqlx::query(&self.create_table_sql())
            .execute(&self.pool)
            .await
            .map_err(Self::ledger_err)?;
        Ok(())
    }

    async fn list_applied(&self) -> MigrationResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(&self.list_applied_sql())
            .fetch_all(&self.pool)
            .await
            .map_err(Self::ledger_err)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let version: String = row
                .try_get("version")
                .map_err(|e| MigrationError::Ledger(format!("failed to read version: {}", e)))?;
            let name: String = row
                .try_get("name")
                .map_err(|e| MigrationError::Ledger(format!("failed to read name: {}", e)))?;
            let applied_at = row
                .try_get("applied_at")
                .map_err(|e| MigrationError::Ledger(format!("failed to read applied_at: {}", e)))?;

            entries.push(LedgerEntry {
                version,
                name,
                applied_at,
            });
        }

        Ok(entries)
    }

    async fn record_applied(&self, version: &str, name: &str) -> MigrationResult<()> {
        sqlx::query(&self.record_applied_sql())
            .bind(version)
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(Self::ledger_err)?;
        Ok(())
    }

    async fn record_reverted(&self, version: &str, name: &str) -> MigrationResult<()> {
        sqlx::query(&self.record_reverted_sql())
            .bind(version)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(Self::ledger_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // connect_lazy never touches the network, but sqlx still spawns its
    // pool reaper on the ambient runtime, so these run under tokio.
    fn ledger() -> PgLedger {
        let pool = PgPool::connect_lazy("postgres://localhost/stepwise_test")
            .expect("lazy pool construction does not connect");
        PgLedger::new(pool)
    }

    #[tokio::test]
    async fn test_tracking_table_sql() {
        let sql = ledger().create_table_sql();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS stepwise_migrations"));
        assert!(sql.contains("version VARCHAR(255) NOT NULL"));
        assert!(sql.contains("PRIMARY KEY (version, name)"));
    }

    #[tokio::test]
    async fn test_record_and_list_sql() {
        let ledger = ledger();
        assert!(ledger
            .record_applied_sql()
            .contains("INSERT INTO stepwise_migrations (version, name, applied_at)"));
        assert!(ledger
            .record_reverted_sql()
            .contains("DELETE FROM stepwise_migrations WHERE version = $1 AND name = $2"));
        assert!(ledger
            .list_applied_sql()
            .contains("ORDER BY version ASC, name ASC"));
    }

    #[tokio::test]
    async fn test_custom_table_name() {
        let pool = PgPool::connect_lazy("postgres://localhost/stepwise_test")
            .expect("lazy pool construction does not connect");
        let config = LedgerConfig {
            table: "app_migrations".to_string(),
        };
        let ledger = PgLedger::with_config(config, pool);
        assert!(ledger.create_table_sql().contains("app_migrations"));
    }
}
