//! In-memory ledger backend for deterministic tests.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::MigrationResult;
use crate::ledger::{LedgerEntry, MigrationLedger};

/// In-process ledger double.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: RwLock<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl MigrationLedger for MemoryLedger {
    async fn ensure_ready(&self) -> MigrationResult<()> {
        Ok(())
    }

    async fn list_applied(&self) -> MigrationResult<Vec<LedgerEntry>> {
        let mut entries = self.entries.read().clone();
        entries.sort_by(|a, b| {
            a.version
                .cmp(&b.version)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(entries)
    }

    async fn record_applied(&self, version: &str, name: &str) -> MigrationResult<()> {
        self.entries.write().push(LedgerEntry {
            version: version.to_string(),
            name: name.to_string(),
            applied_at: Utc::now(),
        });
        Ok(())
    }

    async fn record_reverted(&self, version: &str, name: &str) -> MigrationResult<()> {
        self.entries
            .write()
            .retain(|entry| !(entry.version == version && entry.name == name));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entries_sorted_by_version_then_name() {
        let ledger = MemoryLedger::new();
        ledger.record_applied("3", "add_videos").await.unwrap();
        ledger.record_applied("1", "create_episodes").await.unwrap();
        ledger.record_applied("2", "add_duration").await.unwrap();

        let applied = ledger.list_applied().await.unwrap();
        let versions: Vec<&str> = applied.iter().map(|e| e.version.as_str()).collect();
        assert_eq!(versions, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_revert_removes_entry() {
        let ledger = MemoryLedger::new();
        ledger.record_applied("1", "create_episodes").await.unwrap();
        ledger.record_applied("2", "add_duration").await.unwrap();

        ledger.record_reverted("2", "add_duration").await.unwrap();
        let applied = ledger.list_applied().await.unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].version, "1");
    }
}
