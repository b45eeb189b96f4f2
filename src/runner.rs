//! Migration runner - applies pending steps in order against a store
//!
//! The runner owns the ledger's write path. Steps execute strictly
//! sequentially in ascending version order; a run is not transactional
//! across steps, so each step's success or failure is independently visible
//! in the ledger. On the first failure the run stops and the error names
//! the step that was executing.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{MigrationError, MigrationResult};
use crate::ledger::MigrationLedger;
use crate::log::{MigrationLog, TracingLog};
use crate::step::MigrationStep;
use crate::store::SchemaStore;

/// Result of applying pending migrations.
#[derive(Debug)]
pub struct RunReport {
    /// Number of steps that were applied in this run.
    pub applied_count: usize,
    /// (version, name) of each applied step, in application order.
    pub applied: Vec<(String, String)>,
    /// Number of input steps skipped because the ledger already had them.
    pub skipped_count: usize,
    /// Total execution time in milliseconds.
    pub execution_time_ms: u128,
}

/// Result of reverting applied migrations.
#[derive(Debug)]
pub struct RollbackReport {
    /// Number of steps that were reverted.
    pub reverted_count: usize,
    /// (version, name) of each reverted step, in reversion order.
    pub reverted: Vec<(String, String)>,
    /// Total execution time in milliseconds.
    pub execution_time_ms: u128,
}

/// Orchestrates steps, store and ledger. Assumes exclusive access to the
/// store for the duration of a run (single-writer model).
pub struct MigrationRunner<S, L> {
    store: S,
    ledger: L,
    log: Arc<dyn MigrationLog>,
}

impl<S, L> MigrationRunner<S, L>
where
    S: SchemaStore,
    L: MigrationLedger,
{
    /// Create a runner logging through `tracing`.
    pub fn new(store: S, ledger: L) -> Self {
        Self::with_log(store, ledger, Arc::new(TracingLog))
    }

    /// Create a runner with an explicit log sink.
    pub fn with_log(store: S, ledger: L, log: Arc<dyn MigrationLog>) -> Self {
        Self { store, ledger, log }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Apply all pending steps in ascending version order.
    ///
    /// Input order is irrelevant; steps are sorted by (version, name) before
    /// the ledger is consulted. Versions compare lexicographically, so step
    /// sets are expected to use zero-padded or timestamp-shaped versions.
    /// Stops at the first failure with the step's identity attached.
    pub async fn run_up(&self, steps: &[MigrationStep]) -> MigrationResult<RunReport> {
        let start = Instant::now();

        self.ledger.ensure_ready().await?;
        let ordered = sorted_and_checked(steps)?;

        let applied_keys: HashSet<(String, String)> = self
            .ledger
            .list_applied()
            .await?
            .into_iter()
            .map(|entry| (entry.version, entry.name))
            .collect();

        let mut pending = Vec::new();
        let mut skipped_count = 0;
        for step in ordered {
            if applied_keys.contains(&(step.version().to_string(), step.name().to_string())) {
                self.log.info(&format!(
                    "skipping migration {} '{}': already applied",
                    step.version(),
                    step.name()
                ));
                skipped_count += 1;
            } else {
                pending.push(step);
            }
        }

        let mut applied = Vec::new();
        for step in pending {
            self.log.info(&format!(
                "applying migration {} '{}'",
                step.version(),
                step.name()
            ));

            if let Err(err) = step.apply(&self.store, self.log.as_ref()).await {
                let err = err.for_step(step.version(), step.name());
                self.log.error(&err.to_string());
                return Err(err);
            }

            self.ledger
                .record_applied(step.version(), step.name())
                .await
                .map_err(|e| e.for_step(step.version(), step.name()))?;

            self.log.info(&format!(
                "applied migration {} '{}'",
                step.version(),
                step.name()
            ));
            applied.push((step.version().to_string(), step.name().to_string()));
        }

        Ok(RunReport {
            applied_count: applied.len(),
            applied,
            skipped_count,
            execution_time_ms: start.elapsed().as_millis(),
        })
    }

    /// Revert applied steps in strict descending version order, down to but
    /// not including `to_version`. Stops at the first failure.
    ///
    /// Every applied entry above `to_version` must have a step definition in
    /// `steps`; an orphaned ledger entry aborts the rollback before anything
    /// is reverted past it.
    pub async fn run_down(
        &self,
        steps: &[MigrationStep],
        to_version: &str,
    ) -> MigrationResult<RollbackReport> {
        let start = Instant::now();

        self.ledger.ensure_ready().await?;
        let ordered = sorted_and_checked(steps)?;

        let applied = self.ledger.list_applied().await?;
        let mut reverted = Vec::new();

        for entry in applied.iter().rev() {
            if entry.version.as_str() <= to_version {
                break;
            }

            let step = ordered
                .iter()
                .find(|s| s.version() == entry.version && s.name() == entry.name)
                .ok_or_else(|| MigrationError::UnknownStep {
                    version: entry.version.clone(),
                    name: entry.name.clone(),
                })?;

            self.log.info(&format!(
                "reverting migration {} '{}'",
                step.version(),
                step.name()
            ));

            if let Err(err) = step.revert(&self.store, self.log.as_ref()).await {
                let err = err.for_step(step.version(), step.name());
                self.log.error(&err.to_string());
                return Err(err);
            }

            self.ledger
                .record_reverted(step.version(), step.name())
                .await
                .map_err(|e| e.for_step(step.version(), step.name()))?;

            self.log.info(&format!(
                "reverted migration {} '{}'",
                step.version(),
                step.name()
            ));
            reverted.push((step.version().to_string(), step.name().to_string()));
        }

        Ok(RollbackReport {
            reverted_count: reverted.len(),
            reverted,
            execution_time_ms: start.elapsed().as_millis(),
        })
    }

    /// Each known step paired with whether the ledger has it as applied.
    pub async fn status(
        &self,
        steps: &[MigrationStep],
    ) -> MigrationResult<Vec<(MigrationStep, bool)>> {
        self.ledger.ensure_ready().await?;
        let ordered = sorted_and_checked(steps)?;

        let applied_keys: HashSet<(String, String)> = self
            .ledger
            .list_applied()
            .await?
            .into_iter()
            .map(|entry| (entry.version, entry.name))
            .collect();

        Ok(ordered
            .into_iter()
            .map(|step| {
                let is_applied = applied_keys
                    .contains(&(step.version().to_string(), step.name().to_string()));
                (step.clone(), is_applied)
            })
            .collect())
    }
}

/// Sort by (version, name) and reject duplicate identities.
///
/// Two steps sharing a version but not a name order by name; two steps
/// sharing both are a data-integrity error, not a tie to break.
fn sorted_and_checked(steps: &[MigrationStep]) -> MigrationResult<Vec<&MigrationStep>> {
    let mut ordered: Vec<&MigrationStep> = steps.iter().collect();
    ordered.sort_by(|a, b| {
        a.version()
            .cmp(b.version())
            .then_with(|| a.name().cmp(b.name()))
    });

    for pair in ordered.windows(2) {
        if pair[0].version() == pair[1].version() && pair[0].name() == pair[1].name() {
            return Err(MigrationError::DuplicateStep {
                version: pair[0].version().to_string(),
                name: pair[0].name().to_string(),
            });
        }
    }

    Ok(ordered)
}
