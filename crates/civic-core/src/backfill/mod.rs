//! Gender-suffix backfill for user identifiers.
//!
//! Every eligible record gets `base + token` as its new `custom_id`, or
//! `base + token + n` with the smallest `n >= 1` that no other record holds.
//! Rerunning over migrated data is a no-op: a migrated identifier either ends
//! in its token and drops out of the candidate list, or ends in a tiebreak
//! number after its token and classifies as already suffixed.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{CommitOutcome, StoreError, StoreResult, UserRecord, UserStore};

mod candidate;
mod report;

pub use candidate::{candidate_id, classify, Eligibility, SkipReason};
pub use report::{BackfillReport, OutcomeStatus, RecordError, RecordOutcome};

pub const DEFAULT_PROBE_HEADROOM: u64 = 1000;

/// How collisions are checked while probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeMode {
    /// Query the store for every candidate.
    #[default]
    Live,
    /// Load every identifier once and probe in memory. Only safe while no
    /// other writer renames users; the conditional write still catches races.
    Snapshot,
}

impl ProbeMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Snapshot => "snapshot",
        }
    }
}

impl FromStr for ProbeMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "snapshot" => Ok(Self::Snapshot),
            other => Err(format!("invalid probe mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillOptions {
    pub dry_run: bool,
    pub probe_mode: ProbeMode,
    /// Probes allowed per record beyond the collection size.
    pub probe_headroom: u64,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            probe_mode: ProbeMode::default(),
            probe_headroom: DEFAULT_PROBE_HEADROOM,
        }
    }
}

/// Cooperative stop request, checked between records.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("backfill_setup_failed: {0}")]
    Setup(#[from] StoreError),
}

pub struct Backfill<'a> {
    store: &'a dyn UserStore,
    options: BackfillOptions,
    stop: StopFlag,
}

impl<'a> Backfill<'a> {
    pub fn new(store: &'a dyn UserStore, options: BackfillOptions) -> Self {
        Self {
            store,
            options,
            stop: StopFlag::new(),
        }
    }

    #[must_use]
    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = stop;
        self
    }

    pub async fn run(&self) -> Result<BackfillReport, BackfillError> {
        let total = self.store.count_users().await?;
        let candidates = self.store.list_suffix_candidates().await?;
        let mut taken = match self.options.probe_mode {
            ProbeMode::Live => TakenIds::live(),
            ProbeMode::Snapshot => TakenIds::snapshot(self.store.list_custom_ids().await?),
        };
        let max_probes = total.saturating_add(self.options.probe_headroom).max(1);

        tracing::info!(
            event = "backfill_started",
            total_users = total,
            candidates = candidates.len(),
            dry_run = self.options.dry_run,
            probe_mode = self.options.probe_mode.as_str(),
            max_probes,
        );

        let mut report = BackfillReport::new(self.options.dry_run, candidates.len());
        for record in &candidates {
            if self.stop.is_stopped() {
                tracing::warn!(
                    event = "backfill_interrupted",
                    processed = report.outcomes.len(),
                    remaining = candidates.len() - report.outcomes.len(),
                );
                report.interrupted = true;
                break;
            }
            let outcome = self.process(record, &mut taken, max_probes).await;
            log_outcome(&outcome);
            report.push(outcome);
        }

        tracing::info!(
            event = "backfill_finished",
            candidates = report.candidates,
            updated = report.updated,
            planned = report.planned,
            skipped = report.skipped,
            failed = report.failed,
            interrupted = report.interrupted,
        );
        Ok(report)
    }

    async fn process(
        &self,
        record: &UserRecord,
        taken: &mut TakenIds,
        max_probes: u64,
    ) -> RecordOutcome {
        let (base, token) = match classify(record) {
            Eligibility::Eligible { base, token } => (base, token),
            Eligibility::Skipped(reason) => return RecordOutcome::skipped(record, reason),
        };

        let mut suffix = 0u64;
        let mut probes = 0u64;
        loop {
            if probes >= max_probes {
                return RecordOutcome::failed(record, RecordError::ProbeLimitExceeded { probes });
            }
            probes += 1;
            let candidate = candidate_id(&base, token, suffix);

            match taken.is_taken(self.store, record.id, &candidate).await {
                Ok(true) => {
                    suffix += 1;
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    return RecordOutcome::failed(
                        record,
                        RecordError::Lookup {
                            candidate,
                            message: err.to_string(),
                        },
                    );
                }
            }

            if self.options.dry_run {
                taken.plan(&record.custom_id, &candidate);
                return RecordOutcome::renamed(record, candidate, true);
            }

            match self
                .store
                .update_custom_id(record.id, &record.custom_id, &candidate)
                .await
            {
                Ok(CommitOutcome::Applied) => {
                    taken.committed(&record.custom_id, &candidate);
                    return RecordOutcome::renamed(record, candidate, false);
                }
                Ok(CommitOutcome::Taken) => {
                    tracing::debug!(
                        event = "backfill_commit_conflict",
                        user_id = %record.id,
                        candidate = %candidate,
                    );
                    taken.mark_taken(&candidate);
                    suffix += 1;
                }
                Ok(CommitOutcome::Stale) => {
                    return RecordOutcome::skipped(record, SkipReason::ChangedConcurrently);
                }
                Err(err) => {
                    return RecordOutcome::failed(
                        record,
                        RecordError::Write {
                            candidate,
                            message: err.to_string(),
                        },
                    );
                }
            }
        }
    }
}

fn log_outcome(outcome: &RecordOutcome) {
    let new_custom_id = outcome.new_custom_id.as_deref().unwrap_or_default();
    match &outcome.status {
        OutcomeStatus::Updated => tracing::info!(
            event = "backfill_record_updated",
            user_id = %outcome.id,
            old_custom_id = %outcome.old_custom_id,
            new_custom_id,
        ),
        OutcomeStatus::Planned => tracing::info!(
            event = "backfill_record_planned",
            user_id = %outcome.id,
            old_custom_id = %outcome.old_custom_id,
            new_custom_id,
        ),
        OutcomeStatus::Skipped { reason } => tracing::info!(
            event = "backfill_record_skipped",
            user_id = %outcome.id,
            custom_id = %outcome.old_custom_id,
            reason = %reason,
        ),
        OutcomeStatus::Failed { error } => tracing::error!(
            event = "backfill_record_failed",
            user_id = %outcome.id,
            custom_id = %outcome.old_custom_id,
            error = %error,
        ),
    }
}

/// Identifier occupancy as seen by one run.
struct TakenIds {
    snapshot: Option<HashSet<String>>,
    // Dry-run overlay: `true` held by a planned rename, `false` released by one.
    planned: HashMap<String, bool>,
}

impl TakenIds {
    fn live() -> Self {
        Self {
            snapshot: None,
            planned: HashMap::new(),
        }
    }

    fn snapshot(ids: Vec<String>) -> Self {
        Self {
            snapshot: Some(ids.into_iter().collect()),
            planned: HashMap::new(),
        }
    }

    async fn is_taken(
        &self,
        store: &dyn UserStore,
        record_id: Uuid,
        candidate: &str,
    ) -> StoreResult<bool> {
        if let Some(held) = self.planned.get(candidate) {
            return Ok(*held);
        }
        match &self.snapshot {
            Some(ids) => Ok(ids.contains(candidate)),
            None => Ok(store
                .find_by_custom_id(candidate)
                .await?
                .is_some_and(|other| other.id != record_id)),
        }
    }

    fn plan(&mut self, old: &str, new: &str) {
        self.planned.insert(old.to_string(), false);
        self.planned.insert(new.to_string(), true);
    }

    fn committed(&mut self, old: &str, new: &str) {
        if let Some(ids) = &mut self.snapshot {
            ids.remove(old);
            ids.insert(new.to_string());
        }
    }

    fn mark_taken(&mut self, candidate: &str) {
        if let Some(ids) = &mut self.snapshot {
            ids.insert(candidate.to_string());
        }
    }
}
