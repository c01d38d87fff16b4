use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::SkipReason;
use crate::UserRecord;

/// Why a single record could not be renamed. The record is left as it was.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordError {
    #[error("lookup_failed: candidate {candidate}: {message}")]
    Lookup { candidate: String, message: String },
    #[error("write_failed: candidate {candidate}: {message}")]
    Write { candidate: String, message: String },
    #[error("probe_limit_exceeded: gave up after {probes} probes")]
    ProbeLimitExceeded { probes: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Updated,
    /// Computed during a dry run; nothing was written.
    Planned,
    Skipped { reason: SkipReason },
    Failed { error: RecordError },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub id: Uuid,
    pub old_custom_id: String,
    pub new_custom_id: Option<String>,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl RecordOutcome {
    pub(crate) fn renamed(record: &UserRecord, new_custom_id: String, dry_run: bool) -> Self {
        Self {
            id: record.id,
            old_custom_id: record.custom_id.clone(),
            new_custom_id: Some(new_custom_id),
            status: if dry_run {
                OutcomeStatus::Planned
            } else {
                OutcomeStatus::Updated
            },
        }
    }

    pub(crate) fn skipped(record: &UserRecord, reason: SkipReason) -> Self {
        Self {
            id: record.id,
            old_custom_id: record.custom_id.clone(),
            new_custom_id: None,
            status: OutcomeStatus::Skipped { reason },
        }
    }

    pub(crate) fn failed(record: &UserRecord, error: RecordError) -> Self {
        Self {
            id: record.id,
            old_custom_id: record.custom_id.clone(),
            new_custom_id: None,
            status: OutcomeStatus::Failed { error },
        }
    }
}

/// Summary of one backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub dry_run: bool,
    pub interrupted: bool,
    pub candidates: usize,
    pub updated: usize,
    pub planned: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<RecordOutcome>,
}

impl BackfillReport {
    pub(crate) fn new(dry_run: bool, candidates: usize) -> Self {
        Self {
            dry_run,
            candidates,
            ..Self::default()
        }
    }

    pub(crate) fn push(&mut self, outcome: RecordOutcome) {
        match outcome.status {
            OutcomeStatus::Updated => self.updated += 1,
            OutcomeStatus::Planned => self.planned += 1,
            OutcomeStatus::Skipped { .. } => self.skipped += 1,
            OutcomeStatus::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    /// `(id, old, new)` for every updated or planned record.
    pub fn renames(&self) -> impl Iterator<Item = (Uuid, &str, &str)> {
        self.outcomes.iter().filter_map(|outcome| {
            outcome
                .new_custom_id
                .as_deref()
                .map(|new| (outcome.id, outcome.old_custom_id.as_str(), new))
        })
    }
}
