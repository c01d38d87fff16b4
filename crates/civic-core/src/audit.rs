use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::{classify, Eligibility, StoreResult, UserStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub custom_id: String,
    pub count: usize,
}

/// Identifier health of the user collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub total: u64,
    /// Records a backfill run would rename right now.
    pub pending: usize,
    /// Listed candidates a backfill would skip, by reason code.
    pub skipped: BTreeMap<String, usize>,
    pub duplicates: Vec<DuplicateGroup>,
}

impl AuditReport {
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.duplicates.is_empty()
    }
}

pub async fn audit_identifiers(store: &dyn UserStore) -> StoreResult<AuditReport> {
    let total = store.count_users().await?;

    let mut report = AuditReport {
        total,
        ..AuditReport::default()
    };
    for record in store.list_suffix_candidates().await? {
        match classify(&record) {
            Eligibility::Eligible { .. } => report.pending += 1,
            Eligibility::Skipped(reason) => {
                *report.skipped.entry(reason.code().to_string()).or_default() += 1;
            }
        }
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for custom_id in store.list_custom_ids().await? {
        *counts.entry(custom_id).or_default() += 1;
    }
    report.duplicates = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(custom_id, count)| DuplicateGroup { custom_id, count })
        .collect();
    report
        .duplicates
        .sort_by(|a, b| a.custom_id.cmp(&b.custom_id));

    if !report.is_unique() {
        tracing::warn!(
            event = "audit_duplicate_custom_ids",
            groups = report.duplicates.len(),
        );
    }
    Ok(report)
}
