use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{is_suffix_candidate, CommitOutcome, StoreError, StoreResult, UserStore};
use crate::UserRecord;

/// In-process [`UserStore`] holding records in insertion order.
///
/// Seeding does not enforce uniqueness so audits can be exercised against
/// broken data; [`UserStore::update_custom_id`] does. Faults can be injected
/// to exercise failure paths.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<UserRecord>,
    failing_writes: HashSet<Uuid>,
    racing_claims: Vec<String>,
    unavailable: bool,
    writes: u64,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        let store = Self::new();
        store.state().users.extend(users);
        store
    }

    pub fn insert(&self, user: UserRecord) {
        self.state().users.push(user);
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<UserRecord> {
        self.state().users.clone()
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<UserRecord> {
        self.state().users.iter().find(|user| user.id == id).cloned()
    }

    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.state().writes
    }

    /// Every write for `id` fails with [`StoreError::Write`].
    pub fn fail_writes_for(&self, id: Uuid) {
        self.state().failing_writes.insert(id);
    }

    /// Simulates a concurrent writer: just before the next conditional write
    /// runs, a new record claiming `custom_id` is inserted.
    pub fn claim_before_next_commit(&self, custom_id: impl Into<String>) {
        self.state().racing_claims.push(custom_id.into());
    }

    /// All reads fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn readable(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        let state = self.state();
        if state.unavailable {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(state)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.readable()?.users.len() as u64)
    }

    async fn list_suffix_candidates(&self) -> StoreResult<Vec<UserRecord>> {
        let state = self.readable()?;
        let mut candidates: Vec<UserRecord> = state
            .users
            .iter()
            .filter(|user| is_suffix_candidate(user))
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(candidates)
    }

    async fn find_by_custom_id(&self, custom_id: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self
            .readable()?
            .users
            .iter()
            .find(|user| user.custom_id == custom_id)
            .cloned())
    }

    async fn list_custom_ids(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .readable()?
            .users
            .iter()
            .map(|user| user.custom_id.clone())
            .collect())
    }

    async fn update_custom_id(
        &self,
        id: Uuid,
        expected: &str,
        custom_id: &str,
    ) -> StoreResult<CommitOutcome> {
        let mut state = self.state();
        if state.failing_writes.contains(&id) {
            return Err(StoreError::Write(format!("injected write failure for {id}")));
        }
        for claim in std::mem::take(&mut state.racing_claims) {
            state.users.push(UserRecord::new(claim, None));
        }
        if state.users.iter().any(|user| user.custom_id == custom_id) {
            return Ok(CommitOutcome::Taken);
        }
        let Some(user) = state.users.iter_mut().find(|user| user.id == id) else {
            return Ok(CommitOutcome::Stale);
        };
        if user.custom_id != expected {
            return Ok(CommitOutcome::Stale);
        }
        user.custom_id = custom_id.to_string();
        user.row_version += 1;
        user.updated_at = Utc::now();
        state.writes += 1;
        Ok(CommitOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn conditional_write_rejects_taken_and_stale() {
        let a = UserRecord::new("A1", Some("M"));
        let b = UserRecord::new("A1M", Some("F"));
        let store = MemoryUserStore::with_users([a.clone(), b]);

        let taken = store
            .update_custom_id(a.id, "A1", "A1M")
            .await
            .expect("update");
        assert_eq!(taken, CommitOutcome::Taken);

        let stale = store
            .update_custom_id(a.id, "wrong", "A1M1")
            .await
            .expect("update");
        assert_eq!(stale, CommitOutcome::Stale);

        let missing = store
            .update_custom_id(Uuid::now_v7(), "A1", "A1M2")
            .await
            .expect("update");
        assert_eq!(missing, CommitOutcome::Stale);

        let applied = store
            .update_custom_id(a.id, "A1", "A1M1")
            .await
            .expect("update");
        assert_eq!(applied, CommitOutcome::Applied);
        let updated = store.get(a.id).expect("record");
        assert_eq!(updated.custom_id, "A1M1");
        assert_eq!(updated.row_version, 2);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn candidates_exclude_suffixed_and_genderless() {
        let store = MemoryUserStore::with_users([
            UserRecord::new("U1", Some("M")),
            UserRecord::new("U2f", Some("F")),
            UserRecord::new("U3", None),
            UserRecord::new("U4", Some("")),
        ]);
        let mut ids: Vec<String> = store
            .list_suffix_candidates()
            .await
            .expect("list")
            .into_iter()
            .map(|user| user.custom_id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["U1".to_string(), "U4".to_string()]);
    }

    #[tokio::test]
    async fn racing_claim_lands_before_commit() {
        let a = UserRecord::new("R1", Some("F"));
        let store = MemoryUserStore::with_users([a.clone()]);
        store.claim_before_next_commit("R1F");
        let outcome = store
            .update_custom_id(a.id, "R1", "R1F")
            .await
            .expect("update");
        assert_eq!(outcome, CommitOutcome::Taken);
        assert!(store
            .find_by_custom_id("R1F")
            .await
            .expect("find")
            .is_some());
    }

    #[tokio::test]
    async fn unavailable_store_fails_reads() {
        let store = MemoryUserStore::new();
        store.set_unavailable(true);
        let err = store.count_users().await.expect_err("offline");
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
