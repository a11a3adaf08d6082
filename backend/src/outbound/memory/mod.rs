//! In-process reaction store.
//!
//! Records live behind one mutex. Reads hand out clones, so a caller works on
//! a private copy until it commits. A commit is applied only if both stored
//! revisions still equal the ones the caller read; otherwise nothing is
//! written and the caller gets a conflict. This gives the coordinator the
//! same contract as a document store with optimistic transactions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::trace;

use crate::domain::ports::{ReactionCommit, ReactionStore, ReactionStoreError};
use crate::domain::{ProblemId, ProblemRecord, UserId, UserRecord};

#[derive(Debug, Default)]
struct Records {
    users: HashMap<UserId, UserRecord>,
    problems: HashMap<ProblemId, ProblemRecord>,
}

/// Reaction store backed by process memory.
///
/// # Examples
/// ```
/// use reactions::domain::{ProblemId, ProblemRecord, UserId, UserRecord};
/// use reactions::outbound::InMemoryReactionStore;
///
/// let store = InMemoryReactionStore::new();
/// let user = UserId::random();
/// store.insert_user(UserRecord::new(user.clone()));
/// store.insert_problem(ProblemRecord::builder(ProblemId::new("two-sum").expect("id")).build());
/// assert!(store.user(&user).is_some());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryReactionStore {
    records: Mutex<Records>,
}

impl InMemoryReactionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user record as authored elsewhere.
    pub fn insert_user(&self, user: UserRecord) {
        self.lock().users.insert(user.id.clone(), user);
    }

    /// Insert or replace a problem record as authored elsewhere.
    pub fn insert_problem(&self, problem: ProblemRecord) {
        self.lock().problems.insert(problem.id.clone(), problem);
    }

    /// Remove a problem record, leaving any user memberships dangling.
    pub fn remove_problem(&self, problem_id: &ProblemId) -> Option<ProblemRecord> {
        self.lock().problems.remove(problem_id)
    }

    /// Current user record.
    pub fn user(&self, user_id: &UserId) -> Option<UserRecord> {
        self.lock().users.get(user_id).cloned()
    }

    /// Current problem record.
    pub fn problem(&self, problem_id: &ProblemId) -> Option<ProblemRecord> {
        self.lock().problems.get(problem_id).cloned()
    }

    /// Every user record, in no particular order.
    pub fn users(&self) -> Vec<UserRecord> {
        self.lock().users.values().cloned().collect()
    }

    /// Every problem record ordered by list position.
    pub fn problems(&self) -> Vec<ProblemRecord> {
        let mut problems: Vec<_> = self.lock().problems.values().cloned().collect();
        problems.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        problems
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        // Writes replace whole records, so a poisoned map is still consistent.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn user_key(user_id: &UserId) -> String {
    format!("users/{user_id}")
}

fn problem_key(problem_id: &ProblemId) -> String {
    format!("problems/{problem_id}")
}

fn check_revision(
    stored: Option<u64>,
    expected: u64,
    key: impl FnOnce() -> String,
) -> Result<(), ReactionStoreError> {
    match stored {
        None => Err(ReactionStoreError::missing_record(key())),
        Some(revision) if revision != expected => Err(ReactionStoreError::conflict(key())),
        Some(_) => Ok(()),
    }
}

#[async_trait]
impl ReactionStore for InMemoryReactionStore {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, ReactionStoreError> {
        Ok(self.user(user_id))
    }

    async fn find_problem(
        &self,
        problem_id: &ProblemId,
    ) -> Result<Option<ProblemRecord>, ReactionStoreError> {
        Ok(self.problem(problem_id))
    }

    async fn commit_reaction(&self, commit: &ReactionCommit) -> Result<(), ReactionStoreError> {
        let mut records = self.lock();
        let user_id = &commit.user.id;
        let problem_id = &commit.problem.id;

        check_revision(
            records.users.get(user_id).map(|user| user.revision),
            commit.expected_user_revision,
            || user_key(user_id),
        )?;
        check_revision(
            records.problems.get(problem_id).map(|problem| problem.revision),
            commit.expected_problem_revision,
            || problem_key(problem_id),
        )?;

        let mut user = commit.user.clone();
        user.revision = commit.expected_user_revision + 1;
        let mut problem = commit.problem.clone();
        problem.revision = commit.expected_problem_revision + 1;
        trace!(%user_id, %problem_id, user_revision = user.revision, problem_revision = problem.revision, "reaction committed");
        records.users.insert(user_id.clone(), user);
        records.problems.insert(problem_id.clone(), problem);
        Ok(())
    }

    async fn toggle_starred(
        &self,
        user_id: &UserId,
        problem_id: &ProblemId,
    ) -> Result<bool, ReactionStoreError> {
        let mut records = self.lock();
        if !records.problems.contains_key(problem_id) {
            return Err(ReactionStoreError::missing_record(problem_key(problem_id)));
        }
        let user = records
            .users
            .get_mut(user_id)
            .ok_or_else(|| ReactionStoreError::missing_record(user_key(user_id)))?;
        let starred = user.toggle_starred(problem_id);
        user.revision += 1;
        Ok(starred)
    }
}

#[cfg(test)]
mod tests;
