//! Port for the transactional document store holding User and Problem
//! records.
//!
//! The store is the only source of truth. It must offer point reads, an
//! atomic two-record commit with conflict detection, and an atomic
//! single-record set toggle. Adapters can back the commit with native
//! transactions or, as the in-memory adapter does, with revision checks.

use async_trait::async_trait;

use crate::domain::{ProblemId, ProblemRecord, UserId, UserRecord};

use super::define_port_error;

define_port_error! {
    /// Errors raised by reaction store adapters.
    pub enum ReactionStoreError {
        /// The store could not be reached.
        Unavailable { message: String } =>
            "reaction store unavailable: {message}",
        /// A read or write failed during execution.
        Query { message: String } =>
            "reaction store query failed: {message}",
        /// A concurrent writer changed a record after it was read.
        Conflict { record: String } =>
            "write conflict on {record}",
        /// A record touched by the write no longer exists.
        MissingRecord { record: String } =>
            "record {record} does not exist",
    }
}

/// One atomic write of both records touched by a like/dislike action.
///
/// The commit succeeds only if both stored revisions still equal the
/// expected revisions read at the start of the attempt. On success the store
/// persists both records with their revisions bumped by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionCommit {
    /// User record with its new membership sets.
    pub user: UserRecord,
    /// User revision observed when the attempt read the record.
    pub expected_user_revision: u64,
    /// Problem record with its new counters.
    pub problem: ProblemRecord,
    /// Problem revision observed when the attempt read the record.
    pub expected_problem_revision: u64,
}

impl ReactionCommit {
    /// Build a commit from the records as modified by the caller, using the
    /// revisions they were read at as the expected revisions.
    pub fn from_read(user: UserRecord, problem: ProblemRecord) -> Self {
        let expected_user_revision = user.revision;
        let expected_problem_revision = problem.revision;
        Self {
            user,
            expected_user_revision,
            problem,
            expected_problem_revision,
        }
    }
}

/// Port for reaction record storage.
///
/// # Atomicity
///
/// - [`ReactionStore::commit_reaction`] is all-or-nothing across both
///   records and fails with [`ReactionStoreError::Conflict`] when either
///   revision moved.
/// - [`ReactionStore::toggle_starred`] is an atomic add-if-absent /
///   remove-if-present on one record. It bumps the user revision so that a
///   concurrent reaction commit on the same user detects the change.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReactionStore: Send + Sync {
    /// Fetch a user record by id.
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, ReactionStoreError>;

    /// Fetch a problem record by id.
    async fn find_problem(
        &self,
        problem_id: &ProblemId,
    ) -> Result<Option<ProblemRecord>, ReactionStoreError>;

    /// Atomically write both records if neither changed since it was read.
    async fn commit_reaction(&self, commit: &ReactionCommit) -> Result<(), ReactionStoreError>;

    /// Toggle `problem_id` in the user's starred set and return the
    /// membership after the toggle.
    async fn toggle_starred(
        &self,
        user_id: &UserId,
        problem_id: &ProblemId,
    ) -> Result<bool, ReactionStoreError>;
}
