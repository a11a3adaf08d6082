//! Driving port for profile listings built from reaction memberships.

use async_trait::async_trait;

use crate::domain::{Error, ProblemSummary, UserId};

/// Read-only listings of a user's solved and starred problems.
///
/// Results are ordered by the problems' list position. Ids that no longer
/// resolve to a Problem record are skipped.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileReactionsQuery: Send + Sync {
    /// Problems the user has solved.
    async fn solved_problems(&self, user_id: &UserId) -> Result<Vec<ProblemSummary>, Error>;

    /// Problems the user has starred.
    async fn starred_problems(&self, user_id: &UserId) -> Result<Vec<ProblemSummary>, Error>;
}
