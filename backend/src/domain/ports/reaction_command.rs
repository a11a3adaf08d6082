//! Driving port for reaction actions.
//!
//! Inbound adapters call this port to like, dislike or star a problem and to
//! read the viewer's current standing. The caller's identity is passed in
//! explicitly with every call.

use async_trait::async_trait;

use crate::domain::{Error, Identity, ProblemId, ReactionAction, ReactionOutcome, ReactionView};

/// Driving port for reaction actions.
///
/// # Errors
///
/// Every method refuses an [`Identity::Anonymous`] caller that needs to write
/// with `Unauthenticated`. Write methods reject a second call on the same
/// (user, problem) pair while one is in flight with `Busy`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReactionCommand: Send + Sync {
    /// Apply a like or dislike in one atomic transaction across the User and
    /// Problem records.
    async fn react(
        &self,
        identity: &Identity,
        problem_id: &ProblemId,
        action: ReactionAction,
    ) -> Result<ReactionOutcome, Error>;

    /// Toggle the starred membership. Returns `true` when the problem is now
    /// starred.
    async fn toggle_star(&self, identity: &Identity, problem_id: &ProblemId)
    -> Result<bool, Error>;

    /// Read the current view for hydration. Anonymous viewers get the
    /// counters with every flag cleared.
    async fn snapshot(
        &self,
        identity: &Identity,
        problem_id: &ProblemId,
    ) -> Result<ReactionView, Error>;
}
