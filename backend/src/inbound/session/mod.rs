//! UI-facing reaction session.
//!
//! A session belongs to one viewer. It resolves the identity on every call,
//! speculates in its [`OptimisticViewCache`], drives the [`ReactionCommand`]
//! port and settles the speculation with the outcome. Any failure restores
//! the view from before the action.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ports::{IdentityProvider, ReactionCommand};
use crate::domain::{
    Error, OptimisticViewCache, PendingTicket, ProblemId, ReactionAction, ReactionState,
    ReactionView, ViewCacheError,
};

/// One viewer's reaction session.
pub struct ReactionSession {
    command: Arc<dyn ReactionCommand>,
    identity: Arc<dyn IdentityProvider>,
    cache: OptimisticViewCache,
}

impl ReactionSession {
    /// Create a session with an empty cache.
    pub fn new(command: Arc<dyn ReactionCommand>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            command,
            identity,
            cache: OptimisticViewCache::new(),
        }
    }

    /// Establish the viewing context for `problem_id` by reading the stored
    /// records into the cache.
    ///
    /// Signed-out viewers see the counters with every flag cleared.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown problem, `StoreUnavailable`, and `Busy` when
    /// an action on the problem is still pending.
    pub async fn open(&self, problem_id: &ProblemId) -> Result<ReactionView, Error> {
        let identity = self.identity.current();
        let view = self.command.snapshot(&identity, problem_id).await?;
        self.cache
            .hydrate(problem_id, view)
            .map_err(map_cache_error)?;
        Ok(view)
    }

    /// Like or dislike `problem_id`, returning the committed standing.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` before anything is speculated, `Busy` while another
    /// action on the problem is pending, and whatever the command reports.
    pub async fn react(
        &self,
        problem_id: &ProblemId,
        action: ReactionAction,
    ) -> Result<ReactionState, Error> {
        let identity = self.identity.current();
        identity.require_user()?;
        let pending = PendingAction::new(
            &self.cache,
            self.cache
                .begin_reaction(problem_id, action)
                .map_err(map_cache_error)?,
        );

        match self.command.react(&identity, problem_id, action).await {
            Ok(outcome) => {
                pending.commit(outcome.view)?;
                Ok(outcome.state())
            }
            Err(error) => {
                pending.roll_back(&error);
                Err(error)
            }
        }
    }

    /// Toggle the star on `problem_id`, returning the committed membership.
    ///
    /// # Errors
    ///
    /// Same as [`ReactionSession::react`].
    pub async fn toggle_star(&self, problem_id: &ProblemId) -> Result<bool, Error> {
        let identity = self.identity.current();
        identity.require_user()?;
        let ticket = self
            .cache
            .begin_star(problem_id)
            .map_err(map_cache_error)?;
        let speculative = ticket.speculative();
        let pending = PendingAction::new(&self.cache, ticket);

        match self.command.toggle_star(&identity, problem_id).await {
            Ok(starred) => {
                pending.commit(ReactionView {
                    starred,
                    ..speculative
                })?;
                Ok(starred)
            }
            Err(error) => {
                pending.roll_back(&error);
                Err(error)
            }
        }
    }

    /// Current cached view. Never blocks on the store.
    pub fn get_view(&self, problem_id: &ProblemId) -> ReactionView {
        self.cache.view(problem_id)
    }
}

fn map_cache_error(error: ViewCacheError) -> Error {
    match error {
        ViewCacheError::SlotPending { .. } => Error::busy(error.to_string()),
        ViewCacheError::StaleTicket { .. } => Error::internal(error.to_string()),
    }
}

/// Settles a ticket exactly once; rolls back if dropped unsettled so that an
/// abandoned call does not leave the slot pending.
struct PendingAction<'a> {
    cache: &'a OptimisticViewCache,
    ticket: Option<PendingTicket>,
}

impl<'a> PendingAction<'a> {
    fn new(cache: &'a OptimisticViewCache, ticket: PendingTicket) -> Self {
        Self {
            cache,
            ticket: Some(ticket),
        }
    }

    fn commit(mut self, authoritative: ReactionView) -> Result<(), Error> {
        match self.ticket.take() {
            Some(ticket) => self
                .cache
                .commit(ticket, authoritative)
                .map_err(map_cache_error),
            None => Ok(()),
        }
    }

    fn roll_back(mut self, cause: &Error) {
        if let Some(ticket) = self.ticket.take() {
            debug!(problem_id = %ticket.problem_id(), code = %cause.code(), "rolling back speculative view");
            self.settle_failed(ticket);
        }
    }

    fn settle_failed(&self, ticket: PendingTicket) {
        if let Err(error) = self.cache.roll_back(ticket) {
            warn!(%error, "speculative view could not be rolled back");
        }
    }
}

impl Drop for PendingAction<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            debug!(problem_id = %ticket.problem_id(), "action abandoned; rolling back speculative view");
            self.settle_failed(ticket);
        }
    }
}
