//! Optimistic per-problem view cache for one viewing session.
//!
//! The cache shows the outcome of an action before the store confirms it.
//! Beginning an action records the pre-action view and installs the
//! speculative one; the returned [`PendingTicket`] must then be settled with
//! [`OptimisticViewCache::commit`] or [`OptimisticViewCache::roll_back`].
//! A rolled-back slot is byte-for-byte the view it had before the action, so
//! the cache never shows a reaction that did not commit.
//!
//! The cache is never a source of truth for anyone else. It only changes
//! through hydration and through this session's own actions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use super::{ProblemId, ReactionAction, ReactionView, decide};

/// Settlement state of one cached slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewPhase {
    /// Hydrated (or never touched) with no action in flight.
    #[default]
    Idle,
    /// A speculative view awaits settlement.
    Pending,
    /// The last action committed and the slot holds the authoritative view.
    Committed,
    /// The last action failed and the slot was restored.
    RolledBack,
}

/// Errors raised by the view cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewCacheError {
    /// The slot already has an action in flight.
    #[error("an action on {problem_id} is already pending")]
    SlotPending { problem_id: ProblemId },
    /// The ticket does not match the slot's pending action.
    #[error("ticket for {problem_id} no longer matches the pending action")]
    StaleTicket { problem_id: ProblemId },
}

/// Handle for one speculative update awaiting settlement.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending ticket must be committed or rolled back"]
pub struct PendingTicket {
    problem_id: ProblemId,
    id: u64,
    speculative: ReactionView,
}

impl PendingTicket {
    /// Problem the ticket belongs to.
    pub fn problem_id(&self) -> &ProblemId {
        &self.problem_id
    }

    /// View installed when the action began.
    pub fn speculative(&self) -> ReactionView {
        self.speculative
    }
}

#[derive(Debug, Default)]
struct Slot {
    view: ReactionView,
    phase: ViewPhase,
    pending: Option<PendingAction>,
}

#[derive(Debug, Clone, Copy)]
struct PendingAction {
    ticket: u64,
    before: ReactionView,
}

#[derive(Debug, Default)]
struct CacheState {
    slots: HashMap<ProblemId, Slot>,
    next_ticket: u64,
}

/// Speculative view cache keyed by problem.
#[derive(Debug, Default)]
pub struct OptimisticViewCache {
    state: Mutex<CacheState>,
}

impl OptimisticViewCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot with a freshly read view.
    ///
    /// # Errors
    ///
    /// [`ViewCacheError::SlotPending`] while an action is in flight; a late
    /// hydration must not overwrite the speculative view.
    pub fn hydrate(&self, problem_id: &ProblemId, view: ReactionView) -> Result<(), ViewCacheError> {
        let mut state = self.lock();
        let slot = state.slots.entry(problem_id.clone()).or_default();
        if slot.pending.is_some() {
            return Err(ViewCacheError::SlotPending {
                problem_id: problem_id.clone(),
            });
        }
        slot.view = view;
        slot.phase = ViewPhase::Idle;
        Ok(())
    }

    /// Current view; the neutral default for a problem never seen.
    pub fn view(&self, problem_id: &ProblemId) -> ReactionView {
        self.lock()
            .slots
            .get(problem_id)
            .map(|slot| slot.view)
            .unwrap_or_default()
    }

    /// Current phase; [`ViewPhase::Idle`] for a problem never seen.
    pub fn phase(&self, problem_id: &ProblemId) -> ViewPhase {
        self.lock()
            .slots
            .get(problem_id)
            .map(|slot| slot.phase)
            .unwrap_or_default()
    }

    /// Speculatively apply a like or dislike.
    ///
    /// # Examples
    /// ```
    /// use reactions::domain::{OptimisticViewCache, ProblemId, ReactionAction, ReactionView};
    ///
    /// let cache = OptimisticViewCache::new();
    /// let problem = ProblemId::new("two-sum").expect("valid id");
    /// cache
    ///     .hydrate(&problem, ReactionView { like_count: 10, ..ReactionView::default() })
    ///     .expect("idle slot");
    ///
    /// let ticket = cache.begin_reaction(&problem, ReactionAction::Like).expect("idle slot");
    /// assert_eq!(cache.view(&problem).like_count, 11);
    ///
    /// cache.roll_back(ticket).expect("matching ticket");
    /// assert_eq!(cache.view(&problem).like_count, 10);
    /// ```
    ///
    /// # Errors
    ///
    /// [`ViewCacheError::SlotPending`] while another action is in flight.
    pub fn begin_reaction(
        &self,
        problem_id: &ProblemId,
        action: ReactionAction,
    ) -> Result<PendingTicket, ViewCacheError> {
        self.begin(problem_id, |view| {
            view.with_decision(&decide(action, view.reaction))
        })
    }

    /// Speculatively flip the starred flag.
    ///
    /// # Errors
    ///
    /// [`ViewCacheError::SlotPending`] while another action is in flight.
    pub fn begin_star(&self, problem_id: &ProblemId) -> Result<PendingTicket, ViewCacheError> {
        self.begin(problem_id, |view| ReactionView {
            starred: !view.starred,
            ..view
        })
    }

    /// Settle a successful action, adopting the authoritative view.
    ///
    /// # Errors
    ///
    /// [`ViewCacheError::StaleTicket`] when the ticket is not the slot's
    /// pending action.
    pub fn commit(
        &self,
        ticket: PendingTicket,
        authoritative: ReactionView,
    ) -> Result<(), ViewCacheError> {
        let mut state = self.lock();
        let slot = Self::pending_slot(&mut state, &ticket)?;
        slot.pending = None;
        slot.view = authoritative;
        slot.phase = ViewPhase::Committed;
        Ok(())
    }

    /// Settle a failed action, restoring the pre-action view.
    ///
    /// # Errors
    ///
    /// [`ViewCacheError::StaleTicket`] when the ticket is not the slot's
    /// pending action.
    pub fn roll_back(&self, ticket: PendingTicket) -> Result<ReactionView, ViewCacheError> {
        let mut state = self.lock();
        let slot = Self::pending_slot(&mut state, &ticket)?;
        let before = slot.pending.take().map_or(slot.view, |pending| pending.before);
        slot.view = before;
        slot.phase = ViewPhase::RolledBack;
        Ok(before)
    }

    fn begin(
        &self,
        problem_id: &ProblemId,
        speculate: impl FnOnce(ReactionView) -> ReactionView,
    ) -> Result<PendingTicket, ViewCacheError> {
        let mut state = self.lock();
        state.next_ticket = state.next_ticket.wrapping_add(1);
        let ticket = state.next_ticket;
        let slot = state.slots.entry(problem_id.clone()).or_default();
        if slot.pending.is_some() {
            return Err(ViewCacheError::SlotPending {
                problem_id: problem_id.clone(),
            });
        }
        let before = slot.view;
        let speculative = speculate(before);
        slot.pending = Some(PendingAction { ticket, before });
        slot.view = speculative;
        slot.phase = ViewPhase::Pending;
        Ok(PendingTicket {
            problem_id: problem_id.clone(),
            id: ticket,
            speculative,
        })
    }

    fn pending_slot<'a>(
        state: &'a mut CacheState,
        ticket: &PendingTicket,
    ) -> Result<&'a mut Slot, ViewCacheError> {
        state
            .slots
            .get_mut(&ticket.problem_id)
            .filter(|slot| slot.pending.is_some_and(|pending| pending.ticket == ticket.id))
            .ok_or_else(|| ViewCacheError::StaleTicket {
                problem_id: ticket.problem_id.clone(),
            })
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Every mutation completes under the lock, so a poisoned state is
        // still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ReactionState;
    use rstest::{fixture, rstest};

    #[fixture]
    fn problem() -> ProblemId {
        ProblemId::new("two-sum").expect("valid problem id")
    }

    #[fixture]
    fn cache(problem: ProblemId) -> OptimisticViewCache {
        let cache = OptimisticViewCache::new();
        cache
            .hydrate(
                &problem,
                ReactionView {
                    like_count: 10,
                    dislike_count: 2,
                    ..ReactionView::default()
                },
            )
            .expect("idle slot");
        cache
    }

    #[rstest]
    fn unseen_problem_reads_as_neutral_default(problem: ProblemId) {
        let cache = OptimisticViewCache::new();
        assert_eq!(cache.view(&problem), ReactionView::default());
        assert_eq!(cache.phase(&problem), ViewPhase::Idle);
    }

    #[rstest]
    fn begin_reaction_shows_speculative_view(cache: OptimisticViewCache, problem: ProblemId) {
        let ticket = cache
            .begin_reaction(&problem, ReactionAction::Like)
            .expect("idle slot");

        let view = cache.view(&problem);
        assert_eq!(view.reaction, ReactionState::Liked);
        assert_eq!((view.like_count, view.dislike_count), (11, 2));
        assert_eq!(ticket.speculative(), view);
        assert_eq!(cache.phase(&problem), ViewPhase::Pending);
        cache.roll_back(ticket).expect("matching ticket");
    }

    #[rstest]
    fn commit_adopts_authoritative_view(cache: OptimisticViewCache, problem: ProblemId) {
        let ticket = cache
            .begin_reaction(&problem, ReactionAction::Like)
            .expect("idle slot");
        let authoritative = ReactionView {
            like_count: 14,
            ..ticket.speculative()
        };

        cache.commit(ticket, authoritative).expect("matching ticket");
        assert_eq!(cache.view(&problem), authoritative);
        assert_eq!(cache.phase(&problem), ViewPhase::Committed);
    }

    #[rstest]
    fn roll_back_restores_the_exact_prior_view(cache: OptimisticViewCache, problem: ProblemId) {
        let before = cache.view(&problem);
        let ticket = cache
            .begin_reaction(&problem, ReactionAction::Dislike)
            .expect("idle slot");

        let restored = cache.roll_back(ticket).expect("matching ticket");
        assert_eq!(restored, before);
        assert_eq!(cache.view(&problem), before);
        assert_eq!(cache.phase(&problem), ViewPhase::RolledBack);
    }

    #[rstest]
    fn second_begin_while_pending_is_rejected(cache: OptimisticViewCache, problem: ProblemId) {
        let ticket = cache.begin_star(&problem).expect("idle slot");

        assert_eq!(
            cache.begin_reaction(&problem, ReactionAction::Like),
            Err(ViewCacheError::SlotPending {
                problem_id: problem.clone()
            })
        );
        assert!(cache.view(&problem).starred);
        cache.commit(ticket, cache.view(&problem)).expect("matching ticket");
    }

    #[rstest]
    fn hydrate_is_refused_while_pending(cache: OptimisticViewCache, problem: ProblemId) {
        let ticket = cache
            .begin_reaction(&problem, ReactionAction::Like)
            .expect("idle slot");

        let late = cache.hydrate(&problem, ReactionView::default());
        assert!(matches!(late, Err(ViewCacheError::SlotPending { .. })));
        assert_eq!(cache.view(&problem).like_count, 11);
        cache.roll_back(ticket).expect("matching ticket");
    }

    #[rstest]
    fn ticket_from_another_cache_is_stale(cache: OptimisticViewCache, problem: ProblemId) {
        let other = OptimisticViewCache::new();
        let foreign = other.begin_star(&problem).expect("idle slot");

        assert!(matches!(
            cache.commit(foreign, ReactionView::default()),
            Err(ViewCacheError::StaleTicket { .. })
        ));
        assert_eq!(cache.phase(&problem), ViewPhase::Idle);
    }

    #[rstest]
    fn star_speculation_leaves_reactions_untouched(cache: OptimisticViewCache, problem: ProblemId) {
        let ticket = cache.begin_star(&problem).expect("idle slot");
        let view = cache.view(&problem);

        assert!(view.starred);
        assert_eq!(view.reaction, ReactionState::Neutral);
        assert_eq!((view.like_count, view.dislike_count), (10, 2));
        cache.roll_back(ticket).expect("matching ticket");
        assert!(!cache.view(&problem).starred);
    }
}
