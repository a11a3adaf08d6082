//! Starred membership toggle.
//!
//! Starring touches one field of one record, so it skips the two-record
//! commit and relies on the store's atomic set toggle. It still honours the
//! per-pair busy guard shared with like/dislike.

use std::sync::Arc;

use tracing::info;

use crate::domain::ports::ReactionStore;
use crate::domain::reaction_coordinator::{busy_error, map_fatal_store_error};
use crate::domain::{Error, Identity, InFlightRegistry, ProblemId};

/// Toggles the starred set on the user record.
pub struct StarToggleHandler {
    store: Arc<dyn ReactionStore>,
    in_flight: Arc<InFlightRegistry>,
}

impl StarToggleHandler {
    /// Create a handler sharing `in_flight` with the reaction coordinator.
    pub fn new(store: Arc<dyn ReactionStore>, in_flight: Arc<InFlightRegistry>) -> Self {
        Self { store, in_flight }
    }

    /// Flip the starred membership and return `true` if the problem is now
    /// starred.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `Busy`, `NotFound` for a missing user or problem
    /// record (nothing is written), and `StoreUnavailable`.
    pub async fn toggle(&self, identity: &Identity, problem_id: &ProblemId) -> Result<bool, Error> {
        let user_id = identity.require_user()?;
        let _guard = self
            .in_flight
            .try_acquire(user_id, problem_id)
            .ok_or_else(|| busy_error(problem_id))?;

        if self
            .store
            .find_problem(problem_id)
            .await
            .map_err(map_fatal_store_error)?
            .is_none()
        {
            return Err(Error::not_found(format!(
                "problem {problem_id} does not exist"
            )));
        }
        let starred = self
            .store
            .toggle_starred(user_id, problem_id)
            .await
            .map_err(map_fatal_store_error)?;
        info!(%user_id, %problem_id, starred, "star toggled");
        Ok(starred)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{ErrorCode, ProblemRecord, UserId};
    use crate::domain::ports::{MockReactionStore, ReactionStoreError};
    use rstest::{fixture, rstest};

    #[fixture]
    fn problem_id() -> ProblemId {
        ProblemId::new("merge-intervals").expect("valid problem id")
    }

    /// Store whose catalogue holds every problem asked for.
    fn store_with_problem() -> MockReactionStore {
        let mut store = MockReactionStore::new();
        store
            .expect_find_problem()
            .returning(|id| Ok(Some(ProblemRecord::builder(id.clone()).build())));
        store
    }

    fn handler(store: MockReactionStore) -> (StarToggleHandler, Arc<InFlightRegistry>) {
        let in_flight = Arc::new(InFlightRegistry::new());
        (
            StarToggleHandler::new(Arc::new(store), Arc::clone(&in_flight)),
            in_flight,
        )
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    #[tokio::test]
    async fn returns_membership_reported_by_the_store(problem_id: ProblemId, #[case] now: bool) {
        let mut store = store_with_problem();
        store
            .expect_toggle_starred()
            .times(1)
            .returning(move |_, _| Ok(now));
        let (handler, _) = handler(store);

        let starred = handler
            .toggle(&Identity::authenticated(UserId::random()), &problem_id)
            .await
            .expect("toggle succeeds");
        assert_eq!(starred, now);
    }

    #[rstest]
    #[tokio::test]
    async fn anonymous_caller_is_refused(problem_id: ProblemId) {
        let (handler, _) = handler(MockReactionStore::new());
        let error = handler
            .toggle(&Identity::Anonymous, &problem_id)
            .await
            .expect_err("anonymous refused");
        assert_eq!(error.code(), ErrorCode::Unauthenticated);
    }

    #[rstest]
    #[tokio::test]
    async fn shares_the_busy_guard_with_reactions(problem_id: ProblemId) {
        let (handler, in_flight) = handler(MockReactionStore::new());
        let user_id = UserId::random();
        let _held = in_flight
            .try_acquire(&user_id, &problem_id)
            .expect("pair is free");

        let error = handler
            .toggle(&Identity::authenticated(user_id), &problem_id)
            .await
            .expect_err("busy pair refused");
        assert_eq!(error.code(), ErrorCode::Busy);
    }

    #[rstest]
    #[case(ReactionStoreError::missing_record("users/uid-9"), ErrorCode::NotFound)]
    #[case(ReactionStoreError::unavailable("socket closed"), ErrorCode::StoreUnavailable)]
    #[tokio::test]
    async fn maps_store_failures(
        problem_id: ProblemId,
        #[case] failure: ReactionStoreError,
        #[case] expected: ErrorCode,
    ) {
        let mut store = store_with_problem();
        store
            .expect_toggle_starred()
            .returning(move |_, _| Err(failure.clone()));
        let (handler, _) = handler(store);

        let error = handler
            .toggle(&Identity::authenticated(UserId::random()), &problem_id)
            .await
            .expect_err("store failure surfaces");
        assert_eq!(error.code(), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_problem_is_not_found_and_never_toggled(problem_id: ProblemId) {
        let mut store = MockReactionStore::new();
        store.expect_find_problem().times(1).returning(|_| Ok(None));
        store.expect_toggle_starred().never();
        let (handler, in_flight) = handler(store);
        let user_id = UserId::random();

        let error = handler
            .toggle(&Identity::authenticated(user_id.clone()), &problem_id)
            .await
            .expect_err("missing problem");

        assert_eq!(error.code(), ErrorCode::NotFound);
        assert!(!in_flight.is_active(&user_id, &problem_id));
    }

    #[rstest]
    #[tokio::test]
    async fn problem_lookup_failure_is_surfaced(problem_id: ProblemId) {
        let mut store = MockReactionStore::new();
        store
            .expect_find_problem()
            .returning(|_| Err(ReactionStoreError::unavailable("socket closed")));
        store.expect_toggle_starred().never();
        let (handler, _) = handler(store);

        let error = handler
            .toggle(&Identity::authenticated(UserId::random()), &problem_id)
            .await
            .expect_err("lookup failure");
        assert_eq!(error.code(), ErrorCode::StoreUnavailable);
    }
}
