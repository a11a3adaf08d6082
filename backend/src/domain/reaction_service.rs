//! Reaction command service.
//!
//! Wires the coordinator and the star toggle handler to one store and one
//! shared busy registry, and serves hydration reads.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{ReactionCommand, ReactionStore};
use crate::domain::reaction_coordinator::map_fatal_store_error;
use crate::domain::{
    CoordinatorConfig, CoordinatorRuntime, Error, Identity, InFlightRegistry, ProblemId,
    ReactionAction, ReactionCoordinator, ReactionOutcome, ReactionView, StarToggleHandler,
};

/// Reaction service implementing [`ReactionCommand`].
pub struct ReactionService {
    store: Arc<dyn ReactionStore>,
    coordinator: ReactionCoordinator,
    star_toggle: StarToggleHandler,
}

impl ReactionService {
    /// Create a service with the default retry runtime.
    pub fn new(
        store: Arc<dyn ReactionStore>,
        clock: Arc<dyn Clock>,
        config: CoordinatorConfig,
    ) -> Self {
        Self::with_runtime(store, clock, CoordinatorRuntime::default(), config)
    }

    /// Create a service with injected sleep and jitter.
    pub fn with_runtime(
        store: Arc<dyn ReactionStore>,
        clock: Arc<dyn Clock>,
        runtime: CoordinatorRuntime,
        config: CoordinatorConfig,
    ) -> Self {
        let in_flight = Arc::new(InFlightRegistry::new());
        Self {
            coordinator: ReactionCoordinator::with_runtime(
                Arc::clone(&store),
                Arc::clone(&in_flight),
                clock,
                runtime,
                config,
            ),
            star_toggle: StarToggleHandler::new(Arc::clone(&store), in_flight),
            store,
        }
    }
}

#[async_trait]
impl ReactionCommand for ReactionService {
    async fn react(
        &self,
        identity: &Identity,
        problem_id: &ProblemId,
        action: ReactionAction,
    ) -> Result<ReactionOutcome, Error> {
        self.coordinator.apply(identity, problem_id, action).await
    }

    async fn toggle_star(
        &self,
        identity: &Identity,
        problem_id: &ProblemId,
    ) -> Result<bool, Error> {
        self.star_toggle.toggle(identity, problem_id).await
    }

    async fn snapshot(
        &self,
        identity: &Identity,
        problem_id: &ProblemId,
    ) -> Result<ReactionView, Error> {
        let problem = self
            .store
            .find_problem(problem_id)
            .await
            .map_err(map_fatal_store_error)?
            .ok_or_else(|| Error::not_found(format!("problem {problem_id} does not exist")))?;

        let Some(user_id) = identity.user_id() else {
            return Ok(ReactionView::anonymous(&problem));
        };
        // A signed-in user without a record yet has reacted to nothing.
        let user = self
            .store
            .find_user(user_id)
            .await
            .map_err(map_fatal_store_error)?;
        Ok(user.map_or_else(
            || ReactionView::anonymous(&problem),
            |user| ReactionView::from_records(&user, &problem),
        ))
    }
}
