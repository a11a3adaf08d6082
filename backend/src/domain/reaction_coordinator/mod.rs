//! Transactional coordinator for like/dislike actions.
//!
//! One call is one read-modify-commit of the User and Problem records. The
//! coordinator reads both records, asks [`decide`] for the next state and the
//! counter deltas, and hands both rewritten records to the store as a single
//! conditional commit. A write conflict restarts the whole sequence after a
//! jittered exponential backoff, up to the configured attempt bound.
//!
//! Calls on the same (user, problem) pair are not re-entrant: a second call
//! while one is in flight fails with `Busy` before touching the store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::ports::{ReactionCommit, ReactionStore, ReactionStoreError};
use crate::domain::{
    Error, Identity, InFlightRegistry, ProblemId, ReactionAction, ReactionOutcome, ReactionView,
    UserId, decide,
};

mod attempt_error;
mod runtime;

use attempt_error::AttemptError;
pub use runtime::{AttemptJitter, CoordinatorRuntime, TokioSleeper};

/// Retry bounds for conflicting commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Commit attempts per call, including the first.
    pub max_attempts: u32,
    /// Backoff before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound on any single backoff.
    pub max_backoff: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(20),
            max_backoff: Duration::from_millis(250),
        }
    }
}

/// Async sleeping abstraction for conflict retries.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    ///
    /// ```rust
    /// use async_trait::async_trait;
    /// use reactions::domain::RetrySleeper;
    /// use std::sync::Mutex;
    /// use std::time::Duration;
    ///
    /// #[derive(Default)]
    /// struct CountingSleeper {
    ///     calls: Mutex<u32>,
    /// }
    ///
    /// #[async_trait]
    /// impl RetrySleeper for CountingSleeper {
    ///     async fn sleep(&self, _duration: Duration) {
    ///         *self.calls.lock().expect("calls mutex") += 1;
    ///     }
    /// }
    /// # async fn demo() {
    /// let sleeper = CountingSleeper::default();
    /// sleeper.sleep(Duration::from_millis(5)).await;
    /// assert_eq!(*sleeper.calls.lock().expect("calls mutex"), 1);
    /// # }
    /// ```
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay from the exponential base delay.
    ///
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use reactions::domain::BackoffJitter;
    /// use std::time::Duration;
    ///
    /// struct StepJitter;
    /// impl BackoffJitter for StepJitter {
    ///     fn jittered_delay(&self, base: Duration, attempt: u32, _now: chrono::DateTime<Utc>) -> Duration {
    ///         base + Duration::from_millis(u64::from(attempt))
    ///     }
    /// }
    /// let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid time");
    /// assert_eq!(
    ///     StepJitter.jittered_delay(Duration::from_millis(20), 2, now),
    ///     Duration::from_millis(22),
    /// );
    /// ```
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

/// Applies like/dislike actions against the reaction store.
pub struct ReactionCoordinator {
    store: Arc<dyn ReactionStore>,
    in_flight: Arc<InFlightRegistry>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn RetrySleeper>,
    jitter: Arc<dyn BackoffJitter>,
    config: CoordinatorConfig,
}

impl ReactionCoordinator {
    /// Build a coordinator that sleeps on the Tokio timer between retries.
    pub fn new(
        store: Arc<dyn ReactionStore>,
        in_flight: Arc<InFlightRegistry>,
        clock: Arc<dyn Clock>,
        config: CoordinatorConfig,
    ) -> Self {
        Self::with_runtime(
            store,
            in_flight,
            clock,
            CoordinatorRuntime::default(),
            config,
        )
    }

    /// Build a coordinator with injected sleep and jitter.
    pub fn with_runtime(
        store: Arc<dyn ReactionStore>,
        in_flight: Arc<InFlightRegistry>,
        clock: Arc<dyn Clock>,
        runtime: CoordinatorRuntime,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            in_flight,
            clock,
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
            config,
        }
    }

    /// Apply `action` for the signed-in user.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` for an anonymous identity.
    /// - `Busy` while another action on the same pair is in flight.
    /// - `NotFound` when either record is missing.
    /// - `Conflict` once every attempt hit a write conflict.
    /// - `StoreUnavailable` when the store fails.
    /// - `InternalError` when the user record lists the problem as both
    ///   liked and disliked.
    ///
    /// No write has taken effect when an error is returned.
    pub async fn apply(
        &self,
        identity: &Identity,
        problem_id: &ProblemId,
        action: ReactionAction,
    ) -> Result<ReactionOutcome, Error> {
        let user_id = identity.require_user()?;
        let _guard = self
            .in_flight
            .try_acquire(user_id, problem_id)
            .ok_or_else(|| busy_error(problem_id))?;

        let max_attempts = self.config.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            debug!(%user_id, %problem_id, action = action.as_str(), attempt, "reaction attempt");
            match self.run_single_attempt(user_id, problem_id, action).await {
                Ok(view) => {
                    info!(
                        %user_id,
                        %problem_id,
                        action = action.as_str(),
                        attempts = attempt,
                        like_count = view.like_count,
                        dislike_count = view.dislike_count,
                        "reaction committed"
                    );
                    return Ok(ReactionOutcome {
                        problem_id: problem_id.clone(),
                        view,
                        attempts: attempt,
                    });
                }
                Err(AttemptError::Conflict(error)) if attempt < max_attempts => {
                    let delay = self.jitter.jittered_delay(
                        self.retry_base_delay(attempt),
                        attempt,
                        self.clock.utc(),
                    );
                    debug!(
                        %user_id,
                        %problem_id,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        %error,
                        "write conflict; retrying"
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(AttemptError::Conflict(error)) => {
                    warn!(%user_id, %problem_id, attempts = attempt, %error, "reaction retries exhausted");
                    return Err(Error::conflict(format!(
                        "reaction on {problem_id} kept conflicting with concurrent writers"
                    ))
                    .with_details(json!({ "attempts": attempt })));
                }
                Err(AttemptError::Fatal(error)) => return Err(error),
            }
        }

        Err(Error::internal(
            "unreachable reaction retry control-flow state encountered",
        ))
    }

    async fn run_single_attempt(
        &self,
        user_id: &UserId,
        problem_id: &ProblemId,
        action: ReactionAction,
    ) -> Result<ReactionView, AttemptError> {
        let mut user = self
            .store
            .find_user(user_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id} does not exist")))?;
        let mut problem = self
            .store
            .find_problem(problem_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("problem {problem_id} does not exist")))?;

        let current = user.reaction_on(problem_id).map_err(|_| {
            warn!(%user_id, %problem_id, "user record likes and dislikes the same problem");
            Error::internal(format!(
                "user {user_id} both likes and dislikes problem {problem_id}"
            ))
        })?;
        let decision = decide(action, current);
        user.set_reaction(problem_id, decision.next);
        if problem.apply_decision(&decision).clamped {
            warn!(
                %problem_id,
                like_count = problem.like_count,
                dislike_count = problem.dislike_count,
                "reaction counter clamped; counters have drifted from memberships"
            );
        }

        let commit = ReactionCommit::from_read(user, problem);
        self.store
            .commit_reaction(&commit)
            .await
            .map_err(map_store_error)?;
        Ok(ReactionView::from_records(&commit.user, &commit.problem))
    }

    fn retry_base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.config.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.config.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

pub(crate) fn busy_error(problem_id: &ProblemId) -> Error {
    Error::busy(format!("an action on {problem_id} is already in progress"))
}

fn map_store_error(error: ReactionStoreError) -> AttemptError {
    match error {
        ReactionStoreError::Conflict { .. } => AttemptError::Conflict(error),
        other => AttemptError::Fatal(map_fatal_store_error(other)),
    }
}

/// Map a non-retried store failure into the domain error.
pub(crate) fn map_fatal_store_error(error: ReactionStoreError) -> Error {
    match error {
        ReactionStoreError::MissingRecord { record } => {
            Error::not_found(format!("record {record} does not exist"))
        }
        ReactionStoreError::Conflict { record } => {
            Error::conflict(format!("write conflict on {record}"))
        }
        other @ (ReactionStoreError::Unavailable { .. } | ReactionStoreError::Query { .. }) => {
            warn!(error = %other, "reaction store failure");
            Error::store_unavailable(other.to_string())
        }
    }
}
