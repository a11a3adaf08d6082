//! Domain primitives, services and ports for problem reactions.
//!
//! Purpose: keep every rule about likes, dislikes, stars and the problem
//! counters in one place, free of storage and UI concerns. Adapters reach the
//! domain only through [`ports`].
//!
//! Public surface:
//! - Records and identifiers: [`UserRecord`], [`ProblemRecord`], [`UserId`],
//!   [`ProblemId`].
//! - The reaction state machine: [`decide`], [`ReactionState`],
//!   [`ReactionAction`].
//! - Services: [`ReactionService`] (writes and hydration) and
//!   [`ProfileReactionsService`] (profile listings).
//! - The per-session [`OptimisticViewCache`].
//! - [`Error`] and [`ErrorCode`], the only error surfaced to callers.

pub mod error;
pub mod identity;
pub mod ids;
pub mod in_flight;
pub mod ports;
pub mod profile_reactions;
pub mod reaction;
pub mod reaction_audit;
pub mod reaction_coordinator;
pub mod reaction_service;
pub mod reaction_view;
pub mod records;
pub mod star_toggle;
pub mod view_cache;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::Identity;
pub use self::ids::{IdValidationError, ProblemId, UserId};
pub use self::in_flight::{InFlightGuard, InFlightRegistry};
pub use self::profile_reactions::ProfileReactionsService;
pub use self::reaction::{
    BothReactionsActive, ParseReactionActionError, ReactionAction, ReactionDecision,
    ReactionState, decide,
};
pub use self::reaction_audit::{CounterAuditReport, CounterViolation};
pub use self::reaction_coordinator::{
    AttemptJitter, BackoffJitter, CoordinatorConfig, CoordinatorRuntime, ReactionCoordinator,
    RetrySleeper, TokioSleeper,
};
pub use self::reaction_service::ReactionService;
pub use self::reaction_view::{ReactionOutcome, ReactionView};
pub use self::records::{
    CounterAdjustment, Difficulty, ParseDifficultyError, ProblemRecord, ProblemRecordBuilder,
    ProblemSummary, UserRecord,
};
pub use self::star_toggle::StarToggleHandler;
pub use self::view_cache::{OptimisticViewCache, PendingTicket, ViewCacheError, ViewPhase};

/// Result alias for domain operations.
///
/// # Examples
/// ```
/// use reactions::domain::{Error, ReactionResult};
///
/// fn refuse() -> ReactionResult<bool> {
///     Err(Error::busy("an action on two-sum is already in progress"))
/// }
/// assert!(refuse().is_err());
/// ```
pub type ReactionResult<T> = Result<T, Error>;
