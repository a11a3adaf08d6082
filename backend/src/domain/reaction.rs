//! Like/dislike decision logic.
//!
//! This module is pure: it never touches the store. The coordinator and the
//! optimistic view cache both call [`decide`], which is what lets the cache
//! predict the committed outcome without a second read.
//!
//! Transition table for [`ReactionAction::Like`] (dislike is symmetric):
//!
//! | current  | next     | like delta | dislike delta |
//! |----------|----------|------------|---------------|
//! | neutral  | liked    | +1         | 0             |
//! | disliked | liked    | +1         | -1            |
//! | liked    | neutral  | -1         | 0             |

use std::fmt;

use serde::{Deserialize, Serialize};

/// A user request against the like/dislike pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionAction {
    /// Toggle the like reaction.
    Like,
    /// Toggle the dislike reaction.
    Dislike,
}

impl ReactionAction {
    /// Stable lowercase name.
    ///
    /// # Examples
    /// ```
    /// use reactions::domain::ReactionAction;
    ///
    /// assert_eq!(ReactionAction::Like.as_str(), "like");
    /// assert_eq!("dislike".parse::<ReactionAction>(), Ok(ReactionAction::Dislike));
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }
}

impl fmt::Display for ReactionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown reaction action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReactionActionError {
    /// The unrecognised input value.
    pub input: String,
}

impl fmt::Display for ParseReactionActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown reaction action: {}", self.input)
    }
}

impl std::error::Error for ParseReactionActionError {}

impl std::str::FromStr for ReactionAction {
    type Err = ParseReactionActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            _ => Err(ParseReactionActionError {
                input: s.to_owned(),
            }),
        }
    }
}

/// A user's like/dislike standing on one problem.
///
/// Liked and disliked are mutually exclusive, so the state is a three-way
/// enum rather than a pair of flags. It serialises as
/// `{"liked": bool, "disliked": bool}` and refuses to deserialise a payload
/// with both set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "ReactionStateDto", into = "ReactionStateDto")]
pub enum ReactionState {
    /// Neither liked nor disliked.
    #[default]
    Neutral,
    /// Liked.
    Liked,
    /// Disliked.
    Disliked,
}

/// Raised when a liked/disliked pair would violate mutual exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BothReactionsActive;

impl fmt::Display for BothReactionsActive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a problem cannot be both liked and disliked")
    }
}

impl std::error::Error for BothReactionsActive {}

impl ReactionState {
    /// Build a state from membership flags.
    ///
    /// # Examples
    /// ```
    /// use reactions::domain::ReactionState;
    ///
    /// assert_eq!(ReactionState::from_flags(true, false), Ok(ReactionState::Liked));
    /// assert!(ReactionState::from_flags(true, true).is_err());
    /// ```
    pub fn from_flags(liked: bool, disliked: bool) -> Result<Self, BothReactionsActive> {
        match (liked, disliked) {
            (false, false) => Ok(Self::Neutral),
            (true, false) => Ok(Self::Liked),
            (false, true) => Ok(Self::Disliked),
            (true, true) => Err(BothReactionsActive),
        }
    }

    /// Whether the like reaction is active.
    pub fn liked(&self) -> bool {
        matches!(self, Self::Liked)
    }

    /// Whether the dislike reaction is active.
    pub fn disliked(&self) -> bool {
        matches!(self, Self::Disliked)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ReactionStateDto {
    liked: bool,
    disliked: bool,
}

impl From<ReactionState> for ReactionStateDto {
    fn from(value: ReactionState) -> Self {
        Self {
            liked: value.liked(),
            disliked: value.disliked(),
        }
    }
}

impl TryFrom<ReactionStateDto> for ReactionState {
    type Error = BothReactionsActive;

    fn try_from(value: ReactionStateDto) -> Result<Self, Self::Error> {
        Self::from_flags(value.liked, value.disliked)
    }
}

/// Outcome of applying one action: the next state plus the counter deltas
/// the Problem record must absorb in the same transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionDecision {
    /// State after the action.
    pub next: ReactionState,
    /// Change to the problem's like counter (-1, 0 or +1).
    pub like_delta: i32,
    /// Change to the problem's dislike counter (-1, 0 or +1).
    pub dislike_delta: i32,
}

/// Decide the next state and counter deltas for `action` applied to
/// `current`.
///
/// Acting on the active reaction clears it; acting on the other one switches
/// over and clears the previous reaction.
///
/// # Examples
/// ```
/// use reactions::domain::{decide, ReactionAction, ReactionState};
///
/// let decision = decide(ReactionAction::Dislike, ReactionState::Liked);
/// assert_eq!(decision.next, ReactionState::Disliked);
/// assert_eq!((decision.like_delta, decision.dislike_delta), (-1, 1));
/// ```
pub fn decide(action: ReactionAction, current: ReactionState) -> ReactionDecision {
    use ReactionAction::{Dislike, Like};
    use ReactionState::{Disliked, Liked, Neutral};

    let (next, like_delta, dislike_delta) = match (action, current) {
        (Like, Neutral) => (Liked, 1, 0),
        (Like, Disliked) => (Liked, 1, -1),
        (Like, Liked) => (Neutral, -1, 0),
        (Dislike, Neutral) => (Disliked, 0, 1),
        (Dislike, Liked) => (Disliked, -1, 1),
        (Dislike, Disliked) => (Neutral, 0, -1),
    };

    ReactionDecision {
        next,
        like_delta,
        dislike_delta,
    }
}
