//! User and Problem records as held by the document store.
//!
//! The reaction engine only ever mutates the four membership sets on
//! [`UserRecord`] and the two counters on [`ProblemRecord`]. Every other field
//! is authored elsewhere and read-only here. Both records carry a `revision`
//! that the store bumps on every write; the coordinator uses it to detect
//! write-write conflicts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{BothReactionsActive, ProblemId, ReactionDecision, ReactionState, UserId};

/// Problem difficulty as authored.
///
/// # Examples
/// ```
/// use reactions::domain::Difficulty;
///
/// assert_eq!("Medium".parse::<Difficulty>(), Ok(Difficulty::Medium));
/// assert_eq!(Difficulty::Hard.to_string(), "Hard");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// Introductory problems.
    #[default]
    Easy,
    /// Intermediate problems.
    Medium,
    /// Advanced problems.
    Hard,
}

impl Difficulty {
    /// Returns the stored string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown difficulty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDifficultyError {
    /// The unrecognised input value.
    pub input: String,
}

impl std::fmt::Display for ParseDifficultyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown difficulty: {}", self.input)
    }
}

impl std::error::Error for ParseDifficultyError {}

impl std::str::FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Self::Easy),
            "Medium" => Ok(Self::Medium),
            "Hard" => Ok(Self::Hard),
            _ => Err(ParseDifficultyError {
                input: s.to_owned(),
            }),
        }
    }
}

/// Per-account reaction memberships.
///
/// ## Invariants
/// - `liked_problem_ids` and `disliked_problem_ids` are disjoint.
/// - starred and solved memberships are independent of like/dislike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Account identifier.
    pub id: UserId,
    /// Problems the user likes.
    pub liked_problem_ids: BTreeSet<ProblemId>,
    /// Problems the user dislikes.
    pub disliked_problem_ids: BTreeSet<ProblemId>,
    /// Problems the user starred.
    pub starred_problem_ids: BTreeSet<ProblemId>,
    /// Problems the grading flow marked as solved.
    pub solved_problem_ids: BTreeSet<ProblemId>,
    /// Store revision, bumped on every write.
    pub revision: u64,
}

impl UserRecord {
    /// Create a record with no reactions at revision 1.
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            liked_problem_ids: BTreeSet::new(),
            disliked_problem_ids: BTreeSet::new(),
            starred_problem_ids: BTreeSet::new(),
            solved_problem_ids: BTreeSet::new(),
            revision: 1,
        }
    }

    /// Current like/dislike standing on `problem_id`.
    ///
    /// Fails only for a corrupt record that lists the problem in both sets.
    pub fn reaction_on(&self, problem_id: &ProblemId) -> Result<ReactionState, BothReactionsActive> {
        ReactionState::from_flags(
            self.liked_problem_ids.contains(problem_id),
            self.disliked_problem_ids.contains(problem_id),
        )
    }

    /// Rewrite the like/dislike memberships for `problem_id` to `state`.
    pub fn set_reaction(&mut self, problem_id: &ProblemId, state: ReactionState) {
        set_membership(&mut self.liked_problem_ids, problem_id, state.liked());
        set_membership(&mut self.disliked_problem_ids, problem_id, state.disliked());
    }

    /// Whether `problem_id` is starred.
    pub fn is_starred(&self, problem_id: &ProblemId) -> bool {
        self.starred_problem_ids.contains(problem_id)
    }

    /// Whether `problem_id` is solved.
    pub fn is_solved(&self, problem_id: &ProblemId) -> bool {
        self.solved_problem_ids.contains(problem_id)
    }

    /// Remove `problem_id` from the starred set if present, add it otherwise.
    /// Returns the membership after the toggle.
    pub fn toggle_starred(&mut self, problem_id: &ProblemId) -> bool {
        if self.starred_problem_ids.remove(problem_id) {
            false
        } else {
            self.starred_problem_ids.insert(problem_id.clone());
            true
        }
    }
}

fn set_membership(set: &mut BTreeSet<ProblemId>, problem_id: &ProblemId, present: bool) {
    if present {
        set.insert(problem_id.clone());
    } else {
        set.remove(problem_id);
    }
}

/// Per-problem record: descriptive fields plus the aggregate counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
    /// Problem identifier.
    pub id: ProblemId,
    /// Display title.
    pub title: String,
    /// Topic category, e.g. `Array`.
    pub category: String,
    /// Authored difficulty.
    pub difficulty: Difficulty,
    /// Position in the problem list.
    pub order: u32,
    /// Optional walkthrough video identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    /// Number of users whose liked set contains this problem.
    pub like_count: u32,
    /// Number of users whose disliked set contains this problem.
    pub dislike_count: u32,
    /// Store revision, bumped on every write.
    pub revision: u64,
}

/// Result of folding a decision's deltas into the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterAdjustment {
    /// A counter would have left the `u32` range and was clamped.
    pub clamped: bool,
}

impl ProblemRecord {
    /// Create a builder for constructing a record incrementally.
    pub fn builder(id: ProblemId) -> ProblemRecordBuilder {
        ProblemRecordBuilder::new(id)
    }

    /// Apply the counter deltas of `decision`, saturating at zero.
    ///
    /// # Examples
    /// ```
    /// use reactions::domain::{decide, ProblemId, ProblemRecord, ReactionAction, ReactionState};
    ///
    /// let mut problem = ProblemRecord::builder(ProblemId::new("two-sum").unwrap())
    ///     .like_count(10)
    ///     .build();
    /// let adjustment = problem.apply_decision(&decide(ReactionAction::Like, ReactionState::Neutral));
    /// assert_eq!(problem.like_count, 11);
    /// assert!(!adjustment.clamped);
    /// ```
    pub fn apply_decision(&mut self, decision: &ReactionDecision) -> CounterAdjustment {
        let (likes, likes_clamped) = shift(self.like_count, decision.like_delta);
        let (dislikes, dislikes_clamped) = shift(self.dislike_count, decision.dislike_delta);
        self.like_count = likes;
        self.dislike_count = dislikes;
        CounterAdjustment {
            clamped: likes_clamped || dislikes_clamped,
        }
    }
}

fn shift(value: u32, delta: i32) -> (u32, bool) {
    let shifted = value.saturating_add_signed(delta);
    let exact = i64::from(value) + i64::from(delta);
    (shifted, i64::from(shifted) != exact)
}

/// Builder for [`ProblemRecord`].
#[derive(Debug, Clone)]
pub struct ProblemRecordBuilder {
    id: ProblemId,
    title: Option<String>,
    category: String,
    difficulty: Difficulty,
    order: u32,
    video_id: Option<String>,
    like_count: u32,
    dislike_count: u32,
    revision: u64,
}

impl ProblemRecordBuilder {
    /// Create a new builder for the given problem.
    pub fn new(id: ProblemId) -> Self {
        Self {
            id,
            title: None,
            category: String::new(),
            difficulty: Difficulty::default(),
            order: 0,
            video_id: None,
            like_count: 0,
            dislike_count: 0,
            revision: 1,
        }
    }

    /// Set the display title. Defaults to the problem id.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the difficulty.
    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Set the list position.
    pub fn order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Set the walkthrough video id.
    pub fn video_id(mut self, video_id: impl Into<String>) -> Self {
        self.video_id = Some(video_id.into());
        self
    }

    /// Set the like counter.
    pub fn like_count(mut self, count: u32) -> Self {
        self.like_count = count;
        self
    }

    /// Set the dislike counter.
    pub fn dislike_count(mut self, count: u32) -> Self {
        self.dislike_count = count;
        self
    }

    /// Set the revision.
    pub fn revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// Build the final [`ProblemRecord`].
    pub fn build(self) -> ProblemRecord {
        let title = self.title.unwrap_or_else(|| self.id.to_string());
        ProblemRecord {
            id: self.id,
            title,
            category: self.category,
            difficulty: self.difficulty,
            order: self.order,
            video_id: self.video_id,
            like_count: self.like_count,
            dislike_count: self.dislike_count,
            revision: self.revision,
        }
    }
}

/// Read-only problem listing entry used by profile queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSummary {
    /// Problem identifier.
    pub id: ProblemId,
    /// Display title.
    pub title: String,
    /// Topic category.
    pub category: String,
    /// Authored difficulty.
    pub difficulty: Difficulty,
}

impl From<&ProblemRecord> for ProblemSummary {
    fn from(value: &ProblemRecord) -> Self {
        Self {
            id: value.id.clone(),
            title: value.title.clone(),
            category: value.category.clone(),
            difficulty: value.difficulty,
        }
    }
}
