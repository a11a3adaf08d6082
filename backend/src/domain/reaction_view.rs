//! Per-(user, problem) view of reactions and counters.

use serde::{Deserialize, Serialize};

use super::{ProblemId, ProblemRecord, ReactionDecision, ReactionState, UserRecord};

/// What a viewer sees for one problem: their own reactions plus the
/// problem's aggregate counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionView {
    /// Like/dislike standing.
    pub reaction: ReactionState,
    /// Whether the viewer starred the problem.
    pub starred: bool,
    /// Whether the viewer solved the problem.
    pub solved: bool,
    /// Problem like counter.
    pub like_count: u32,
    /// Problem dislike counter.
    pub dislike_count: u32,
}

impl ReactionView {
    /// View for a signed-out viewer: counters only.
    pub fn anonymous(problem: &ProblemRecord) -> Self {
        Self {
            like_count: problem.like_count,
            dislike_count: problem.dislike_count,
            ..Self::default()
        }
    }

    /// View derived from stored records.
    ///
    /// A corrupt user record listing the problem as both liked and disliked
    /// is shown as neutral; the coordinator reports it when the user acts.
    pub fn from_records(user: &UserRecord, problem: &ProblemRecord) -> Self {
        Self {
            reaction: user.reaction_on(&problem.id).unwrap_or_default(),
            starred: user.is_starred(&problem.id),
            solved: user.is_solved(&problem.id),
            like_count: problem.like_count,
            dislike_count: problem.dislike_count,
        }
    }

    /// Whether the like reaction is active.
    pub fn liked(&self) -> bool {
        self.reaction.liked()
    }

    /// Whether the dislike reaction is active.
    pub fn disliked(&self) -> bool {
        self.reaction.disliked()
    }

    /// This view with `decision` applied, counters saturating at zero.
    ///
    /// # Examples
    /// ```
    /// use reactions::domain::{decide, ReactionAction, ReactionState, ReactionView};
    ///
    /// let view = ReactionView { like_count: 10, dislike_count: 2, ..ReactionView::default() };
    /// let next = view.with_decision(&decide(ReactionAction::Like, view.reaction));
    /// assert!(next.liked());
    /// assert_eq!(next.like_count, 11);
    /// ```
    pub fn with_decision(&self, decision: &ReactionDecision) -> Self {
        Self {
            reaction: decision.next,
            like_count: self.like_count.saturating_add_signed(decision.like_delta),
            dislike_count: self.dislike_count.saturating_add_signed(decision.dislike_delta),
            ..*self
        }
    }
}

/// Result of a committed like/dislike action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionOutcome {
    /// Problem the action targeted.
    pub problem_id: ProblemId,
    /// Authoritative view written by the transaction.
    pub view: ReactionView,
    /// Transaction attempts used, including the successful one.
    pub attempts: u32,
}

impl ReactionOutcome {
    /// The committed like/dislike standing.
    pub fn state(&self) -> ReactionState {
        self.view.reaction
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{ProblemId, UserId};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn from_records_reads_all_flags() {
        let problem_id = ProblemId::new("two-sum").expect("problem id");
        let problem = ProblemRecord::builder(problem_id.clone())
            .like_count(5)
            .dislike_count(1)
            .build();
        let mut user = UserRecord::new(UserId::random());
        user.set_reaction(&problem_id, ReactionState::Disliked);
        user.starred_problem_ids.insert(problem_id.clone());
        user.solved_problem_ids.insert(problem_id);

        let view = ReactionView::from_records(&user, &problem);
        assert!(view.disliked());
        assert!(view.starred);
        assert!(view.solved);
        assert_eq!((view.like_count, view.dislike_count), (5, 1));
    }

    #[rstest]
    fn anonymous_view_keeps_counters_only() {
        let problem = ProblemRecord::builder(ProblemId::new("two-sum").expect("problem id"))
            .like_count(3)
            .build();
        let view = ReactionView::anonymous(&problem);
        assert_eq!(view.reaction, ReactionState::Neutral);
        assert!(!view.starred);
        assert_eq!(view.like_count, 3);
    }

    #[rstest]
    fn view_serialises_nested_reaction_flags() {
        let view = ReactionView {
            reaction: ReactionState::Liked,
            like_count: 1,
            ..ReactionView::default()
        };
        let value = serde_json::to_value(view).expect("serialise");
        assert_eq!(value["reaction"], json!({"liked": true, "disliked": false}));
        assert_eq!(value["likeCount"], 1);
    }
}
