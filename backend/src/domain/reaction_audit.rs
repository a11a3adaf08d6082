//! Counter conservation audit.
//!
//! At quiescence every problem's like counter must equal the number of users
//! whose liked set holds it, and likewise for dislikes. No user may hold a
//! problem in both sets. This module checks a full set of records against
//! those rules and reports each violation it finds.

use std::collections::HashMap;

use super::{ProblemId, ProblemRecord, UserId, UserRecord};

/// One broken conservation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterViolation {
    /// The like counter disagrees with the liked memberships.
    LikeCount {
        /// Problem whose counter drifted.
        problem_id: ProblemId,
        /// Stored counter.
        stored: u32,
        /// Number of users whose liked set holds the problem.
        members: u32,
    },
    /// The dislike counter disagrees with the disliked memberships.
    DislikeCount {
        /// Problem whose counter drifted.
        problem_id: ProblemId,
        /// Stored counter.
        stored: u32,
        /// Number of users whose disliked set holds the problem.
        members: u32,
    },
    /// A user both likes and dislikes a problem.
    BothReactions {
        /// Offending user.
        user_id: UserId,
        /// Problem present in both sets.
        problem_id: ProblemId,
    },
}

/// Outcome of auditing a set of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterAuditReport {
    /// Problems examined.
    pub problems_checked: usize,
    /// Users examined.
    pub users_checked: usize,
    /// Every violation found, problems first.
    pub violations: Vec<CounterViolation>,
}

impl CounterAuditReport {
    /// Audit `problems` against the memberships held by `users`.
    ///
    /// Memberships pointing at problems absent from `problems` are ignored.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reactions::domain::{CounterAuditReport, ProblemId, ProblemRecord, ReactionState, UserId, UserRecord};
    ///
    /// let problem_id = ProblemId::new("two-sum").expect("valid id");
    /// let mut user = UserRecord::new(UserId::random());
    /// user.set_reaction(&problem_id, ReactionState::Liked);
    /// let problem = ProblemRecord::builder(problem_id).like_count(1).build();
    ///
    /// let report = CounterAuditReport::evaluate(&[user], &[problem]);
    /// assert!(report.is_consistent());
    /// ```
    pub fn evaluate(users: &[UserRecord], problems: &[ProblemRecord]) -> Self {
        let mut likes: HashMap<&ProblemId, u32> = HashMap::new();
        let mut dislikes: HashMap<&ProblemId, u32> = HashMap::new();
        let mut both = Vec::new();

        for user in users {
            for problem_id in &user.liked_problem_ids {
                *likes.entry(problem_id).or_default() += 1;
                if user.disliked_problem_ids.contains(problem_id) {
                    both.push(CounterViolation::BothReactions {
                        user_id: user.id.clone(),
                        problem_id: problem_id.clone(),
                    });
                }
            }
            for problem_id in &user.disliked_problem_ids {
                *dislikes.entry(problem_id).or_default() += 1;
            }
        }

        let mut violations = Vec::new();
        for problem in problems {
            let liked = likes.get(&problem.id).copied().unwrap_or(0);
            if liked != problem.like_count {
                violations.push(CounterViolation::LikeCount {
                    problem_id: problem.id.clone(),
                    stored: problem.like_count,
                    members: liked,
                });
            }
            let disliked = dislikes.get(&problem.id).copied().unwrap_or(0);
            if disliked != problem.dislike_count {
                violations.push(CounterViolation::DislikeCount {
                    problem_id: problem.id.clone(),
                    stored: problem.dislike_count,
                    members: disliked,
                });
            }
        }
        violations.extend(both);

        Self {
            problems_checked: problems.len(),
            users_checked: users.len(),
            violations,
        }
    }

    /// True when no violation was found.
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

impl std::fmt::Display for CounterViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LikeCount {
                problem_id,
                stored,
                members,
            } => write!(f, "{problem_id}: likeCount {stored} but {members} liking users"),
            Self::DislikeCount {
                problem_id,
                stored,
                members,
            } => write!(
                f,
                "{problem_id}: dislikeCount {stored} but {members} disliking users"
            ),
            Self::BothReactions {
                user_id,
                problem_id,
            } => write!(f, "{user_id} both likes and dislikes {problem_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ReactionState;
    use rstest::{fixture, rstest};

    #[fixture]
    fn problem_id() -> ProblemId {
        ProblemId::new("two-sum").expect("valid problem id")
    }

    fn user_with(problem_id: &ProblemId, state: ReactionState) -> UserRecord {
        let mut user = UserRecord::new(UserId::random());
        user.set_reaction(problem_id, state);
        user
    }

    #[rstest]
    fn matching_counters_pass(problem_id: ProblemId) {
        let users = vec![
            user_with(&problem_id, ReactionState::Liked),
            user_with(&problem_id, ReactionState::Liked),
            user_with(&problem_id, ReactionState::Disliked),
            user_with(&problem_id, ReactionState::Neutral),
        ];
        let problem = ProblemRecord::builder(problem_id)
            .like_count(2)
            .dislike_count(1)
            .build();

        let report = CounterAuditReport::evaluate(&users, &[problem]);
        assert!(report.is_consistent());
        assert_eq!((report.users_checked, report.problems_checked), (4, 1));
    }

    #[rstest]
    fn drifted_counter_is_reported(problem_id: ProblemId) {
        let users = vec![user_with(&problem_id, ReactionState::Liked)];
        let problem = ProblemRecord::builder(problem_id.clone())
            .like_count(3)
            .build();

        let report = CounterAuditReport::evaluate(&users, &[problem]);
        assert_eq!(
            report.violations,
            vec![CounterViolation::LikeCount {
                problem_id,
                stored: 3,
                members: 1,
            }]
        );
        assert_eq!(
            report.violations[0].to_string(),
            "two-sum: likeCount 3 but 1 liking users"
        );
    }

    #[rstest]
    fn user_in_both_sets_is_reported(problem_id: ProblemId) {
        let mut user = UserRecord::new(UserId::random());
        user.liked_problem_ids.insert(problem_id.clone());
        user.disliked_problem_ids.insert(problem_id.clone());
        let problem = ProblemRecord::builder(problem_id)
            .like_count(1)
            .dislike_count(1)
            .build();

        let report = CounterAuditReport::evaluate(&[user], &[problem]);
        assert!(matches!(
            report.violations.as_slice(),
            [CounterViolation::BothReactions { .. }]
        ));
    }
}
