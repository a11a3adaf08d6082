//! Profile listings of solved and starred problems.
//!
//! Both listings resolve the ids held on the user record through point reads
//! on the Problem records. Ids whose problem has since been removed are
//! dropped from the listing rather than failing it.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{ProfileReactionsQuery, ReactionStore};
use crate::domain::reaction_coordinator::map_fatal_store_error;
use crate::domain::{Error, ProblemId, ProblemRecord, ProblemSummary, UserId, UserRecord};

/// Profile listing service implementing [`ProfileReactionsQuery`].
#[derive(Clone)]
pub struct ProfileReactionsService {
    store: Arc<dyn ReactionStore>,
}

impl ProfileReactionsService {
    /// Create a service reading from `store`.
    pub fn new(store: Arc<dyn ReactionStore>) -> Self {
        Self { store }
    }

    async fn load_user(&self, user_id: &UserId) -> Result<UserRecord, Error> {
        self.store
            .find_user(user_id)
            .await
            .map_err(map_fatal_store_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id} does not exist")))
    }

    async fn resolve(&self, ids: &BTreeSet<ProblemId>) -> Result<Vec<ProblemSummary>, Error> {
        let mut problems: Vec<ProblemRecord> = Vec::with_capacity(ids.len());
        for problem_id in ids {
            match self
                .store
                .find_problem(problem_id)
                .await
                .map_err(map_fatal_store_error)?
            {
                Some(problem) => problems.push(problem),
                None => debug!(%problem_id, "skipping listed problem that no longer exists"),
            }
        }
        problems.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(problems.iter().map(ProblemSummary::from).collect())
    }
}

#[async_trait]
impl ProfileReactionsQuery for ProfileReactionsService {
    async fn solved_problems(&self, user_id: &UserId) -> Result<Vec<ProblemSummary>, Error> {
        let user = self.load_user(user_id).await?;
        self.resolve(&user.solved_problem_ids).await
    }

    async fn starred_problems(&self, user_id: &UserId) -> Result<Vec<ProblemSummary>, Error> {
        let user = self.load_user(user_id).await?;
        self.resolve(&user.starred_problem_ids).await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{MockReactionStore, ReactionStoreError};
    use crate::domain::{Difficulty, ErrorCode};
    use rstest::{fixture, rstest};

    fn pid(value: &str) -> ProblemId {
        ProblemId::new(value).expect("valid problem id")
    }

    #[fixture]
    fn catalogue() -> Vec<ProblemRecord> {
        vec![
            ProblemRecord::builder(pid("two-sum"))
                .title("Two Sum")
                .category("Array")
                .difficulty(Difficulty::Easy)
                .order(1)
                .build(),
            ProblemRecord::builder(pid("lru-cache"))
                .title("LRU Cache")
                .category("Design")
                .difficulty(Difficulty::Medium)
                .order(3)
                .build(),
            ProblemRecord::builder(pid("median-of-two-sorted-arrays"))
                .title("Median of Two Sorted Arrays")
                .category("Binary Search")
                .difficulty(Difficulty::Hard)
                .order(2)
                .build(),
        ]
    }

    fn store_for(user: UserRecord, catalogue: Vec<ProblemRecord>) -> MockReactionStore {
        let mut store = MockReactionStore::new();
        store
            .expect_find_user()
            .returning(move |_| Ok(Some(user.clone())));
        store.expect_find_problem().returning(move |id| {
            Ok(catalogue.iter().find(|problem| &problem.id == id).cloned())
        });
        store
    }

    #[rstest]
    #[tokio::test]
    async fn solved_listing_follows_problem_order(catalogue: Vec<ProblemRecord>) {
        let mut user = UserRecord::new(UserId::random());
        for id in ["lru-cache", "two-sum", "median-of-two-sorted-arrays"] {
            user.solved_problem_ids.insert(pid(id));
        }
        let user_id = user.id.clone();
        let service = ProfileReactionsService::new(Arc::new(store_for(user, catalogue)));

        let solved = service.solved_problems(&user_id).await.expect("listing");
        let titles: Vec<_> = solved.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Two Sum", "Median of Two Sorted Arrays", "LRU Cache"]
        );
        assert_eq!(solved[2].difficulty, Difficulty::Medium);
    }

    #[rstest]
    #[tokio::test]
    async fn starred_listing_skips_removed_problems(catalogue: Vec<ProblemRecord>) {
        let mut user = UserRecord::new(UserId::random());
        user.starred_problem_ids.insert(pid("two-sum"));
        user.starred_problem_ids.insert(pid("retired-problem"));
        let user_id = user.id.clone();
        let service = ProfileReactionsService::new(Arc::new(store_for(user, catalogue)));

        let starred = service.starred_problems(&user_id).await.expect("listing");
        assert_eq!(starred.len(), 1);
        assert_eq!(starred[0].id, pid("two-sum"));
        assert_eq!(starred[0].category, "Array");
    }

    #[rstest]
    #[tokio::test]
    async fn missing_user_is_not_found() {
        let mut store = MockReactionStore::new();
        store.expect_find_user().returning(|_| Ok(None));
        let service = ProfileReactionsService::new(Arc::new(store));

        let error = service
            .solved_problems(&UserId::random())
            .await
            .expect_err("missing user");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn store_failure_fails_the_listing() {
        let mut store = MockReactionStore::new();
        store
            .expect_find_user()
            .returning(|_| Err(ReactionStoreError::query("read timed out")));
        let service = ProfileReactionsService::new(Arc::new(store));

        let error = service
            .starred_problems(&UserId::random())
            .await
            .expect_err("store failure");
        assert_eq!(error.code(), ErrorCode::StoreUnavailable);
    }
}
