//! Unit tests for the in-memory reaction store.

use rstest::{fixture, rstest};

use super::InMemoryReactionStore;
use crate::domain::ports::{ReactionCommit, ReactionStore, ReactionStoreError};
use crate::domain::{ProblemId, ProblemRecord, ReactionState, UserId, UserRecord};

struct Seeded {
    store: InMemoryReactionStore,
    user_id: UserId,
    problem_id: ProblemId,
}

#[fixture]
fn seeded() -> Seeded {
    let store = InMemoryReactionStore::new();
    let user_id = UserId::new("uid-7").expect("valid user id");
    let problem_id = ProblemId::new("house-robber").expect("valid problem id");
    store.insert_user(UserRecord::new(user_id.clone()));
    store.insert_problem(
        ProblemRecord::builder(problem_id.clone())
            .like_count(3)
            .build(),
    );
    Seeded {
        store,
        user_id,
        problem_id,
    }
}

async fn liked_commit(seeded: &Seeded) -> ReactionCommit {
    let mut user = seeded
        .store
        .find_user(&seeded.user_id)
        .await
        .expect("read user")
        .expect("user exists");
    let mut problem = seeded
        .store
        .find_problem(&seeded.problem_id)
        .await
        .expect("read problem")
        .expect("problem exists");
    user.set_reaction(&seeded.problem_id, ReactionState::Liked);
    problem.like_count += 1;
    ReactionCommit::from_read(user, problem)
}

#[rstest]
#[tokio::test]
async fn commit_writes_both_records_and_bumps_revisions(seeded: Seeded) {
    let commit = liked_commit(&seeded).await;
    seeded
        .store
        .commit_reaction(&commit)
        .await
        .expect("commit succeeds");

    let user = seeded.store.user(&seeded.user_id).expect("user");
    let problem = seeded.store.problem(&seeded.problem_id).expect("problem");
    assert!(user.liked_problem_ids.contains(&seeded.problem_id));
    assert_eq!(problem.like_count, 4);
    assert_eq!((user.revision, problem.revision), (2, 2));
}

#[rstest]
#[tokio::test]
async fn stale_commit_conflicts_and_writes_nothing(seeded: Seeded) {
    let first = liked_commit(&seeded).await;
    let second = liked_commit(&seeded).await;
    seeded
        .store
        .commit_reaction(&first)
        .await
        .expect("first commit succeeds");

    let error = seeded
        .store
        .commit_reaction(&second)
        .await
        .expect_err("second commit is stale");

    assert_eq!(error, ReactionStoreError::conflict("users/uid-7"));
    assert_eq!(
        seeded
            .store
            .problem(&seeded.problem_id)
            .expect("problem")
            .like_count,
        4
    );
}

#[rstest]
#[tokio::test]
async fn commit_conflicts_when_only_the_problem_moved(seeded: Seeded) {
    let commit = liked_commit(&seeded).await;
    let mut bumped = seeded.store.problem(&seeded.problem_id).expect("problem");
    bumped.revision += 1;
    seeded.store.insert_problem(bumped);

    let error = seeded
        .store
        .commit_reaction(&commit)
        .await
        .expect_err("problem moved");

    assert_eq!(error, ReactionStoreError::conflict("problems/house-robber"));
    let user = seeded.store.user(&seeded.user_id).expect("user");
    assert!(user.liked_problem_ids.is_empty());
    assert_eq!(user.revision, 1);
}

#[rstest]
#[tokio::test]
async fn commit_against_removed_problem_is_missing_record(seeded: Seeded) {
    let commit = liked_commit(&seeded).await;
    seeded.store.remove_problem(&seeded.problem_id);

    let error = seeded
        .store
        .commit_reaction(&commit)
        .await
        .expect_err("problem removed");

    assert!(matches!(error, ReactionStoreError::MissingRecord { .. }));
}

#[rstest]
#[tokio::test]
async fn toggle_starred_flips_and_bumps_the_user_revision(seeded: Seeded) {
    let on = seeded
        .store
        .toggle_starred(&seeded.user_id, &seeded.problem_id)
        .await
        .expect("toggle on");
    let off = seeded
        .store
        .toggle_starred(&seeded.user_id, &seeded.problem_id)
        .await
        .expect("toggle off");

    assert!(on);
    assert!(!off);
    assert_eq!(seeded.store.user(&seeded.user_id).expect("user").revision, 3);
}

#[rstest]
#[tokio::test]
async fn star_between_read_and_commit_forces_a_conflict(seeded: Seeded) {
    let commit = liked_commit(&seeded).await;
    seeded
        .store
        .toggle_starred(&seeded.user_id, &seeded.problem_id)
        .await
        .expect("toggle");

    let error = seeded
        .store
        .commit_reaction(&commit)
        .await
        .expect_err("user moved");

    assert_eq!(error, ReactionStoreError::conflict("users/uid-7"));
    assert!(
        seeded
            .store
            .user(&seeded.user_id)
            .expect("user")
            .is_starred(&seeded.problem_id)
    );
}

#[rstest]
#[tokio::test]
async fn toggle_for_unknown_user_is_missing_record(seeded: Seeded) {
    let error = seeded
        .store
        .toggle_starred(&UserId::random(), &seeded.problem_id)
        .await
        .expect_err("unknown user");

    assert!(matches!(error, ReactionStoreError::MissingRecord { .. }));
}

#[rstest]
#[tokio::test]
async fn toggle_for_unknown_problem_writes_nothing(seeded: Seeded) {
    let unknown = ProblemId::new("no-such-problem").expect("valid problem id");
    let before = seeded.store.user(&seeded.user_id).expect("user");

    let error = seeded
        .store
        .toggle_starred(&seeded.user_id, &unknown)
        .await
        .expect_err("unknown problem");

    assert_eq!(
        error,
        ReactionStoreError::missing_record("problems/no-such-problem")
    );
    assert_eq!(seeded.store.user(&seeded.user_id).expect("user"), before);
}

#[rstest]
fn problems_are_listed_in_order() {
    let store = InMemoryReactionStore::new();
    for (id, order) in [("c", 3), ("a", 1), ("b", 2)] {
        store.insert_problem(
            ProblemRecord::builder(ProblemId::new(id).expect("valid problem id"))
                .order(order)
                .build(),
        );
    }
    let ids: Vec<_> = store
        .problems()
        .into_iter()
        .map(|problem| problem.id.to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}
