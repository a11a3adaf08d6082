//! `reaction-sim`: drives many concurrent reaction sessions against the
//! in-memory store and checks that counters still match memberships.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use futures_util::future::join_all;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Builder;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use reactions::ReactionSettings;
use reactions::domain::ports::{ReactionCommand, StaticIdentityProvider};
use reactions::domain::{
    CounterAuditReport, Difficulty, ErrorCode, Identity, ProblemId, ProblemRecord,
    ReactionAction, ReactionService, UserId, UserRecord,
};
use reactions::inbound::ReactionSession;
use reactions::outbound::InMemoryReactionStore;

/// `reaction-sim` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reaction-sim",
    about = "Simulate concurrent likes, dislikes and stars and verify counter conservation",
    version
)]
struct CliArgs {
    /// Number of simulated users, one session each.
    #[arg(long, default_value_t = 32)]
    users: usize,
    /// Number of problems reacted to.
    #[arg(long, default_value_t = 4)]
    problems: usize,
    /// Actions each user performs.
    #[arg(long = "actions-per-user", default_value_t = 50)]
    actions_per_user: usize,
    /// Seed for the per-user action streams.
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    committed: u64,
    conflicted: u64,
    busy: u64,
    failed: u64,
}

impl Tally {
    fn record(&mut self, code: Option<ErrorCode>) {
        match code {
            None => self.committed += 1,
            Some(ErrorCode::Conflict) => self.conflicted += 1,
            Some(ErrorCode::Busy) => self.busy += 1,
            Some(_) => self.failed += 1,
        }
    }

    fn merge(&mut self, other: Self) {
        self.committed += other.committed;
        self.conflicted += other.conflicted;
        self.busy += other.busy;
        self.failed += other.failed;
    }
}

struct UserRun {
    user_id: UserId,
    session: ReactionSession,
    tally: Tally,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = ReactionSettings::load_from_iter([OsString::from("reaction-sim")])
        .map_err(|error| eyre!("load reaction settings: {error}"))?;
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(simulate(args, settings))
}

async fn simulate(args: CliArgs, settings: ReactionSettings) -> Result<()> {
    let store = Arc::new(InMemoryReactionStore::new());
    let problem_ids = seed_problems(&store, args.problems)?;
    if problem_ids.is_empty() {
        return Err(eyre!("--problems must be at least 1"));
    }
    let user_ids = seed_users(&store, args.users)?;

    let config = settings.coordinator_config();
    info!(
        users = args.users,
        problems = args.problems,
        actions_per_user = args.actions_per_user,
        max_attempts = config.max_attempts,
        "starting reaction simulation"
    );
    let command: Arc<dyn ReactionCommand> = Arc::new(ReactionService::new(
        store.clone(),
        Arc::new(DefaultClock),
        config,
    ));

    let handles = user_ids.into_iter().enumerate().map(|(index, user_id)| {
        let command = Arc::clone(&command);
        let problem_ids = problem_ids.clone();
        let seed = args
            .seed
            .wrapping_add(u64::try_from(index).unwrap_or(u64::MAX));
        tokio::spawn(run_user(
            command,
            user_id,
            problem_ids,
            args.actions_per_user,
            seed,
        ))
    });

    let mut total = Tally::default();
    let mut runs = Vec::new();
    for joined in join_all(handles).await {
        let run = joined.wrap_err("user task panicked")?;
        total.merge(run.tally);
        runs.push(run);
    }

    let report = CounterAuditReport::evaluate(&store.users(), &store.problems());
    let stale_views = count_divergent_views(&store, &runs, &problem_ids);
    info!(
        committed = total.committed,
        conflicted = total.conflicted,
        busy = total.busy,
        failed = total.failed,
        users_checked = report.users_checked,
        problems_checked = report.problems_checked,
        violations = report.violations.len(),
        stale_views,
        "reaction simulation finished"
    );
    println!(
        "committed={} conflicted={} busy={} failed={} violations={} stale_views={}",
        total.committed,
        total.conflicted,
        total.busy,
        total.failed,
        report.violations.len(),
        stale_views
    );
    for problem in store.problems() {
        println!(
            "{} likes={} dislikes={}",
            problem.id, problem.like_count, problem.dislike_count
        );
    }

    for violation in &report.violations {
        error!(%violation, "counter conservation violated");
    }
    if !report.is_consistent() || stale_views > 0 {
        return Err(eyre!(
            "{} conservation violations and {stale_views} sessions showing uncommitted state",
            report.violations.len()
        ));
    }
    Ok(())
}

async fn run_user(
    command: Arc<dyn ReactionCommand>,
    user_id: UserId,
    problem_ids: Vec<ProblemId>,
    actions: usize,
    seed: u64,
) -> UserRun {
    let identity = Arc::new(StaticIdentityProvider::new(Identity::authenticated(
        user_id.clone(),
    )));
    let session = ReactionSession::new(command, identity);
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut tally = Tally::default();

    for problem_id in &problem_ids {
        if let Err(error) = session.open(problem_id).await {
            warn!(%user_id, %problem_id, %error, "hydration failed");
        }
    }

    for _ in 0..actions {
        let problem_id = &problem_ids[rng.gen_range(0..problem_ids.len())];
        let roll = rng.gen_range(0..10);
        let code = if roll < 4 {
            session.react(problem_id, ReactionAction::Like).await.err()
        } else if roll < 8 {
            session.react(problem_id, ReactionAction::Dislike).await.err()
        } else {
            session.toggle_star(problem_id).await.err()
        }
        .map(|error| error.code());
        tally.record(code);
        if rng.gen_bool(0.3) {
            tokio::task::yield_now().await;
        }
    }

    UserRun {
        user_id,
        session,
        tally,
    }
}

fn seed_problems(store: &InMemoryReactionStore, count: usize) -> Result<Vec<ProblemId>> {
    const DIFFICULTIES: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
    (0..count)
        .map(|index| {
            let problem_id =
                ProblemId::new(format!("problem-{index}")).wrap_err("build problem id")?;
            let order = u32::try_from(index).wrap_err("problem count exceeds u32")?;
            store.insert_problem(
                ProblemRecord::builder(problem_id.clone())
                    .title(format!("Problem {index}"))
                    .category("Simulation")
                    .difficulty(DIFFICULTIES[index % DIFFICULTIES.len()])
                    .order(order)
                    .build(),
            );
            Ok(problem_id)
        })
        .collect()
}

fn seed_users(store: &InMemoryReactionStore, count: usize) -> Result<Vec<UserId>> {
    (0..count)
        .map(|index| {
            let user_id = UserId::new(format!("user-{index}")).wrap_err("build user id")?;
            store.insert_user(UserRecord::new(user_id.clone()));
            Ok(user_id)
        })
        .collect()
}

/// Sessions whose cached flags disagree with the stored user record.
///
/// Counters are allowed to be stale; flags only change through the session's
/// own actions, so they must match once everything has settled.
fn count_divergent_views(
    store: &InMemoryReactionStore,
    runs: &[UserRun],
    problem_ids: &[ProblemId],
) -> usize {
    runs.iter()
        .filter(|run| {
            let Some(user) = store.user(&run.user_id) else {
                return true;
            };
            problem_ids.iter().any(|problem_id| {
                let view = run.session.get_view(problem_id);
                user.reaction_on(problem_id).ok() != Some(view.reaction)
                    || user.is_starred(problem_id) != view.starred
            })
        })
        .count()
}
