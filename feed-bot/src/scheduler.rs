//! Like scheduling.
//!
//! The scheduler is a state machine driven one transition at a time:
//!
//! ```text
//!   ┌─────────────┐   no liker    ┌──────┐
//!   │ SelectLiker │──────────────▶│      │
//!   └──────┬──────┘               │      │
//!          ▼                      │      │
//!   ┌───────────────┐ no target   │ Stop │
//!   │ SelectTargets │────────────▶│      │
//!   └──────┬────────┘             │      │
//!          ▼                      │      │
//!   ┌──────────┐  all posts liked │      │
//!   │ LikeLoop │─────────────────▶│      │
//!   └──────┬───┘                  └──────┘
//!          │ zero-like posts remain
//!          └──────▶ SelectLiker
//! ```
//!
//! Rules:
//! - The liker is the eligible actor with the most posts; ties go to the
//!   actor registered first. Counts are re-read from the service before
//!   every selection.
//! - An actor is eligible while `likes_given <= max_likes_per_user`, it has
//!   allowance left, and it has not taken a turn yet.
//! - Targets are the zero-like posts not written by the liker, read once at
//!   the start of the turn. The turn works on that snapshot even though its
//!   own likes change which posts have zero likes; the global zero-like check
//!   happens only when the turn ends.
//! - A turn performs `min(max_likes_per_user, |targets|)` likes, capped by
//!   the actor's remaining allowance, picking targets uniformly at random
//!   without replacement.
//! - A failed like consumes its target and the turn moves on to another one.
//!   After `max_consecutive_faults` failures in a row the turn is abandoned.
//! - Failed aggregate reads never end the run. Liker selection falls back to
//!   the locally tracked counts, a failed target read abandons the turn, and a
//!   failed global check continues with the next selection.

use feed_client::{ActivityClient, LikeOutcome, PostId};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::population::Population;

/// Why the scheduler stopped. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No actor may like anything anymore
    NoEligibleLiker,
    /// The selected liker found no zero-like post written by someone else
    NoEligibleTarget,
    /// Every post has at least one like
    AllPostsLiked,
}

/// Scheduler state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerState {
    SelectLiker,
    SelectTargets {
        /// Population index of the liker
        liker: usize,
    },
    LikeLoop {
        liker: usize,
        /// Zero-like posts at turn start, excluding the liker's own
        snapshot: Vec<PostId>,
        quota: usize,
    },
    Stop(StopReason),
}

/// What happened during one actor's turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub handle: String,
    /// Size of the target snapshot
    pub targets: usize,
    pub quota: usize,
    pub likes: usize,
    pub faults: usize,
    /// Turn ended early on persistent faults or a failed target read
    pub abandoned: bool,
}

/// Outcome of the scheduling stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerReport {
    pub turns: Vec<TurnReport>,
    pub likes: u64,
    pub faults: u64,
    pub stop_reason: StopReason,
}

/// The like scheduler.
///
/// All service access goes through the [`ActivityClient`] handed in at
/// construction. Turns run strictly one after another.
pub struct LikeScheduler<'a> {
    client: &'a dyn ActivityClient,
    max_likes_per_user: u64,
    max_consecutive_faults: usize,
    state: SchedulerState,
    /// Indexed like the population
    acted: Vec<bool>,
    turns: Vec<TurnReport>,
}

impl<'a> LikeScheduler<'a> {
    pub fn new(client: &'a dyn ActivityClient, max_likes_per_user: usize) -> Self {
        Self {
            client,
            max_likes_per_user: max_likes_per_user as u64,
            max_consecutive_faults: 3,
            state: SchedulerState::SelectLiker,
            acted: Vec::new(),
            turns: Vec::new(),
        }
    }

    /// Consecutive failed likes after which a turn is abandoned.
    pub fn with_max_consecutive_faults(mut self, n: usize) -> Self {
        self.max_consecutive_faults = n.max(1);
        self
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.state, SchedulerState::Stop(_))
    }

    /// Reports of the turns taken so far.
    pub fn turns(&self) -> &[TurnReport] {
        &self.turns
    }

    /// Run until a stop condition fires.
    pub async fn run<R: Rng + ?Sized>(
        mut self,
        population: &mut Population,
        rng: &mut R,
    ) -> SchedulerReport {
        info!(
            actors = population.len(),
            max_likes_per_user = self.max_likes_per_user,
            "Like scheduling started"
        );

        let stop_reason = loop {
            if let SchedulerState::Stop(reason) = &self.state {
                break *reason;
            }
            self.step(population, rng).await;
        };

        let report = SchedulerReport {
            likes: self.turns.iter().map(|t| t.likes as u64).sum(),
            faults: self.turns.iter().map(|t| t.faults as u64).sum(),
            turns: self.turns,
            stop_reason,
        };

        info!(
            turns = report.turns.len(),
            likes = report.likes,
            faults = report.faults,
            reason = ?report.stop_reason,
            "Like scheduling stopped"
        );
        report
    }

    /// Perform one state transition.
    pub async fn step<R: Rng + ?Sized>(&mut self, population: &mut Population, rng: &mut R) {
        if self.acted.len() != population.len() {
            self.acted.resize(population.len(), false);
        }

        let state = std::mem::replace(&mut self.state, SchedulerState::SelectLiker);
        self.state = match state {
            SchedulerState::SelectLiker => self.select_liker(population).await,
            SchedulerState::SelectTargets { liker } => {
                self.select_targets(population, liker).await
            }
            SchedulerState::LikeLoop {
                liker,
                snapshot,
                quota,
            } => {
                self.like_loop(population, liker, snapshot, quota, rng)
                    .await
            }
            stop @ SchedulerState::Stop(_) => stop,
        };
    }

    async fn select_liker(&mut self, population: &mut Population) -> SchedulerState {
        match self.client.query_actor_stats().await {
            Ok(stats) => {
                for actor in population.actors_mut() {
                    if let Some(s) = stats.get(&actor.handle) {
                        actor.apply_stats(*s);
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Actor stats unavailable, using local counts");
            }
        }

        let mut best: Option<usize> = None;
        for (index, actor) in population.iter().enumerate() {
            if self.acted[index] || actor.likes_given > self.max_likes_per_user {
                continue;
            }
            if self.max_likes_per_user - actor.likes_given == 0 {
                continue;
            }
            match best {
                Some(b) if population.actors()[b].posts_authored >= actor.posts_authored => {}
                _ => best = Some(index),
            }
        }

        match best {
            Some(liker) => {
                let actor = &population.actors()[liker];
                debug!(
                    handle = %actor.handle,
                    posts = actor.posts_authored,
                    likes = actor.likes_given,
                    "Liker selected"
                );
                SchedulerState::SelectTargets { liker }
            }
            None => SchedulerState::Stop(StopReason::NoEligibleLiker),
        }
    }

    async fn select_targets(&mut self, population: &Population, liker: usize) -> SchedulerState {
        let actor = &population.actors()[liker];
        self.acted[liker] = true;

        let targets = match self.client.query_zero_like_posts(Some(&actor.handle)).await {
            Ok(targets) => targets,
            Err(e) => {
                warn!(handle = %actor.handle, error = %e, "Target query failed, abandoning turn");
                self.turns.push(TurnReport {
                    handle: actor.handle.clone(),
                    targets: 0,
                    quota: 0,
                    likes: 0,
                    faults: 1,
                    abandoned: true,
                });
                return SchedulerState::SelectLiker;
            }
        };

        if targets.is_empty() {
            info!(handle = %actor.handle, "No zero-like posts to like");
            return SchedulerState::Stop(StopReason::NoEligibleTarget);
        }

        let allowance = self.max_likes_per_user.saturating_sub(actor.likes_given) as usize;
        let quota = (self.max_likes_per_user as usize)
            .min(targets.len())
            .min(allowance);

        SchedulerState::LikeLoop {
            liker,
            snapshot: targets.into_iter().collect(),
            quota,
        }
    }

    async fn like_loop<R: Rng + ?Sized>(
        &mut self,
        population: &mut Population,
        liker: usize,
        mut pool: Vec<PostId>,
        quota: usize,
        rng: &mut R,
    ) -> SchedulerState {
        let actor = &mut population.actors_mut()[liker];
        let mut turn = TurnReport {
            handle: actor.handle.clone(),
            targets: pool.len(),
            quota,
            likes: 0,
            faults: 0,
            abandoned: false,
        };

        match actor.session.clone() {
            None => {
                warn!(handle = %actor.handle, "Liker has no session, abandoning turn");
                turn.abandoned = true;
            }
            Some(session) => {
                let mut consecutive_faults = 0;

                while turn.likes < quota && !pool.is_empty() {
                    let post = pool.swap_remove(rng.gen_range(0..pool.len()));

                    let fault = match self.client.like_post(&session, post).await {
                        Ok(LikeOutcome::Liked) => {
                            debug!(handle = %actor.handle, post = %post, "Post liked");
                            turn.likes += 1;
                            actor.likes_given += 1;
                            consecutive_faults = 0;
                            continue;
                        }
                        Ok(outcome) => format!("{:?}", outcome),
                        Err(e) => e.to_string(),
                    };

                    warn!(handle = %actor.handle, post = %post, fault = %fault, "Like failed");
                    turn.faults += 1;
                    consecutive_faults += 1;
                    if consecutive_faults >= self.max_consecutive_faults {
                        warn!(
                            handle = %actor.handle,
                            faults = consecutive_faults,
                            "Persistent like faults, abandoning turn"
                        );
                        turn.abandoned = true;
                        break;
                    }
                }
            }
        }

        info!(
            handle = %turn.handle,
            targets = turn.targets,
            quota = turn.quota,
            likes = turn.likes,
            faults = turn.faults,
            "Turn finished"
        );
        self.turns.push(turn);

        match self.client.query_zero_like_posts(None).await {
            Ok(remaining) if remaining.is_empty() => SchedulerState::Stop(StopReason::AllPostsLiked),
            Ok(_) => SchedulerState::SelectLiker,
            Err(e) => {
                warn!(error = %e, "Zero-like check failed, selecting next liker");
                SchedulerState::SelectLiker
            }
        }
    }
}
