//! Run orchestration: population, content, then likes.

use feed_client::ActivityClient;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::BotConfig;
use crate::content::{ContentProducer, ContentReport};
use crate::error::Result;
use crate::population::{Population, PopulationGenerator};
use crate::scheduler::{LikeScheduler, SchedulerReport};

/// Outcome of the registration stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationReport {
    /// Handles in registration order
    pub handles: Vec<String>,
}

impl PopulationReport {
    pub fn registered(&self) -> usize {
        self.handles.len()
    }
}

/// Everything a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub seed: Option<u64>,
    pub population: PopulationReport,
    pub content: ContentReport,
    pub scheduler: SchedulerReport,
}

impl RunReport {
    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "{} users, {} posts ({} failed), {} likes in {} turns ({} failed), stopped: {:?}",
            self.population.registered(),
            self.content.posts_created,
            self.content.faults,
            self.scheduler.likes,
            self.scheduler.turns.len(),
            self.scheduler.faults,
            self.scheduler.stop_reason,
        )
    }
}

/// Drives a whole simulation against one [`ActivityClient`].
pub struct FeedBot<'a> {
    config: BotConfig,
    client: &'a dyn ActivityClient,
}

impl<'a> FeedBot<'a> {
    pub fn new(config: BotConfig, client: &'a dyn ActivityClient) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Run with an RNG seeded from the config, or from entropy.
    pub async fn run(&self) -> Result<RunReport> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.run_with_rng(&mut rng).await
    }

    /// Run all three stages, drawing every random choice from `rng`.
    pub async fn run_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RunReport> {
        let config = &self.config;
        info!(
            users = config.number_of_users,
            max_posts = config.max_posts_per_user,
            max_likes = config.max_likes_per_user,
            seed = ?config.seed,
            "Feed bot run started"
        );

        let mut population = PopulationGenerator::new(self.client, config.email_domain.as_str())
            .generate(config.number_of_users, rng)
            .await?;

        let content = ContentProducer::new(
            self.client,
            config.max_posts_per_user,
            config.post_content.as_str(),
        )
        .with_concurrency(config.post_concurrency)
        .produce(&mut population, rng)
        .await;

        let scheduler = LikeScheduler::new(self.client, config.max_likes_per_user)
            .with_max_consecutive_faults(config.max_consecutive_like_faults)
            .run(&mut population, rng)
            .await;

        let report = RunReport {
            seed: config.seed,
            population: population_report(&population),
            content,
            scheduler,
        };
        info!(summary = %report.summary(), "Feed bot run finished");
        Ok(report)
    }
}

fn population_report(population: &Population) -> PopulationReport {
    PopulationReport {
        handles: population.iter().map(|a| a.handle.clone()).collect(),
    }
}
