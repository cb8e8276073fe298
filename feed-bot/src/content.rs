//! Content production: every actor writes a random number of posts.

use feed_client::{ActivityClient, SessionToken};
use futures::stream::{self, StreamExt};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::population::Population;

/// Outcome of the content stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentReport {
    /// Sum of all drawn quotas
    pub posts_requested: u64,
    /// Posts the service accepted
    pub posts_created: u64,
    /// Failed create calls
    pub faults: u64,
}

/// Drives each actor to create its quota of posts.
///
/// Quotas are drawn up front, one per actor in registration order, so a
/// seeded run draws the same quotas regardless of `concurrency`. Actors may
/// post concurrently; each actor's posts are created one after another.
pub struct ContentProducer<'a> {
    client: &'a dyn ActivityClient,
    max_posts_per_user: usize,
    content: String,
    concurrency: usize,
}

struct PostJob {
    index: usize,
    handle: String,
    session: Option<SessionToken>,
    quota: usize,
}

impl<'a> ContentProducer<'a> {
    pub fn new(
        client: &'a dyn ActivityClient,
        max_posts_per_user: usize,
        content: impl Into<String>,
    ) -> Self {
        Self {
            client,
            max_posts_per_user,
            content: content.into(),
            concurrency: 1,
        }
    }

    /// Number of actors posting at the same time.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Draw a quota in `[0, max_posts_per_user]` for every actor.
    pub fn draw_quotas<R: Rng + ?Sized>(&self, population: &Population, rng: &mut R) -> Vec<usize> {
        population
            .iter()
            .map(|_| rng.gen_range(0..=self.max_posts_per_user))
            .collect()
    }

    /// Create every actor's posts and update their `posts_authored`.
    pub async fn produce<R: Rng + ?Sized>(
        &self,
        population: &mut Population,
        rng: &mut R,
    ) -> ContentReport {
        let quotas = self.draw_quotas(population, rng);
        self.produce_quotas(population, &quotas).await
    }

    /// Create posts for pre-drawn quotas, indexed like the population.
    pub async fn produce_quotas(&self, population: &mut Population, quotas: &[usize]) -> ContentReport {
        let jobs: Vec<PostJob> = population
            .iter()
            .zip(quotas)
            .enumerate()
            .map(|(index, (actor, &quota))| PostJob {
                index,
                handle: actor.handle.clone(),
                session: actor.session.clone(),
                quota,
            })
            .collect();

        let client = self.client;
        let content = self.content.as_str();

        let results: Vec<(usize, u64, u64)> = stream::iter(jobs)
            .map(move |job| async move {
                let (created, faults) = post_quota(client, content, &job).await;
                (job.index, created, faults)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = ContentReport {
            posts_requested: quotas.iter().map(|&q| q as u64).sum(),
            ..Default::default()
        };

        let actors = population.actors_mut();
        for (index, created, faults) in results {
            actors[index].posts_authored += created;
            report.posts_created += created;
            report.faults += faults;
        }

        info!(
            requested = report.posts_requested,
            created = report.posts_created,
            faults = report.faults,
            "Content produced"
        );
        report
    }
}

async fn post_quota(client: &dyn ActivityClient, content: &str, job: &PostJob) -> (u64, u64) {
    let Some(session) = &job.session else {
        warn!(handle = %job.handle, quota = job.quota, "Actor has no session, skipping posts");
        return (0, job.quota as u64);
    };

    let mut created = 0;
    let mut faults = 0;
    for _ in 0..job.quota {
        match client.create_post(session, content).await {
            Ok(post) => {
                debug!(handle = %job.handle, post = %post, "Post created");
                created += 1;
            }
            Err(e) => {
                warn!(handle = %job.handle, error = %e, "Post creation failed");
                faults += 1;
            }
        }
    }
    (created, faults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::PopulationGenerator;
    use feed_client::{FaultPlan, InMemoryFeed};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    async fn population(feed: &InMemoryFeed, count: usize) -> Population {
        PopulationGenerator::new(feed, "gmail.com")
            .generate(count, &mut StdRng::seed_from_u64(5))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_quotas_within_bounds() {
        let feed = InMemoryFeed::new();
        let mut population = population(&feed, 8).await;
        let producer = ContentProducer::new(&feed, 3, "Any text");

        let report = producer
            .produce(&mut population, &mut StdRng::seed_from_u64(11))
            .await;

        assert!(population.iter().all(|a| a.posts_authored <= 3));
        assert_eq!(report.posts_created, report.posts_requested);
        assert_eq!(report.faults, 0);
        assert_eq!(feed.post_count().await as u64, report.posts_created);
        assert_eq!(population.total_posts(), report.posts_created);
    }

    #[tokio::test]
    async fn test_zero_max_posts_creates_nothing() {
        let feed = InMemoryFeed::new();
        let mut population = population(&feed, 3).await;
        let producer = ContentProducer::new(&feed, 0, "Any text");

        let report = producer
            .produce(&mut population, &mut StdRng::seed_from_u64(1))
            .await;

        assert_eq!(report, ContentReport::default());
        assert_eq!(feed.post_count().await, 0);
    }

    #[tokio::test]
    async fn test_exact_quotas_with_concurrency() {
        let feed = InMemoryFeed::new();
        let mut population = population(&feed, 4).await;
        let producer = ContentProducer::new(&feed, 5, "Any text").with_concurrency(3);

        producer.produce_quotas(&mut population, &[2, 0, 5, 1]).await;

        let stats = feed.query_actor_stats().await.unwrap();
        let counts: Vec<u64> = population
            .iter()
            .map(|a| stats[&a.handle].posts_authored)
            .collect();
        assert_eq!(counts, vec![2, 0, 5, 1]);
        assert_eq!(
            population.iter().map(|a| a.posts_authored).collect::<Vec<_>>(),
            vec![2, 0, 5, 1]
        );
    }

    #[tokio::test]
    async fn test_post_faults_are_absorbed() {
        let feed = InMemoryFeed::new();
        let mut population = population(&feed, 2).await;
        let failing = population.actors()[0].handle.clone();
        feed.set_faults(FaultPlan {
            failing_authors: [failing].into_iter().collect(),
            ..Default::default()
        })
        .await;

        let producer = ContentProducer::new(&feed, 4, "Any text");
        let report = producer.produce_quotas(&mut population, &[3, 2]).await;

        assert_eq!(report.posts_requested, 5);
        assert_eq!(report.posts_created, 2);
        assert_eq!(report.faults, 3);
        assert_eq!(population.actors()[0].posts_authored, 0);
        assert_eq!(population.actors()[1].posts_authored, 2);
    }
}
