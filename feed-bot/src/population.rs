//! Population generation: sign up and sign in every simulated account.

use feed_client::ActivityClient;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::actor::Actor;
use crate::error::{BotError, Result};

/// Upper bound on up-front allocation; larger populations grow as they enroll.
const PREALLOCATE_LIMIT: usize = 1024;

/// The simulated accounts of a run, in registration order.
///
/// Registration order is also the tie-break order of the like scheduler.
#[derive(Debug, Clone, Default)]
pub struct Population {
    actors: Vec<Actor>,
}

impl Population {
    pub fn new(actors: Vec<Actor>) -> Self {
        Self { actors }
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn actors_mut(&mut self) -> &mut [Actor] {
        &mut self.actors
    }

    pub fn get(&self, handle: &str) -> Option<&Actor> {
        self.actors.iter().find(|a| a.handle == handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    /// Total posts authored across the population.
    pub fn total_posts(&self) -> u64 {
        self.actors.iter().map(|a| a.posts_authored).sum()
    }

    /// Total likes given across the population.
    pub fn total_likes(&self) -> u64 {
        self.actors.iter().map(|a| a.likes_given).sum()
    }
}

/// Creates and authenticates the simulated accounts.
///
/// Registration is all-or-nothing: the first failure aborts the run, since
/// later stages assume every actor holds a session.
pub struct PopulationGenerator<'a> {
    client: &'a dyn ActivityClient,
    email_domain: String,
}

impl<'a> PopulationGenerator<'a> {
    pub fn new(client: &'a dyn ActivityClient, email_domain: impl Into<String>) -> Self {
        Self {
            client,
            email_domain: email_domain.into(),
        }
    }

    /// Register and authenticate `count` actors with unique random handles.
    pub async fn generate<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Population> {
        let reserve = count.min(PREALLOCATE_LIMIT);
        let mut handles = HashSet::with_capacity(reserve);
        let mut actors = Vec::with_capacity(reserve);

        for _ in 0..count {
            let actor = loop {
                let candidate = Actor::generate(rng, &self.email_domain);
                if handles.insert(candidate.handle.clone()) {
                    break candidate;
                }
            };
            actors.push(self.enroll(actor).await?);
        }

        info!(actors = actors.len(), "Population registered");
        Ok(Population::new(actors))
    }

    /// Register one actor and store its session.
    pub async fn enroll(&self, mut actor: Actor) -> Result<Actor> {
        self.client
            .register(&actor.handle, &actor.email, &actor.password)
            .await
            .map_err(|source| BotError::Registration {
                handle: actor.handle.clone(),
                source,
            })?;

        let session = self
            .client
            .authenticate(&actor.handle, &actor.password)
            .await
            .map_err(|source| BotError::Authentication {
                handle: actor.handle.clone(),
                source,
            })?;

        actor.session = Some(session);
        debug!(handle = %actor.handle, "Actor signed in");
        Ok(actor)
    }
}
