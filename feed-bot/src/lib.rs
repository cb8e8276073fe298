//! Feed Bot - synthetic activity for a social feed service
//!
//! A run has three stages:
//! 1. [`PopulationGenerator`] signs up and signs in `number_of_users` accounts
//! 2. [`ContentProducer`] has every account write up to `max_posts_per_user` posts
//! 3. [`LikeScheduler`] hands out likes so that posts without likes get them
//!    first, most prolific authors liking first
//!
//! [`FeedBot`] runs the stages against any [`feed_client::ActivityClient`].
//!
//! ```rust
//! use feed_bot::{BotConfig, FeedBot};
//! use feed_client::InMemoryFeed;
//!
//! # async fn example() -> feed_bot::Result<()> {
//! let feed = InMemoryFeed::new();
//! let config = BotConfig::new(4, 3, 2).with_seed(7);
//!
//! let report = FeedBot::new(config, &feed).run().await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod content;
pub mod error;
pub mod population;
pub mod runner;
pub mod scheduler;

pub use actor::Actor;
pub use config::{BotConfig, ConfigError};
pub use content::{ContentProducer, ContentReport};
pub use error::{BotError, Result};
pub use population::{Population, PopulationGenerator};
pub use runner::{FeedBot, PopulationReport, RunReport};
pub use scheduler::{LikeScheduler, SchedulerReport, SchedulerState, StopReason, TurnReport};
