//! Rust client for the social feed API
//!
//! Everything the feed bot knows about the service goes through the
//! [`ActivityClient`] trait:
//! - [`HttpActivityClient`] talks to a running service over REST
//! - [`InMemoryFeed`] is an in-process service for tests and offline runs
//!
//! # Example
//!
//! ```rust
//! use feed_client::{ActivityClient, InMemoryFeed, LikeOutcome};
//!
//! # async fn example() -> feed_client::Result<()> {
//! let feed = InMemoryFeed::new();
//! feed.register("alice", "alice@gmail.com", "secret").await?;
//! feed.register("bob", "bob@gmail.com", "secret").await?;
//!
//! let alice = feed.authenticate("alice", "secret").await?;
//! let bob = feed.authenticate("bob", "secret").await?;
//!
//! let post = feed.create_post(&alice, "Any text").await?;
//! assert_eq!(feed.like_post(&bob, post).await?, LikeOutcome::Liked);
//! assert_eq!(feed.like_post(&alice, post).await?, LikeOutcome::ForbiddenSelfLike);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http;
pub mod memory;
pub mod traits;
pub mod types;

// Re-export main types
pub use error::{ClientError, Result};
pub use http::HttpActivityClient;
pub use memory::{FaultPlan, InMemoryFeed, LikeAttempt};
pub use traits::ActivityClient;
pub use types::{ActorStats, ClientConfig, LikeOutcome, PostId, SessionToken};
