//! Core trait for the feed service.
//!
//! `ActivityClient` is the contract every stage of the bot talks through.
//! It is the only way the bot observes or mutates the feed, so aggregate
//! queries must reflect every mutation made earlier in the run.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};

use crate::error::Result;
use crate::types::{ActorStats, LikeOutcome, PostId, SessionToken};

/// Request/response contract of the feed service.
#[async_trait]
pub trait ActivityClient: Send + Sync {
    /// Create an account.
    async fn register(&self, handle: &str, email: &str, password: &str) -> Result<()>;

    /// Exchange credentials for a session token.
    async fn authenticate(&self, handle: &str, password: &str) -> Result<SessionToken>;

    /// Create a post on behalf of the session's account.
    async fn create_post(&self, session: &SessionToken, content: &str) -> Result<PostId>;

    /// Like a post on behalf of the session's account.
    ///
    /// Duplicate and self likes are reported as outcomes, not errors.
    async fn like_post(&self, session: &SessionToken, post: PostId) -> Result<LikeOutcome>;

    /// Current post and like counts for every account, keyed by handle.
    async fn query_actor_stats(&self) -> Result<HashMap<String, ActorStats>>;

    /// Posts with zero likes, optionally excluding those written by one author.
    async fn query_zero_like_posts(&self, excluding_author: Option<&str>)
        -> Result<BTreeSet<PostId>>;
}
