//! In-process feed service.
//!
//! Implements [`ActivityClient`] with the same rules the real service
//! enforces: handles are unique, a post can be liked once per account and
//! never by its author. Used by tests and by offline runs of the bot.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tokio::sync::Mutex;

use crate::error::{ClientError, Result};
use crate::traits::ActivityClient;
use crate::types::{ActorStats, LikeOutcome, PostId, SessionToken};

/// A like attempt that reached the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeAttempt {
    pub liker: String,
    pub post: PostId,
    /// `None` when the attempt failed with an injected fault
    pub outcome: Option<LikeOutcome>,
}

/// Faults to inject into an [`InMemoryFeed`].
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    /// Registration fails once this many accounts exist
    pub registration_limit: Option<usize>,
    /// Every authentication fails
    pub fail_authentication: bool,
    /// Handles whose post creation always fails
    pub failing_authors: HashSet<String>,
    /// Handles whose likes always fail
    pub failing_likers: HashSet<String>,
    /// The next N like requests fail, whoever sends them
    pub transient_like_failures: usize,
}

#[derive(Debug)]
struct Account {
    password: String,
    posts: u64,
}

#[derive(Debug)]
struct PostRecord {
    author: String,
    likers: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct FeedState {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, String>,
    posts: BTreeMap<PostId, PostRecord>,
    next_post_id: u64,
    attempts: Vec<LikeAttempt>,
    faults: FaultPlan,
}

impl FeedState {
    fn session_handle(&self, session: &SessionToken) -> Result<String> {
        self.sessions
            .get(session.as_str())
            .cloned()
            .ok_or_else(|| ClientError::Unauthorized("Unknown session token".to_string()))
    }

    fn likes_given(&self, handle: &str) -> u64 {
        self.posts
            .values()
            .filter(|p| p.likers.contains(handle))
            .count() as u64
    }
}

/// In-memory implementation of the feed service.
pub struct InMemoryFeed {
    state: Mutex<FeedState>,
}

impl InMemoryFeed {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self::with_faults(FaultPlan::default())
    }

    /// Create an empty feed with injected faults.
    pub fn with_faults(faults: FaultPlan) -> Self {
        Self {
            state: Mutex::new(FeedState {
                next_post_id: 1,
                faults,
                ..Default::default()
            }),
        }
    }

    /// Replace the fault plan.
    pub async fn set_faults(&self, faults: FaultPlan) {
        self.state.lock().await.faults = faults;
    }

    /// Number of registered accounts.
    pub async fn account_count(&self) -> usize {
        self.state.lock().await.accounts.len()
    }

    /// Number of posts.
    pub async fn post_count(&self) -> usize {
        self.state.lock().await.posts.len()
    }

    /// Author of a post.
    pub async fn author_of(&self, post: PostId) -> Option<String> {
        self.state
            .lock()
            .await
            .posts
            .get(&post)
            .map(|p| p.author.clone())
    }

    /// Current like count of a post.
    pub async fn like_count(&self, post: PostId) -> Option<usize> {
        self.state
            .lock()
            .await
            .posts
            .get(&post)
            .map(|p| p.likers.len())
    }

    /// Every recorded like as (liker, post).
    pub async fn likes(&self) -> Vec<(String, PostId)> {
        let state = self.state.lock().await;
        state
            .posts
            .iter()
            .flat_map(|(id, p)| p.likers.iter().map(move |l| (l.clone(), *id)))
            .collect()
    }

    /// Every like request received, in arrival order.
    pub async fn like_attempts(&self) -> Vec<LikeAttempt> {
        self.state.lock().await.attempts.clone()
    }
}

impl Default for InMemoryFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivityClient for InMemoryFeed {
    async fn register(&self, handle: &str, _email: &str, password: &str) -> Result<()> {
        let mut state = self.state.lock().await;

        if handle.is_empty() {
            return Err(ClientError::Rejected {
                status: 400,
                message: "Handle may not be blank".to_string(),
            });
        }
        if state.accounts.contains_key(handle) {
            return Err(ClientError::Rejected {
                status: 400,
                message: format!("Handle {} already exists", handle),
            });
        }
        if let Some(limit) = state.faults.registration_limit {
            if state.accounts.len() >= limit {
                return Err(ClientError::Server {
                    status: 503,
                    message: "Injected registration fault".to_string(),
                });
            }
        }

        state.accounts.insert(
            handle.to_string(),
            Account {
                password: password.to_string(),
                posts: 0,
            },
        );
        Ok(())
    }

    async fn authenticate(&self, handle: &str, password: &str) -> Result<SessionToken> {
        let mut state = self.state.lock().await;

        if state.faults.fail_authentication {
            return Err(ClientError::Server {
                status: 503,
                message: "Injected authentication fault".to_string(),
            });
        }

        match state.accounts.get(handle) {
            Some(account) if account.password == password => {}
            _ => {
                return Err(ClientError::Rejected {
                    status: 400,
                    message: "Unable to log in with provided credentials".to_string(),
                })
            }
        }

        let token = uuid::Uuid::new_v4().to_string();
        state.sessions.insert(token.clone(), handle.to_string());
        Ok(SessionToken::new(token))
    }

    async fn create_post(&self, session: &SessionToken, content: &str) -> Result<PostId> {
        let mut state = self.state.lock().await;
        let handle = state.session_handle(session)?;

        if state.faults.failing_authors.contains(&handle) {
            return Err(ClientError::Server {
                status: 500,
                message: "Injected post fault".to_string(),
            });
        }
        if content.is_empty() {
            return Err(ClientError::Server {
                status: 400,
                message: "Message may not be blank".to_string(),
            });
        }

        let id = PostId(state.next_post_id);
        state.next_post_id += 1;
        state.posts.insert(
            id,
            PostRecord {
                author: handle.clone(),
                likers: BTreeSet::new(),
            },
        );
        if let Some(account) = state.accounts.get_mut(&handle) {
            account.posts += 1;
        }
        Ok(id)
    }

    async fn like_post(&self, session: &SessionToken, post: PostId) -> Result<LikeOutcome> {
        let mut state = self.state.lock().await;
        let handle = state.session_handle(session)?;

        let injected = if state.faults.transient_like_failures > 0 {
            state.faults.transient_like_failures -= 1;
            true
        } else {
            state.faults.failing_likers.contains(&handle)
        };
        if injected {
            state.attempts.push(LikeAttempt {
                liker: handle,
                post,
                outcome: None,
            });
            return Err(ClientError::Server {
                status: 503,
                message: "Injected like fault".to_string(),
            });
        }

        let record = state
            .posts
            .get_mut(&post)
            .ok_or_else(|| ClientError::NotFound(format!("Post {}", post)))?;

        let outcome = if record.author == handle {
            LikeOutcome::ForbiddenSelfLike
        } else if record.likers.insert(handle.clone()) {
            LikeOutcome::Liked
        } else {
            LikeOutcome::AlreadyLiked
        };

        state.attempts.push(LikeAttempt {
            liker: handle,
            post,
            outcome: Some(outcome),
        });
        Ok(outcome)
    }

    async fn query_actor_stats(&self) -> Result<HashMap<String, ActorStats>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .iter()
            .map(|(handle, account)| {
                (
                    handle.clone(),
                    ActorStats {
                        posts_authored: account.posts,
                        likes_given: state.likes_given(handle),
                    },
                )
            })
            .collect())
    }

    async fn query_zero_like_posts(
        &self,
        excluding_author: Option<&str>,
    ) -> Result<BTreeSet<PostId>> {
        let state = self.state.lock().await;
        Ok(state
            .posts
            .iter()
            .filter(|(_, p)| p.likers.is_empty())
            .filter(|(_, p)| excluding_author != Some(p.author.as_str()))
            .map(|(id, _)| *id)
            .collect())
    }
}
