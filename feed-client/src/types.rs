//! Types for the feed API

use serde::{Deserialize, Serialize};
use std::fmt;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the feed service
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Identifier of a post, assigned by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session token obtained from authentication.
///
/// The token value is kept out of `Debug` output so it never ends up in logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("JWT {}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Aggregate counts for one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActorStats {
    /// Posts authored by the account
    pub posts_authored: u64,
    /// Distinct posts the account has liked
    pub likes_given: u64,
}

/// Outcome of a like request that reached the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// The like was recorded
    Liked,
    /// The account already liked this post; nothing changed
    AlreadyLiked,
    /// The account authored the post; likes on own posts are refused
    ForbiddenSelfLike,
}

impl LikeOutcome {
    pub fn is_liked(&self) -> bool {
        matches!(self, LikeOutcome::Liked)
    }
}

// ==================== Wire types ====================

/// Sign-up request body
#[derive(Debug, Serialize)]
pub(crate) struct SignUpRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Token request body
#[derive(Debug, Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Token response body
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub token: String,
}

/// Post creation request body
#[derive(Debug, Serialize)]
pub(crate) struct CreatePostRequest<'a> {
    pub message: &'a str,
}

/// Post creation response body
#[derive(Debug, Deserialize)]
pub(crate) struct CreatePostResponse {
    pub id: PostId,
}

/// One row of the per-user stats endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct UserStatsRow {
    pub username: String,
    #[serde(default)]
    pub posts: u64,
    #[serde(default)]
    pub likes: u64,
}

/// Response of the zero-like posts endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct ZeroLikePostsResponse {
    pub post_ids: Vec<PostId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_debug_is_redacted() {
        let token = SessionToken::new("secret-value");
        assert_eq!(format!("{:?}", token), "SessionToken(***)");
        assert_eq!(token.authorization(), "JWT secret-value");
    }

    #[test]
    fn test_user_stats_row_defaults() {
        let row: UserStatsRow = serde_json::from_str(r#"{"username": "abc"}"#).unwrap();
        assert_eq!(row.username, "abc");
        assert_eq!(row.posts, 0);
        assert_eq!(row.likes, 0);
    }
}
