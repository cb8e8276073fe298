//! HTTP client for the feed REST API

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::traits::ActivityClient;
use crate::types::*;

/// HTTP client for the feed REST API
///
/// # Example
///
/// ```rust,no_run
/// use feed_client::{ActivityClient, ClientConfig, HttpActivityClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpActivityClient::new(ClientConfig {
///     base_url: "http://localhost:8000".into(),
///     ..Default::default()
/// })?;
///
/// client.register("alice", "alice@example.com", "hunter2hunter2").await?;
/// let session = client.authenticate("alice", "hunter2hunter2").await?;
/// let post = client.create_post(&session, "Any text").await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpActivityClient {
    config: ClientConfig,
    client: Client,
}

impl HttpActivityClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        request.send().await.map_err(ClientError::from_transport)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let body = response.text().await.map_err(ClientError::from_transport)?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn status_error(response: Response) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(body),
            StatusCode::NOT_FOUND => ClientError::NotFound(body),
            _ => ClientError::Server {
                status: status.as_u16(),
                message: body,
            },
        }
    }

    async fn rejected(response: Response) -> ClientError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        ClientError::Rejected { status, message }
    }
}

#[async_trait]
impl ActivityClient for HttpActivityClient {
    async fn register(&self, handle: &str, email: &str, password: &str) -> Result<()> {
        let body = SignUpRequest {
            username: handle,
            email,
            password,
        };

        let response = self
            .send(self.client.post(self.url("/sign-up/")).json(&body))
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(Self::rejected(response).await);
        }

        debug!(handle, "Registered account");
        Ok(())
    }

    async fn authenticate(&self, handle: &str, password: &str) -> Result<SessionToken> {
        let body = TokenRequest {
            username: handle,
            password,
        };

        let response = self
            .send(self.client.post(self.url("/api-token-auth/")).json(&body))
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Self::rejected(response).await);
        }

        let token: TokenResponse = Self::handle_response(response).await?;
        if token.token.is_empty() {
            return Err(ClientError::InvalidResponse("Empty token".to_string()));
        }

        Ok(SessionToken::new(token.token))
    }

    async fn create_post(&self, session: &SessionToken, content: &str) -> Result<PostId> {
        let request = self
            .client
            .post(self.url("/feed/post/create/"))
            .header(header::AUTHORIZATION, session.authorization())
            .json(&CreatePostRequest { message: content });

        let response = self.send(request).await?;
        let created: CreatePostResponse = Self::handle_response(response).await?;
        Ok(created.id)
    }

    /// Every 200 is read as a new like. Duplicate detection relies on the
    /// service answering 409 to a repeated like; a service that answers 200
    /// for an existing like is indistinguishable from a fresh one.
    async fn like_post(&self, session: &SessionToken, post: PostId) -> Result<LikeOutcome> {
        let request = self
            .client
            .patch(self.url(&format!("/feed/post/{}/like/", post)))
            .header(header::AUTHORIZATION, session.authorization());

        let response = self.send(request).await?;

        match response.status() {
            StatusCode::OK => Ok(LikeOutcome::Liked),
            StatusCode::FORBIDDEN => Ok(LikeOutcome::ForbiddenSelfLike),
            StatusCode::CONFLICT => Ok(LikeOutcome::AlreadyLiked),
            _ => Err(Self::status_error(response).await),
        }
    }

    async fn query_actor_stats(&self) -> Result<HashMap<String, ActorStats>> {
        let response = self
            .send(self.client.get(self.url("/feed/stats/users/")))
            .await?;

        let rows: Vec<UserStatsRow> = Self::handle_response(response).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.username,
                    ActorStats {
                        posts_authored: row.posts,
                        likes_given: row.likes,
                    },
                )
            })
            .collect())
    }

    async fn query_zero_like_posts(
        &self,
        excluding_author: Option<&str>,
    ) -> Result<BTreeSet<PostId>> {
        let mut request = self.client.get(self.url("/feed/post/zero-likes/"));
        if let Some(author) = excluding_author {
            request = request.query(&[("exclude_author", author)]);
        }

        let response = self.send(request).await?;
        let body: ZeroLikePostsResponse = Self::handle_response(response).await?;
        Ok(body.post_ids.into_iter().collect())
    }
}
