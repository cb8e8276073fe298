//! Simulated accounts.

use feed_client::{ActorStats, SessionToken};
use rand::Rng;

/// Length of generated handles and email local parts.
pub const NAME_LENGTH: usize = 10;
/// Letters at the start of a generated password.
pub const PASSWORD_LETTERS: usize = 10;
/// Digits at the end of a generated password.
pub const PASSWORD_DIGITS: usize = 10;

/// A simulated account.
///
/// Credentials are fixed at creation. The session is filled in by
/// authentication, and the counters follow the activity of the run.
#[derive(Debug, Clone)]
pub struct Actor {
    /// Unique handle (username)
    pub handle: String,
    pub email: String,
    pub password: String,
    /// Session obtained at authentication
    pub session: Option<SessionToken>,
    /// Posts created by this actor
    pub posts_authored: u64,
    /// Likes this actor has given
    pub likes_given: u64,
}

impl Actor {
    /// Create an actor that has not signed in yet.
    pub fn new(handle: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            email: email.into(),
            password: password.into(),
            session: None,
            posts_authored: 0,
            likes_given: 0,
        }
    }

    /// Create an actor with random credentials.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, email_domain: &str) -> Self {
        Self::new(
            generate_name(rng, NAME_LENGTH),
            generate_email(rng, email_domain),
            generate_password(rng, PASSWORD_LETTERS, PASSWORD_DIGITS),
        )
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Overwrite the counters with aggregates read from the service.
    pub fn apply_stats(&mut self, stats: ActorStats) {
        self.posts_authored = stats.posts_authored;
        self.likes_given = stats.likes_given;
    }
}

/// Random lowercase ASCII name.
pub fn generate_name<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect()
}

/// Random address at the given domain.
pub fn generate_email<R: Rng + ?Sized>(rng: &mut R, domain: &str) -> String {
    format!("{}@{}", generate_name(rng, NAME_LENGTH), domain)
}

/// Lowercase letters followed by decimal digits.
pub fn generate_password<R: Rng + ?Sized>(rng: &mut R, letters: usize, digits: usize) -> String {
    let mut password = generate_name(rng, letters);
    password.extend((0..digits).map(|_| char::from(rng.gen_range(b'0'..=b'9'))));
    password
}
