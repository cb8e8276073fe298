//! Error types for the bot.
//!
//! Only fatal conditions are errors. Failed posts and likes are activity
//! faults: they are logged, counted in the stage reports and never abort
//! the run.

use feed_client::ClientError;

use crate::config::ConfigError;

/// Fatal bot errors.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The service refused to create an account
    #[error("Registration of {handle} failed: {source}")]
    Registration {
        handle: String,
        #[source]
        source: ClientError,
    },

    /// The service refused to issue a session
    #[error("Authentication of {handle} failed: {source}")]
    Authentication {
        handle: String,
        #[source]
        source: ClientError,
    },

    /// Client could not be constructed
    #[error("Client error: {0}")]
    Client(#[from] ClientError),
}

pub type Result<T> = std::result::Result<T, BotError>;
