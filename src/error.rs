//! Crate-wide error type.
//!
//! "The user has to sign in interactively" is not represented
//! here: silent acquisition reports it through
//! [`crate::identity::SilentOutcome::NeedsInteraction`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The identity platform rejected the request for a reason other than
    /// missing user interaction (bad client id, tenant, redirect URI...).
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport-level failure talking to the identity platform or Graph.
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Reading or writing the token cache or the application directory failed.
    #[error("Token cache error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A list or task identifier did not resolve.
    #[error("{0}")]
    NotFound(String),

    /// A flag or positional argument is malformed or missing.
    #[error("{0}")]
    Validation(String),

    /// A Graph call failed after identifiers were resolved.
    #[error("{action} failed ({status}): {message}")]
    Remote {
        action: String,
        status: u16,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        Error::Storage(format!("{context}: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
