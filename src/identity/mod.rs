//! # Identity Module
//!
//! Credential handling for the Microsoft identity platform, split into:
//!
//! - [`TokenCache`] - the in-memory account/token cache whose serialized form
//!   is the blob persisted by [`crate::management::TokenCacheStore`]
//! - [`CredentialClient`] - the token acquisition capability used by
//!   [`crate::management::AuthManager`]
//! - [`PublicClient`] - the real implementation: refresh-token grant for
//!   silent acquisition, authorization code + PKCE through the browser for
//!   interactive sign-in
//!
//! Silent acquisition reports "the user has to sign in" as
//! [`SilentOutcome::NeedsInteraction`] instead of an error, so the single
//! interactive fallback is an explicit step of the caller.

mod cache;
mod public_client;

use async_trait::async_trait;

pub use cache::TokenCache;
pub use public_client::PublicClient;

use crate::{
    error::Result,
    types::{Account, Session},
};

/// Result of a silent token acquisition.
#[derive(Debug, Clone)]
pub enum SilentOutcome {
    Acquired(Session),
    /// No usable cached credential; only an interactive sign-in can help.
    NeedsInteraction,
}

#[async_trait]
pub trait CredentialClient: Send + Sync {
    /// Accounts currently visible in the cache.
    fn accounts(&self, cache: &TokenCache) -> Vec<Account> {
        cache.accounts().to_vec()
    }

    /// Acquires a token from the cache without user interaction.
    ///
    /// `account` is `None` when the cache holds no account, which always
    /// yields [`SilentOutcome::NeedsInteraction`]. Errors are configuration or
    /// transport failures and must not be downgraded to interactive mode.
    async fn acquire_token_silent(
        &self,
        cache: &mut TokenCache,
        scopes: &[String],
        account: Option<&Account>,
    ) -> Result<SilentOutcome>;

    /// Signs the user in interactively and stores the new account in `cache`.
    async fn acquire_token_interactive(
        &self,
        cache: &mut TokenCache,
        scopes: &[String],
    ) -> Result<Session>;

    /// Forgets one account and its tokens.
    fn remove_account(&self, cache: &mut TokenCache, account: &Account) -> Result<()>;
}
