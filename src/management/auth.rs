use crate::{
    error::{Error, Result},
    identity::{CredentialClient, SilentOutcome, TokenCache},
    management::TokenCacheStore,
    types::{Account, Session},
};

/// Token acquisition backed by the persisted credential cache.
///
/// The cache file is read once, before the first acquisition, and written
/// back only when an acquisition changed the in-memory cache.
pub struct AuthManager {
    store: TokenCacheStore,
    client: Box<dyn CredentialClient>,
    cache: TokenCache,
    loaded: bool,
    scopes: Vec<String>,
}

impl AuthManager {
    pub fn new(
        store: TokenCacheStore,
        client: Box<dyn CredentialClient>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            store,
            client,
            cache: TokenCache::new(),
            loaded: false,
            scopes,
        }
    }

    /// Acquires a token silently from the first cached account, falling back
    /// to a single interactive sign-in when only the user can help.
    ///
    /// # Flow
    ///
    /// 1. The cache file is read and hydrated into memory on the first call.
    /// 2. Silent acquisition runs against the first cached account, if any.
    /// 3. On [`SilentOutcome::NeedsInteraction`] the browser sign-in runs once.
    /// 4. The cache is written back only if one of the steps changed it.
    ///
    /// # Errors
    ///
    /// Configuration and network failures of the silent attempt are returned
    /// as-is and never trigger the interactive flow. Cache file failures are
    /// [`Error::Storage`].
    ///
    /// # Example
    ///
    /// ```
    /// let mut auth = AuthManager::new(store, Box::new(PublicClient::new(&settings)), settings.scopes.clone());
    /// let session = auth.acquire().await?;
    /// println!("Signed in as {}", session.principal_name());
    /// ```
    pub async fn acquire(&mut self) -> Result<Session> {
        self.hydrate().await?;

        let accounts = self.client.accounts(&self.cache);
        let outcome = self
            .client
            .acquire_token_silent(&mut self.cache, &self.scopes, accounts.first())
            .await?;

        let session = match outcome {
            SilentOutcome::Acquired(session) => session,
            SilentOutcome::NeedsInteraction => {
                self.client
                    .acquire_token_interactive(&mut self.cache, &self.scopes)
                    .await?
            }
        };

        self.persist().await?;
        Ok(session)
    }

    /// Removes every cached account and deletes the cache file.
    ///
    /// Best-effort: a failing account removal does not stop the others nor
    /// the file deletion, and the in-memory cache ends up empty either way.
    /// Failures are reported once everything was attempted.
    pub async fn logout(&mut self) -> Result<()> {
        // an unreadable cache must not prevent deleting it
        let _ = self.hydrate().await;

        let mut failures = Vec::new();
        for account in self.client.accounts(&self.cache) {
            if let Err(e) = self.client.remove_account(&mut self.cache, &account) {
                failures.push(format!("{}: {}", account.username, e));
            }
        }

        self.cache = TokenCache::new();
        self.loaded = true;
        self.store.clear().await?;

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Storage(format!(
                "could not remove {} account(s): {}",
                failures.len(),
                failures.join("; ")
            )))
        }
    }

    /// Accounts currently known to the in-memory cache.
    pub fn accounts(&self) -> Vec<Account> {
        self.client.accounts(&self.cache)
    }

    async fn hydrate(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        if let Some(bytes) = self.store.load().await? {
            self.cache = TokenCache::deserialize(&bytes)?;
        }
        self.loaded = true;
        Ok(())
    }

    async fn persist(&mut self) -> Result<()> {
        if !self.cache.has_state_changed() {
            return Ok(());
        }
        let bytes = self.cache.serialize()?;
        self.store.save(&bytes).await?;
        self.cache.mark_clean();
        Ok(())
    }
}
