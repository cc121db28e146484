use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::{Account, CachedToken},
};

/// In-memory credential cache.
///
/// Holds every signed-in account and the tokens issued for it. Every mutation
/// raises a dirty flag so callers persist the cache only after an access that
/// actually changed it.
#[derive(Debug, Default)]
pub struct TokenCache {
    data: CacheData,
    dirty: bool,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct CacheData {
    #[serde(default)]
    accounts: Vec<Account>,
    #[serde(default)]
    tokens: BTreeMap<String, CachedToken>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a cache from the serialized blob. The result is clean.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let data: CacheData = serde_json::from_slice(bytes)
            .map_err(|e| Error::storage("cannot read credential cache", e))?;
        Ok(Self { data, dirty: false })
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.data)?)
    }

    /// Accounts in the order they first signed in.
    pub fn accounts(&self) -> &[Account] {
        &self.data.accounts
    }

    pub fn token(&self, home_account_id: &str) -> Option<&CachedToken> {
        self.data.tokens.get(home_account_id)
    }

    /// Adds or replaces an account together with its tokens.
    pub fn upsert(&mut self, account: Account, token: CachedToken) {
        match self
            .data
            .accounts
            .iter_mut()
            .find(|a| a.home_account_id == account.home_account_id)
        {
            Some(existing) => *existing = account.clone(),
            None => self.data.accounts.push(account.clone()),
        }
        self.data.tokens.insert(account.home_account_id, token);
        self.dirty = true;
    }

    /// Replaces the tokens of a known account.
    pub fn update_token(&mut self, home_account_id: &str, token: CachedToken) {
        self.data.tokens.insert(home_account_id.to_string(), token);
        self.dirty = true;
    }

    /// Removes an account and its tokens. Returns `false` when it was unknown.
    pub fn remove_account(&mut self, home_account_id: &str) -> bool {
        let before = self.data.accounts.len();
        self.data
            .accounts
            .retain(|a| a.home_account_id != home_account_id);
        let removed_token = self.data.tokens.remove(home_account_id).is_some();
        let removed = before != self.data.accounts.len() || removed_token;
        if removed {
            self.dirty = true;
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.data.accounts.is_empty()
    }

    /// Whether the cache changed since it was loaded or last marked clean.
    pub fn has_state_changed(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
