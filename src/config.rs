//! Configuration management for the Microsoft To Do CLI.
//!
//! This module handles loading settings from environment variables and an
//! optional `.env` file. The lookup order is:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults
//!
//! Nothing here is required to be set: the defaults
//! target the public Microsoft identity platform and Graph endpoints.

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};

use crate::error::{Error, Result};

/// Name of the application, also the name of its data directory.
pub const APP_NAME: &str = "mstodo";

/// Public client ID registered for the application.
pub const DEFAULT_CLIENT_ID: &str = "2157a77b-da98-48e8-8240-2d26d1dbe0b4";
pub const DEFAULT_TENANT_ID: &str = "common";
pub const DEFAULT_LOGIN_URL: &str = "https://login.microsoftonline.com";
/// Loopback redirect registered for the default client. The identity platform
/// ignores the port of loopback redirects but matches the path.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8400";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8400";
pub const DEFAULT_SCOPES: &str = "User.Read Tasks.ReadWrite";
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

/// Returns the platform-specific application data directory.
///
/// - Linux: `~/.local/share/mstodo`
/// - macOS: `~/Library/Application Support/mstodo`
/// - Windows: `%LOCALAPPDATA%/mstodo`
pub fn default_app_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_NAME);
    path
}

/// Loads environment variables from `<app-data-dir>/.env` when that file exists.
///
/// A missing file is not an error; a file that exists but cannot be parsed is.
///
/// # Example
///
/// ```
/// use mstodo::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> Result<()> {
    let path = default_app_dir().join(".env");
    if async_fs::metadata(&path).await.is_err() {
        return Ok(());
    }

    dotenv::from_path(&path)
        .map(|_| ())
        .map_err(|e| Error::Config(format!("cannot load {}: {}", path.display(), e)))
}

/// Resolved application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client_id: String,
    pub tenant_id: String,
    pub login_url: String,
    pub redirect_uri: String,
    pub server_address: SocketAddr,
    pub scopes: Vec<String>,
    pub graph_url: String,
    pub app_dir: PathBuf,
}

impl Settings {
    /// Builds the settings from the process environment, falling back to the
    /// defaults for every unset key.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let client_id = get("MSTODO_CLIENT_ID", DEFAULT_CLIENT_ID);

        let address = get("MSTODO_SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS);
        let server_address = SocketAddr::from_str(&address).map_err(|e| {
            Error::Config(format!("invalid MSTODO_SERVER_ADDRESS '{address}': {e}"))
        })?;

        let scopes = parse_scopes(&get("MSTODO_SCOPES", DEFAULT_SCOPES));
        if scopes.is_empty() {
            return Err(Error::Config("MSTODO_SCOPES contains no scope".to_string()));
        }

        let app_dir = lookup("MSTODO_APP_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_app_dir);

        Ok(Self {
            client_id,
            tenant_id: get("MSTODO_TENANT_ID", DEFAULT_TENANT_ID),
            login_url: get("MSTODO_LOGIN_URL", DEFAULT_LOGIN_URL)
                .trim_end_matches('/')
                .to_string(),
            redirect_uri: get("MSTODO_REDIRECT_URI", DEFAULT_REDIRECT_URI),
            server_address,
            scopes,
            graph_url: get("MSTODO_GRAPH_URL", DEFAULT_GRAPH_URL)
                .trim_end_matches('/')
                .to_string(),
            app_dir,
        })
    }

    /// Authority URL for the configured tenant, e.g.
    /// `https://login.microsoftonline.com/common`.
    pub fn authority_url(&self) -> String {
        format!("{}/{}", self.login_url, self.tenant_id)
    }

    pub fn authorize_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/authorize", self.authority_url())
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority_url())
    }
}

/// Splits a scope list on whitespace and commas, dropping empty entries.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
