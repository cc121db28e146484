use std::{net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use tokio::sync::Mutex;

use crate::{
    config::{self, Settings},
    error::{Error, Result},
    identity::{CredentialClient, SilentOutcome, TokenCache},
    info,
    server::start_callback_server,
    types::{Account, CachedToken, PendingLogin, Session, TokenErrorResponse, TokenResponse},
    utils, warning,
};

/// Scopes requested on top of the configured ones so the identity platform
/// returns a refresh token and an id token.
const RESERVED_SCOPES: [&str; 3] = ["offline_access", "openid", "profile"];

/// Cached access tokens closer than this to their expiry are refreshed.
const EXPIRY_MARGIN_SECS: i64 = 300;

/// Token endpoint error codes meaning "only the user can fix this".
const INTERACTION_ERRORS: [&str; 4] = [
    "invalid_grant",
    "interaction_required",
    "login_required",
    "consent_required",
];

/// OAuth 2.0 public client for the Microsoft identity platform.
pub struct PublicClient {
    http: Client,
    client_id: String,
    authorize_endpoint: String,
    token_endpoint: String,
    redirect_uri: String,
    server_address: SocketAddr,
}

impl PublicClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            http: Client::new(),
            client_id: settings.client_id.clone(),
            authorize_endpoint: settings.authorize_endpoint(),
            token_endpoint: settings.token_endpoint(),
            redirect_uri: settings.redirect_uri.clone(),
            server_address: settings.server_address,
        }
    }

    /// Posts a grant to the token endpoint.
    ///
    /// The inner `Err` is a well-formed error answer of the identity platform,
    /// the outer one a transport or protocol failure.
    async fn redeem(
        &self,
        form: &[(&str, &str)],
    ) -> Result<std::result::Result<TokenResponse, TokenErrorResponse>> {
        let res = self.http.post(&self.token_endpoint).form(form).send().await?;
        let status = res.status();
        let body = res.text().await?;

        if status.is_success() {
            return Ok(Ok(serde_json::from_str(&body)?));
        }

        match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(err) => Ok(Err(err)),
            Err(_) => Err(Error::Auth(format!(
                "token endpoint returned {status} without an error description"
            ))),
        }
    }

    async fn wait_for_code(shared_state: Arc<Mutex<Option<PendingLogin>>>) -> Result<String> {
        loop {
            {
                let mut lock = shared_state.lock().await;
                if let Some(outcome) = lock.as_mut().and_then(|p| p.outcome.take()) {
                    return outcome.map_err(|e| Error::Auth(format!("sign-in was rejected: {e}")));
                }
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }
}

#[async_trait]
impl CredentialClient for PublicClient {
    async fn acquire_token_silent(
        &self,
        cache: &mut TokenCache,
        scopes: &[String],
        account: Option<&Account>,
    ) -> Result<SilentOutcome> {
        let Some(account) = account else {
            return Ok(SilentOutcome::NeedsInteraction);
        };
        let Some(cached) = cache.token(&account.home_account_id).cloned() else {
            return Ok(SilentOutcome::NeedsInteraction);
        };

        let now = Utc::now().timestamp();
        if cached.expires_at - now > EXPIRY_MARGIN_SECS && covers_scopes(&cached.scopes, scopes) {
            return Ok(SilentOutcome::Acquired(session_for(account.clone(), &cached)));
        }

        let Some(refresh_token) = cached.refresh_token.clone() else {
            return Ok(SilentOutcome::NeedsInteraction);
        };

        let scope = request_scope(scopes);
        let response = self
            .redeem(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("scope", scope.as_str()),
            ])
            .await?;

        match response {
            Ok(token) => {
                let cached = cached_token(token, Some(refresh_token), scopes);
                cache.update_token(&account.home_account_id, cached.clone());
                Ok(SilentOutcome::Acquired(session_for(account.clone(), &cached)))
            }
            Err(err) if INTERACTION_ERRORS.contains(&err.error.as_str()) => {
                Ok(SilentOutcome::NeedsInteraction)
            }
            Err(err) => Err(Error::Auth(describe(&err))),
        }
    }

    async fn acquire_token_interactive(
        &self,
        cache: &mut TokenCache,
        scopes: &[String],
    ) -> Result<Session> {
        let code_verifier = utils::generate_code_verifier();
        let code_challenge = utils::generate_code_challenge(&code_verifier);
        let state = utils::generate_state();
        let scope = request_scope(scopes);

        let redirect = Url::parse(&self.redirect_uri)
            .map_err(|e| Error::Config(format!("invalid redirect URI '{}': {e}", self.redirect_uri)))?;

        let auth_url = Url::parse_with_params(
            &self.authorize_endpoint,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("response_mode", "query"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", state.as_str()),
                ("code_challenge", code_challenge.as_str()),
                ("code_challenge_method", "S256"),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| Error::Config(format!("invalid authority URL: {e}")))?;

        // Store the expected state before the browser can hit the listener.
        let shared_state = Arc::new(Mutex::new(Some(PendingLogin {
            state,
            outcome: None,
        })));
        let server =
            start_callback_server(self.server_address, redirect.path(), Arc::clone(&shared_state))
                .await?;

        info!("Opening the browser to sign in with your Microsoft account...");
        if webbrowser::open(auth_url.as_str()).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                auth_url
            );
        }

        let code = Self::wait_for_code(shared_state).await;
        server.abort();
        let code = code?;

        let response = self
            .redeem(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("code", code.as_str()),
                ("code_verifier", code_verifier.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", scope.as_str()),
            ])
            .await?
            .map_err(|err| Error::Auth(describe(&err)))?;

        let account = account_from(&response)?;
        let cached = cached_token(response, None, scopes);
        cache.upsert(account.clone(), cached.clone());

        Ok(session_for(account, &cached))
    }

    fn remove_account(&self, cache: &mut TokenCache, account: &Account) -> Result<()> {
        if cache.remove_account(&account.home_account_id) {
            Ok(())
        } else {
            Err(Error::Storage(format!(
                "account {} is not in the credential cache",
                account.username
            )))
        }
    }
}

fn request_scope(scopes: &[String]) -> String {
    let mut all: Vec<&str> = scopes.iter().map(String::as_str).collect();
    for reserved in RESERVED_SCOPES {
        if !all.iter().any(|s| s.eq_ignore_ascii_case(reserved)) {
            all.push(reserved);
        }
    }
    all.join(" ")
}

/// Whether every requested scope was granted. Granted scopes may come back
/// qualified with their resource, e.g. `https://graph.microsoft.com/User.Read`.
fn covers_scopes(granted: &[String], requested: &[String]) -> bool {
    requested.iter().all(|r| {
        granted.iter().any(|g| {
            let short = g.rsplit('/').next().unwrap_or(g);
            g.eq_ignore_ascii_case(r) || short.eq_ignore_ascii_case(r)
        })
    })
}

/// Cache entry for a token response. The granted scopes are recorded when the
/// response names them, the requested ones otherwise.
fn cached_token(
    response: TokenResponse,
    previous_refresh: Option<String>,
    requested: &[String],
) -> CachedToken {
    let scopes = response
        .scope
        .as_deref()
        .map(config::parse_scopes)
        .filter(|granted| !granted.is_empty())
        .unwrap_or_else(|| requested.to_vec());

    CachedToken {
        access_token: response.access_token,
        // the platform may or may not rotate the refresh token
        refresh_token: response.refresh_token.or(previous_refresh),
        scopes,
        expires_at: Utc::now().timestamp() + response.expires_in,
    }
}

fn session_for(account: Account, token: &CachedToken) -> Session {
    Session {
        account,
        access_token: token.access_token.clone(),
        expires_on: DateTime::<Utc>::from_timestamp(token.expires_at, 0).unwrap_or_else(Utc::now),
    }
}

fn account_from(response: &TokenResponse) -> Result<Account> {
    let claims = response
        .id_token
        .as_deref()
        .and_then(utils::decode_id_token_claims)
        .ok_or_else(|| Error::Auth("token response carried no readable id token".to_string()))?;

    let home_account_id = match (&claims.oid, &claims.tid) {
        (Some(oid), Some(tid)) => format!("{oid}.{tid}"),
        _ => claims
            .sub
            .clone()
            .ok_or_else(|| Error::Auth("id token names no subject".to_string()))?,
    };
    let username = claims
        .preferred_username
        .clone()
        .or_else(|| claims.name.clone())
        .unwrap_or_else(|| home_account_id.clone());

    Ok(Account {
        home_account_id,
        username,
        name: claims.name,
    })
}

fn describe(err: &TokenErrorResponse) -> String {
    match &err.error_description {
        Some(description) => format!("{}: {}", err.error, description),
        None => err.error.clone(),
    }
}
