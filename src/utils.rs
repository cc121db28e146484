use std::{path::Path, time::Duration};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Local;
use futures::AsyncWriteExt;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::{error::Error, types::IdTokenClaims};

/// Name of the error log inside the application data directory.
pub const ERROR_LOG_FILE: &str = "error.log";

pub fn generate_code_verifier() -> String {
    random_string(128)
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Anti-forgery `state` value for the authorization request.
pub fn generate_state() -> String {
    random_string(32)
}

fn random_string(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Reads the claims of an id token without validating its signature.
///
/// The token comes straight from the token endpoint over TLS, it is only used
/// to name the account.
pub fn decode_id_token_claims(id_token: &str) -> Option<IdTokenClaims> {
    let payload = id_token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

/// Appends a timestamped error entry to `<app_dir>/error.log`.
pub async fn append_error_log(app_dir: &Path, err: &Error) -> std::io::Result<()> {
    async_fs::create_dir_all(app_dir).await?;
    let mut file = async_fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(app_dir.join(ERROR_LOG_FILE))
        .await?;

    let entry = format!(
        "[{}] {:?}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        err
    );
    file.write_all(entry.as_bytes()).await?;
    file.flush().await
}
