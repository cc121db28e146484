use std::{net::SocketAddr, sync::Arc};

use axum::{Extension, Router, routing::get};
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    api,
    error::{Error, Result},
    types::PendingLogin,
    warning,
};

/// Starts the listener that receives the OAuth redirect on `path`.
///
/// Binding happens before this returns, so a port already in use is reported
/// to the caller instead of surfacing as a sign-in that never completes. The
/// returned handle is aborted once the authorization code arrived.
pub async fn start_callback_server(
    addr: SocketAddr,
    path: &str,
    state: Arc<Mutex<Option<PendingLogin>>>,
) -> Result<JoinHandle<()>> {
    let path = if path.is_empty() { "/" } else { path };
    let app = Router::new().route(path, get(api::callback).layer(Extension(state)));

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        Error::Config(format!("cannot listen on {addr} for the sign-in redirect: {e}"))
    })?;

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warning!("Sign-in listener stopped: {}", e);
        }
    }))
}
