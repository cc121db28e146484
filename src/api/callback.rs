use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::types::PendingLogin;

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<Option<PendingLogin>>>>,
) -> Html<&'static str> {
    let mut state = shared_state.lock().await;
    let Some(pending) = state.as_mut() else {
        return Html("<h4>No sign-in in progress.</h4>");
    };

    // A redirect that does not echo our state was not started by this process.
    if params.get("state") != Some(&pending.state) {
        return Html("<h4>Sign-in state mismatch.</h4>");
    }

    if let Some(error) = params.get("error") {
        let description = params
            .get("error_description")
            .map(String::as_str)
            .unwrap_or("no description");
        pending.outcome = Some(Err(format!("{error}: {description}")));
        return Html("<h4>Sign-in failed.</h4><p>Return to the terminal for details.</p>");
    }

    match params.get("code") {
        Some(code) => {
            pending.outcome = Some(Ok(code.clone()));
            Html("<h2>Sign-in successful.</h2><p>Close this browser window.</p>")
        }
        None => Html("<h4>Missing authorization code.</h4>"),
    }
}
