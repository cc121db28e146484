mod auth;
mod index;
mod session;
mod token_store;

pub use auth::AuthManager;
pub use index::EntityIndex;
pub use session::SessionContext;
pub use token_store::{TOKEN_FILE, TokenCacheStore};
