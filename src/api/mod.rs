//! # API Module
//!
//! HTTP handlers served by the local sign-in listener (see [`crate::server`]).
//!
//! - [`callback`] - Receives the OAuth redirect of the Microsoft identity
//!   platform and hands the authorization code (or the reported error) to the
//!   waiting interactive sign-in.

mod callback;

pub use callback::callback;
