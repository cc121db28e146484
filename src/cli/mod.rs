//! # CLI Module
//!
//! Command implementations of the `mstodo` binary. Every command receives the
//! [`SessionContext`](crate::management::SessionContext) of the invocation and
//! the [`Formatter`](crate::output::Formatter) chosen at startup, writes its
//! result to stdout and returns errors to `main` instead of printing them.
//!
//! ## Commands
//!
//! - [`login`] - sign in (silently when possible) and show the user
//! - [`logout`] - forget every cached account and delete the token cache
//! - [`user`] - show the signed-in user
//! - [`lists`] - show the todo lists with their positions
//! - [`show`] - show the tasks of a list, with paging, filter, search and sort
//! - [`add`] - add a task to a list
//! - [`complete`] - mark a task as completed
//! - [`delete`] - delete a task
//!
//! Lists and tasks are addressed by position or by (suffix of) name, see
//! [`crate::resolve`]. Malformed arguments are rejected before any request
//! goes out.
//!
//! ## Usage Patterns
//!
//! ```bash
//! mstodo login
//! mstodo lists
//! mstodo show Groceries --search milk --important
//! mstodo add 0 Buy oat milk
//! mstodo complete Groceries 2
//! mstodo delete Groceries "Buy oat milk"
//! mstodo --json show Work --limit 10 --orderby "createdDateTime desc"
//! ```

mod auth;
mod lists;
mod tasks;

pub use auth::login;
pub use auth::logout;
pub use auth::user;
pub use lists::lists;
pub use tasks::add;
pub use tasks::complete;
pub use tasks::delete;
pub use tasks::show;
