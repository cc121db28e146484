//! Microsoft To Do CLI Library
//!
//! This library provides the building blocks of the `mstodo` command-line client:
//! acquiring and persisting a delegated user token, resolving human-friendly list
//! and task identifiers to remote IDs, composing server-side task queries, and
//! talking to the Microsoft Graph To Do endpoints.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the local OAuth redirect listener
//! - `cli` - Command implementations
//! - `config` - Settings loaded from environment variables and `.env`
//! - `error` - Crate error type
//! - `graph` - Microsoft Graph client for lists, tasks and the signed-in user
//! - `identity` - Credential cache and public-client token acquisition
//! - `management` - Token cache persistence, auth orchestration and session state
//! - `output` - Plain and JSON output formatters
//! - `query` - Task query composition from command-line flags
//! - `resolve` - Identifier resolution against ordered entity collections
//! - `server` - Local HTTP listener receiving the OAuth redirect
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE helpers, spinners and the error log

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod identity;
pub mod management;
pub mod output;
pub mod query;
pub mod resolve;
pub mod server;
pub mod types;
pub mod utils;

pub use error::{Error, Result};

/// Prints an informational status line with a blue bullet point.
///
/// Status lines go to stderr so they never mix with command output, which
/// may be JSON.
///
/// # Example
///
/// ```
/// info!("Opening browser for sign-in...");
/// info!("Found {} lists", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success status line with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Logged out.");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Used once per process, by `main`, after a command failed. Code after this
/// macro does not execute.
///
/// # Example
///
/// ```
/// error!("Todo list '{}' not found.", identifier);
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning status line with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Failed to open browser, navigate to {} manually", url);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
