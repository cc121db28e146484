//! # Microsoft Graph Module
//!
//! The remote To Do API as seen by the commands. [`TodoApi`] is the
//! capability the session hands out once a bearer token exists; [`Connector`]
//! turns a [`Session`] into such a handle. [`GraphClient`] is the real
//! implementation on top of `reqwest`.
//!
//! ## Endpoints
//!
//! - `GET /me` - signed-in user
//! - `GET /me/todo/lists` - task lists, in server order
//! - `GET /me/todo/lists/{list}/tasks` - tasks, with `$top`, `$skip`,
//!   `$filter` and `$orderby`
//! - `POST /me/todo/lists/{list}/tasks` - create a task
//! - `PATCH /me/todo/lists/{list}/tasks/{task}` - update a task
//! - `DELETE /me/todo/lists/{list}/tasks/{task}` - delete a task
//!
//! Listings follow `@odata.nextLink` until exhausted unless the query asked
//! for a `$top`. Reads honor `429 Too Many Requests` with its `Retry-After`
//! delay; writes are never retried.

mod client;

use async_trait::async_trait;

pub use client::{GraphClient, GraphConnector};

use crate::{
    error::Result,
    query::TaskQuery,
    types::{NewTask, Session, TaskPatch, TodoList, TodoTask, User},
};

#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn me(&self) -> Result<User>;

    async fn list_lists(&self) -> Result<Vec<TodoList>>;

    async fn list_tasks(&self, list_id: &str, query: &TaskQuery) -> Result<Vec<TodoTask>>;

    async fn create_task(&self, list_id: &str, task: &NewTask) -> Result<TodoTask>;

    async fn patch_task(&self, list_id: &str, task_id: &str, patch: &TaskPatch)
    -> Result<TodoTask>;

    async fn delete_task(&self, list_id: &str, task_id: &str) -> Result<()>;
}

/// Builds an authenticated API handle for a session.
pub trait Connector: Send + Sync {
    fn connect(&self, session: &Session) -> Box<dyn TodoApi>;
}
