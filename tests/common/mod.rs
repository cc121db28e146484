#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use mstodo::{
    error::{Error, Result},
    graph::{Connector, TodoApi},
    identity::{CredentialClient, SilentOutcome, TokenCache},
    management::{AuthManager, SessionContext, TokenCacheStore},
    query::TaskQuery,
    types::{
        Account, CachedToken, Importance, NewTask, Session, TaskPatch, TaskStatus, TodoList,
        TodoTask, User,
    },
};

/// Serves `router` on an ephemeral loopback port and returns its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn scopes() -> Vec<String> {
    vec!["User.Read".to_string(), "Tasks.ReadWrite".to_string()]
}

pub fn list(id: &str, name: &str) -> TodoList {
    TodoList {
        id: id.to_string(),
        display_name: name.to_string(),
        well_known_list_name: None,
        is_owner: Some(true),
        is_shared: Some(false),
    }
}

pub fn task(id: &str, title: &str) -> TodoTask {
    TodoTask {
        id: id.to_string(),
        title: title.to_string(),
        status: TaskStatus::NotStarted,
        importance: Importance::Normal,
        body: None,
        due_date_time: None,
        created_date_time: None,
        completed_date_time: None,
    }
}

pub fn account() -> Account {
    Account {
        home_account_id: "oid-1.tid-1".to_string(),
        username: "jane@contoso.com".to_string(),
        name: Some("Jane Doe".to_string()),
    }
}

#[derive(Debug, Default)]
pub struct CredentialCalls {
    pub silent: usize,
    pub interactive: usize,
    pub removed: usize,
    /// Account passed to each silent attempt.
    pub silent_accounts: Vec<Option<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    Working,
    /// Silent acquisition fails with a configuration error.
    Misconfigured,
    /// Account removal fails.
    BrokenRemoval,
    /// Silent acquisition always redeems the refresh token.
    Refreshing,
}

/// In-process stand-in for the identity platform.
#[derive(Clone)]
pub struct FakeCredentials {
    pub calls: Arc<Mutex<CredentialCalls>>,
    pub mode: CredentialMode,
}

impl FakeCredentials {
    pub fn new(mode: CredentialMode) -> Self {
        Self {
            calls: Arc::new(Mutex::new(CredentialCalls::default())),
            mode,
        }
    }

    pub fn silent(&self) -> usize {
        self.calls.lock().unwrap().silent
    }

    pub fn interactive(&self) -> usize {
        self.calls.lock().unwrap().interactive
    }
}

fn session_for(account: Account, token: &CachedToken) -> Session {
    Session {
        account,
        access_token: token.access_token.clone(),
        expires_on: Utc::now() + Duration::hours(1),
    }
}

#[async_trait]
impl CredentialClient for FakeCredentials {
    async fn acquire_token_silent(
        &self,
        cache: &mut TokenCache,
        _scopes: &[String],
        account: Option<&Account>,
    ) -> Result<SilentOutcome> {
        {
            let mut calls = self.calls.lock().unwrap();
            calls.silent += 1;
            calls
                .silent_accounts
                .push(account.map(|a| a.home_account_id.clone()));
        }

        if self.mode == CredentialMode::Misconfigured {
            return Err(Error::Auth("AADSTS700016: application not found".to_string()));
        }

        let Some(account) = account else {
            return Ok(SilentOutcome::NeedsInteraction);
        };
        let Some(token) = cache.token(&account.home_account_id).cloned() else {
            return Ok(SilentOutcome::NeedsInteraction);
        };
        if self.mode != CredentialMode::Refreshing {
            return Ok(SilentOutcome::Acquired(session_for(account.clone(), &token)));
        }

        let refreshed = CachedToken {
            access_token: "refreshed-access-token".to_string(),
            ..token
        };
        cache.update_token(&account.home_account_id, refreshed.clone());
        Ok(SilentOutcome::Acquired(session_for(account.clone(), &refreshed)))
    }

    async fn acquire_token_interactive(
        &self,
        cache: &mut TokenCache,
        scopes: &[String],
    ) -> Result<Session> {
        self.calls.lock().unwrap().interactive += 1;

        let token = CachedToken {
            access_token: "access-token".to_string(),
            refresh_token: Some("refresh-token".to_string()),
            scopes: scopes.to_vec(),
            expires_at: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        cache.upsert(account(), token.clone());
        Ok(session_for(account(), &token))
    }

    fn remove_account(&self, cache: &mut TokenCache, account: &Account) -> Result<()> {
        self.calls.lock().unwrap().removed += 1;
        if self.mode == CredentialMode::BrokenRemoval {
            return Err(Error::Storage("keychain locked".to_string()));
        }
        cache.remove_account(&account.home_account_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ApiState {
    pub lists: Vec<TodoList>,
    pub tasks: HashMap<String, Vec<TodoTask>>,
    pub list_calls: usize,
    pub task_queries: Vec<TaskQuery>,
    pub created: Vec<(String, String)>,
    pub patched: Vec<(String, String, TaskPatch)>,
    pub deleted: Vec<(String, String)>,
    pub tokens: Vec<String>,
    /// Fail every mutation with this HTTP status.
    pub fail_mutations: Option<u16>,
}

/// In-memory To Do service.
#[derive(Clone, Default)]
pub struct FakeApi {
    pub state: Arc<Mutex<ApiState>>,
}

impl FakeApi {
    pub fn with_lists(lists: Vec<TodoList>) -> Self {
        let api = Self::default();
        api.state.lock().unwrap().lists = lists;
        api
    }

    pub fn set_lists(&self, lists: Vec<TodoList>) {
        self.state.lock().unwrap().lists = lists;
    }

    pub fn set_tasks(&self, list_id: &str, tasks: Vec<TodoTask>) {
        self.state
            .lock()
            .unwrap()
            .tasks
            .insert(list_id.to_string(), tasks);
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    fn mutation_failure(&self, action: &str) -> Result<()> {
        match self.state.lock().unwrap().fail_mutations {
            Some(status) => Err(Error::Remote {
                action: action.to_string(),
                status,
                message: "The service is unavailable.".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TodoApi for FakeApi {
    async fn me(&self) -> Result<User> {
        Ok(User {
            id: "oid-1".to_string(),
            display_name: Some("Jane Doe".to_string()),
            user_principal_name: Some("jane@contoso.com".to_string()),
            mail: None,
        })
    }

    async fn list_lists(&self) -> Result<Vec<TodoList>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        Ok(state.lists.clone())
    }

    async fn list_tasks(&self, list_id: &str, query: &TaskQuery) -> Result<Vec<TodoTask>> {
        let mut state = self.state.lock().unwrap();
        state.task_queries.push(query.clone());

        let mut tasks = state.tasks.get(list_id).cloned().unwrap_or_default();
        // just enough OData for the queries the tests compose
        if query
            .filter
            .as_deref()
            .is_some_and(|f| f.contains("importance eq 'high'"))
        {
            tasks.retain(|t| t.importance == Importance::High);
        }
        if let Some(skip) = query.skip {
            tasks = tasks.into_iter().skip(skip as usize).collect();
        }
        if let Some(top) = query.top {
            tasks.truncate(top as usize);
        }
        Ok(tasks)
    }

    async fn create_task(&self, list_id: &str, new_task: &NewTask) -> Result<TodoTask> {
        self.mutation_failure("add task")?;
        let mut state = self.state.lock().unwrap();
        state
            .created
            .push((list_id.to_string(), new_task.title.clone()));
        let mut created = task("new-task", &new_task.title);
        if let Some(importance) = new_task.importance {
            created.importance = importance;
        }
        Ok(created)
    }

    async fn patch_task(
        &self,
        list_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> Result<TodoTask> {
        self.mutation_failure("update task")?;
        let mut state = self.state.lock().unwrap();
        state
            .patched
            .push((list_id.to_string(), task_id.to_string(), patch.clone()));
        let mut updated = task(task_id, "patched");
        if let Some(status) = patch.status {
            updated.status = status;
        }
        Ok(updated)
    }

    async fn delete_task(&self, list_id: &str, task_id: &str) -> Result<()> {
        self.mutation_failure("delete task")?;
        self.state
            .lock()
            .unwrap()
            .deleted
            .push((list_id.to_string(), task_id.to_string()));
        Ok(())
    }
}

pub struct FakeConnector {
    pub api: FakeApi,
}

impl Connector for FakeConnector {
    fn connect(&self, session: &Session) -> Box<dyn TodoApi> {
        self.api
            .state
            .lock()
            .unwrap()
            .tokens
            .push(session.access_token.clone());
        Box::new(self.api.clone())
    }
}

pub fn auth_manager(app_dir: &Path, credentials: &FakeCredentials) -> AuthManager {
    AuthManager::new(
        TokenCacheStore::new(app_dir),
        Box::new(credentials.clone()),
        scopes(),
    )
}

pub fn session_context(app_dir: &Path, credentials: &FakeCredentials, api: &FakeApi) -> SessionContext {
    SessionContext::new(
        auth_manager(app_dir, credentials),
        Box::new(FakeConnector { api: api.clone() }),
    )
}
