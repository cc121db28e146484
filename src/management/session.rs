use crate::{
    error::{Error, Result},
    graph::{Connector, TodoApi},
    management::{AuthManager, EntityIndex},
    query::TaskQuery,
    types::{Session, TodoList, TodoTask},
};

/// State of one command invocation: the authenticated API handle and the
/// lazily filled list index.
///
/// Constructed once in `main` and passed to the command by reference; it
/// lives exactly as long as the command.
pub struct SessionContext {
    auth: AuthManager,
    connector: Box<dyn Connector>,
    session: Option<Session>,
    client: Option<Box<dyn TodoApi>>,
    lists: EntityIndex<TodoList>,
}

impl SessionContext {
    pub fn new(auth: AuthManager, connector: Box<dyn Connector>) -> Self {
        Self {
            auth,
            connector,
            session: None,
            client: None,
            lists: EntityIndex::new(),
        }
    }

    /// Makes sure a session exists and the list index is warm.
    ///
    /// A no-op once both hold. The first successful authentication of the run
    /// fills the list index if it was never filled.
    pub async fn ensure_authenticated(&mut self) -> Result<()> {
        if self.session.is_none() {
            let session = self.auth.acquire().await?;
            self.attach(session);
        }
        if !self.lists.is_populated() {
            self.populate_lists().await?;
        }
        Ok(())
    }

    /// Acquires a fresh session, dropping any held one, and refills the list
    /// index.
    pub async fn login(&mut self) -> Result<&Session> {
        self.invalidate();
        let session = self.auth.acquire().await?;
        self.attach(session);
        self.populate_lists().await?;
        self.session
            .as_ref()
            .ok_or_else(|| Error::Auth("no session after sign-in".to_string()))
    }

    /// Signs out: clears the credential cache and forgets all session state.
    pub async fn logout(&mut self) -> Result<()> {
        let result = self.auth.logout().await;
        self.invalidate();
        result
    }

    /// Replaces the list index with one full listing, in server order.
    pub async fn populate_lists(&mut self) -> Result<()> {
        let lists = self.client()?.list_lists().await?;
        self.lists.replace(lists);
        Ok(())
    }

    /// Drops the session and the list index; the next
    /// [`ensure_authenticated`](Self::ensure_authenticated) starts over.
    pub fn invalidate(&mut self) {
        self.lists.clear();
        self.client = None;
        self.session = None;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn client(&self) -> Result<&dyn TodoApi> {
        self.client
            .as_deref()
            .ok_or_else(|| Error::Auth("not signed in".to_string()))
    }

    pub fn lists(&self) -> &EntityIndex<TodoList> {
        &self.lists
    }

    /// Resolves a list identifier (position or name) to a list.
    ///
    /// Authenticates and fills the list index first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when nothing matches; no further request is
    /// made in that case.
    pub async fn resolve_list(&mut self, identifier: &str) -> Result<TodoList> {
        self.ensure_authenticated().await?;
        self.lists
            .resolve(identifier)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Todo list '{identifier}' not found.")))
    }

    /// Resolves a task identifier against the full task listing of `list`.
    ///
    /// Positions are those of the unfiltered server-ordered listing, the same
    /// numbering `show` prints.
    ///
    /// # Arguments
    ///
    /// * `list` - Already resolved list
    /// * `identifier` - Task position or (suffix of a) title
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] naming the list when nothing matches.
    pub async fn resolve_task(&mut self, list: &TodoList, identifier: &str) -> Result<TodoTask> {
        self.ensure_authenticated().await?;
        let tasks = self
            .client()?
            .list_tasks(&list.id, &TaskQuery::default())
            .await?;

        EntityIndex::from(tasks)
            .resolve(identifier)
            .cloned()
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "Task '{identifier}' not found in list '{}'.",
                    list.display_name
                ))
            })
    }

    fn attach(&mut self, session: Session) {
        self.client = Some(self.connector.connect(&session));
        self.session = Some(session);
    }
}
