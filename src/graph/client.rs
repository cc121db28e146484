use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{
    error::{Error, Result},
    graph::{Connector, TodoApi},
    query::TaskQuery,
    types::{
        GraphErrorResponse, NewTask, ODataCollection, Session, TaskPatch, TodoList, TodoTask, User,
    },
    warning,
};

const MAX_RETRIES: u32 = 3;
const MAX_RETRY_AFTER_SECS: u64 = 120;
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Builds [`GraphClient`]s for a fixed Graph base URL.
pub struct GraphConnector {
    http: Client,
    base_url: String,
}

impl GraphConnector {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Connector for GraphConnector {
    fn connect(&self, session: &Session) -> Box<dyn TodoApi> {
        Box::new(GraphClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: session.access_token.clone(),
        })
    }
}

/// Microsoft Graph client bound to one bearer token.
pub struct GraphClient {
    http: Client,
    base_url: String,
    token: String,
}

impl GraphClient {
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid Graph URL '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("'{}' cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn tasks_url(&self, list_id: &str) -> Result<Url> {
        self.url(&["me", "todo", "lists", list_id, "tasks"])
    }

    fn task_url(&self, list_id: &str, task_id: &str) -> Result<Url> {
        self.url(&["me", "todo", "lists", list_id, "tasks", task_id])
    }

    /// Sends a read request, waiting out `429` answers.
    async fn get(&self, action: &str, url: Url, query: Option<&TaskQuery>) -> Result<Response> {
        let mut retries = 0;
        loop {
            let mut req = self.http.get(url.clone()).bearer_auth(&self.token);
            if let Some(query) = query {
                req = req.query(&query.params());
            }
            let res = req.send().await?;

            if res.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                let wait = retry_after(&res).unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                if wait <= MAX_RETRY_AFTER_SECS {
                    retries += 1;
                    sleep(Duration::from_secs(wait)).await;
                    continue;
                }
                warning!("Rate limited for {} seconds while trying to {}", wait, action);
            }

            return check(action, res).await;
        }
    }

    /// Reads a whole collection, following `@odata.nextLink`.
    async fn collect<T: DeserializeOwned>(
        &self,
        action: &str,
        url: Url,
        query: Option<&TaskQuery>,
    ) -> Result<Vec<T>> {
        let follow = query.is_none_or(|q| q.top.is_none());

        let page: ODataCollection<T> = self.get(action, url, query).await?.json().await?;
        let mut items = page.value;
        let mut next = page.next_link;

        while follow {
            let Some(link) = next.take() else { break };
            let link = Url::parse(&link)
                .map_err(|e| Error::Remote {
                    action: action.to_string(),
                    status: 0,
                    message: format!("invalid next link: {e}"),
                })?;
            // the next link already carries the query
            let page: ODataCollection<T> = self.get(action, link, None).await?.json().await?;
            items.extend(page.value);
            next = page.next_link;
        }

        Ok(items)
    }

    async fn send(&self, action: &str, req: RequestBuilder) -> Result<Response> {
        let res = req.bearer_auth(&self.token).send().await?;
        check(action, res).await
    }
}

#[async_trait]
impl TodoApi for GraphClient {
    async fn me(&self) -> Result<User> {
        let url = self.url(&["me"])?;
        Ok(self.get("read the signed-in user", url, None).await?.json().await?)
    }

    async fn list_lists(&self) -> Result<Vec<TodoList>> {
        let url = self.url(&["me", "todo", "lists"])?;
        self.collect("list todo lists", url, None).await
    }

    async fn list_tasks(&self, list_id: &str, query: &TaskQuery) -> Result<Vec<TodoTask>> {
        let url = self.tasks_url(list_id)?;
        let query = (!query.is_empty()).then_some(query);
        self.collect("list tasks", url, query).await
    }

    async fn create_task(&self, list_id: &str, task: &NewTask) -> Result<TodoTask> {
        let url = self.tasks_url(list_id)?;
        let req = self.http.post(url).json(task);
        Ok(self.send("add task", req).await?.json().await?)
    }

    async fn patch_task(
        &self,
        list_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> Result<TodoTask> {
        let url = self.task_url(list_id, task_id)?;
        let req = self.http.patch(url).json(patch);
        Ok(self.send("update task", req).await?.json().await?)
    }

    async fn delete_task(&self, list_id: &str, task_id: &str) -> Result<()> {
        let url = self.task_url(list_id, task_id)?;
        let req = self.http.delete(url);
        self.send("delete task", req).await.map(|_| ())
    }
}

fn retry_after(res: &Response) -> Option<u64> {
    res.headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Turns a non-success answer into [`Error::Remote`], preferring the message
/// of the Graph error body.
async fn check(action: &str, res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<GraphErrorResponse>(&body) {
        Ok(err) if !err.error.message.is_empty() => err.error.message,
        Ok(err) => err.error.code,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body,
    };

    Err(Error::Remote {
        action: action.to_string(),
        status: status.as_u16(),
        message,
    })
}
