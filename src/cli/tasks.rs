use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    graph::TodoApi,
    management::SessionContext,
    output::{Formatter, TaskAction},
    query::{self, QueryFlags, TaskQuery},
    types::{Importance, NewTask, NumberedTask, TaskPatch, TaskStatus},
    utils,
};

pub async fn show(
    ctx: &mut SessionContext,
    out: &dyn Formatter,
    list: &str,
    flags: &QueryFlags,
) -> Result<()> {
    let list = required("list", list)?;
    let query = query::compose(flags)?;

    let list = ctx.resolve_list(&list).await?;

    let pb = utils::spinner(&format!("Fetching tasks of '{}'...", list.display_name));
    let tasks = numbered_tasks(ctx.client()?, &list.id, &query).await;
    pb.finish_and_clear();

    println!("{}", out.tasks(&tasks?)?);
    Ok(())
}

/// Lists the tasks matching `query`, each numbered by its position in the
/// unfiltered listing that task identifiers resolve against.
async fn numbered_tasks(
    api: &dyn TodoApi,
    list_id: &str,
    query: &TaskQuery,
) -> Result<Vec<NumberedTask>> {
    let tasks = api.list_tasks(list_id, query).await?;
    if query.keeps_positions() {
        return Ok(tasks
            .into_iter()
            .enumerate()
            .map(|(position, task)| NumberedTask {
                position: Some(position),
                task,
            })
            .collect());
    }

    let all = api.list_tasks(list_id, &TaskQuery::default()).await?;
    let positions: HashMap<&str, usize> = all
        .iter()
        .enumerate()
        .map(|(position, task)| (task.id.as_str(), position))
        .collect();

    Ok(tasks
        .into_iter()
        .map(|task| NumberedTask {
            position: positions.get(task.id.as_str()).copied(),
            task,
        })
        .collect())
}

pub async fn add(
    ctx: &mut SessionContext,
    out: &dyn Formatter,
    list: &str,
    title: &[String],
    important: bool,
) -> Result<()> {
    let list = required("list", list)?;
    let title = joined("task title", title)?;

    let list = ctx.resolve_list(&list).await?;
    let task = NewTask {
        title,
        importance: important.then_some(Importance::High),
    };

    let pb = utils::spinner("Adding task...");
    let created = ctx.client()?.create_task(&list.id, &task).await;
    pb.finish_and_clear();

    println!("{}", out.task_action(TaskAction::Added, &created?, &list)?);
    Ok(())
}

pub async fn complete(
    ctx: &mut SessionContext,
    out: &dyn Formatter,
    list: &str,
    task: &[String],
) -> Result<()> {
    let list = required("list", list)?;
    let task = joined("task", task)?;

    let list = ctx.resolve_list(&list).await?;
    let task = ctx.resolve_task(&list, &task).await?;

    let patch = TaskPatch {
        status: Some(TaskStatus::Completed),
        ..Default::default()
    };

    let pb = utils::spinner("Completing task...");
    let updated = ctx.client()?.patch_task(&list.id, &task.id, &patch).await;
    pb.finish_and_clear();

    println!("{}", out.task_action(TaskAction::Completed, &updated?, &list)?);
    Ok(())
}

pub async fn delete(
    ctx: &mut SessionContext,
    out: &dyn Formatter,
    list: &str,
    task: &[String],
) -> Result<()> {
    let list = required("list", list)?;
    let task = joined("task", task)?;

    let list = ctx.resolve_list(&list).await?;
    let task = ctx.resolve_task(&list, &task).await?;

    let pb = utils::spinner("Deleting task...");
    let deleted = ctx.client()?.delete_task(&list.id, &task.id).await;
    pb.finish_and_clear();
    deleted?;

    println!("{}", out.task_action(TaskAction::Deleted, &task, &list)?);
    Ok(())
}

fn required(what: &str, identifier: &str) -> Result<String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(Error::Validation(format!(
            "Please provide a {what} identifier (index or name)."
        )));
    }
    Ok(identifier.to_string())
}

/// Joins multi-word positional arguments with single spaces.
fn joined(what: &str, words: &[String]) -> Result<String> {
    let text = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return Err(Error::Validation(format!("Please provide a {what}.")));
    }
    Ok(text)
}
