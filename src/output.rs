//! Command output rendering.
//!
//! The format is picked once at startup from the global `--json` flag and
//! handed to every command as a [`Formatter`].

use tabled::Table;

use crate::{
    error::Result,
    types::{Importance, ListTableRow, NumberedTask, TaskTableRow, TodoList, TodoTask, User},
};

/// What a mutating command did to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Added,
    Completed,
    Deleted,
}

pub trait Formatter {
    fn lists(&self, lists: &[TodoList]) -> Result<String>;

    fn tasks(&self, tasks: &[NumberedTask]) -> Result<String>;

    fn user(&self, user: &User) -> Result<String>;

    fn task_action(&self, action: TaskAction, task: &TodoTask, list: &TodoList) -> Result<String>;
}

pub fn formatter(json: bool) -> Box<dyn Formatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(PlainFormatter)
    }
}

/// Human-readable tables. The `#` column is usable as an identifier: for
/// tasks it is the position in the full listing, even when the shown rows
/// were filtered, skipped or sorted.
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn lists(&self, lists: &[TodoList]) -> Result<String> {
        if lists.is_empty() {
            return Ok("No todo lists.".to_string());
        }
        let rows: Vec<ListTableRow> = lists
            .iter()
            .enumerate()
            .map(|(index, l)| ListTableRow {
                index,
                name: l.display_name.clone(),
            })
            .collect();
        Ok(Table::new(rows).to_string())
    }

    fn tasks(&self, tasks: &[NumberedTask]) -> Result<String> {
        if tasks.is_empty() {
            return Ok("No tasks.".to_string());
        }
        let rows: Vec<TaskTableRow> = tasks
            .iter()
            .map(|NumberedTask { position, task: t }| TaskTableRow {
                index: position.map_or_else(|| "-".to_string(), |p| p.to_string()),
                status: if t.is_completed() { "[x]" } else { "[ ]" }.to_string(),
                title: t.title.clone(),
                importance: if t.importance == Importance::High { "★" } else { "" }.to_string(),
            })
            .collect();
        Ok(Table::new(rows).to_string())
    }

    fn user(&self, user: &User) -> Result<String> {
        Ok(format!(
            "User: {} ({})",
            user.display_name.as_deref().unwrap_or("unknown"),
            user.user_principal_name.as_deref().unwrap_or("-")
        ))
    }

    fn task_action(&self, action: TaskAction, task: &TodoTask, list: &TodoList) -> Result<String> {
        let message = match action {
            TaskAction::Added => format!(
                "Successfully added task '{}' to list '{}'.",
                task.title, list.display_name
            ),
            TaskAction::Completed => format!(
                "Successfully completed task '{}' in list '{}'.",
                task.title, list.display_name
            ),
            TaskAction::Deleted => format!(
                "Successfully deleted task '{}' from list '{}'.",
                task.title, list.display_name
            ),
        };
        Ok(message)
    }
}

/// Pretty-printed JSON of the Graph entities.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn lists(&self, lists: &[TodoList]) -> Result<String> {
        Ok(serde_json::to_string_pretty(lists)?)
    }

    fn tasks(&self, tasks: &[NumberedTask]) -> Result<String> {
        let tasks: Vec<&TodoTask> = tasks.iter().map(|n| &n.task).collect();
        Ok(serde_json::to_string_pretty(&tasks)?)
    }

    fn user(&self, user: &User) -> Result<String> {
        Ok(serde_json::to_string_pretty(user)?)
    }

    fn task_action(&self, _action: TaskAction, task: &TodoTask, _list: &TodoList) -> Result<String> {
        Ok(serde_json::to_string_pretty(task)?)
    }
}
