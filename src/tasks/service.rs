//! Task mutation pipeline: every accepted mutation deterministically derives
//! its audit entries and cross-entity notifications.
//!
//! Steps within one call run strictly sequentially, and history is appended
//! before the task store mutation is committed. There is no cross-collection
//! transaction: if a later
//! step fails, earlier writes stay committed. There is also no concurrency
//! control on a task — two concurrent updates can interleave so that the
//! loser's recorded old values reflect a superseded state.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::directory::DirectoryLookup;
use crate::history::HistoryLog;
use crate::notifications::NotificationOutbox;

use super::schema::{HistoryAction, NewTask, NotificationType, TaskPatch};
use super::store::{TaskFilter, TaskRow, TaskStore};

/// A task joined with the display names of its references. Names are `None`
/// when the reference is absent or dangling.
#[derive(Debug, Clone, Serialize)]
pub struct TaskWithDetails {
    #[serde(flatten)]
    pub task: TaskRow,
    pub project_name: Option<String>,
    pub assigned_to_name: Option<String>,
}

/// One pending audit record derived from a field diff.
struct Change {
    action: HistoryAction,
    old_value: Option<String>,
    new_value: Option<String>,
}

/// One history-tracked field: how to read its current value off the task and
/// its requested value off the patch (`None` = field absent from the patch).
struct TrackedField {
    action: HistoryAction,
    current: fn(&TaskRow) -> Option<String>,
    patched: fn(&TaskPatch) -> Option<Option<String>>,
}

fn cur_status(task: &TaskRow) -> Option<String> {
    Some(task.status.clone())
}
fn new_status(patch: &TaskPatch) -> Option<Option<String>> {
    patch.status.map(|s| Some(s.as_str().to_string()))
}
fn cur_title(task: &TaskRow) -> Option<String> {
    Some(task.title.clone())
}
fn new_title(patch: &TaskPatch) -> Option<Option<String>> {
    patch.title.clone().map(Some)
}
fn cur_priority(task: &TaskRow) -> Option<String> {
    Some(task.priority.clone())
}
fn new_priority(patch: &TaskPatch) -> Option<Option<String>> {
    patch.priority.map(|p| Some(p.as_str().to_string()))
}
fn cur_assignee(task: &TaskRow) -> Option<String> {
    task.assigned_to.clone()
}
fn new_assignee(patch: &TaskPatch) -> Option<Option<String>> {
    patch.assigned_to.clone()
}

/// Diff order is part of the history contract: status, title, priority,
/// assignment. Other updatable fields persist without their own entry.
const TRACKED_FIELDS: [TrackedField; 4] = [
    TrackedField {
        action: HistoryAction::StatusChanged,
        current: cur_status,
        patched: new_status,
    },
    TrackedField {
        action: HistoryAction::TitleChanged,
        current: cur_title,
        patched: new_title,
    },
    TrackedField {
        action: HistoryAction::PriorityChanged,
        current: cur_priority,
        patched: new_priority,
    },
    TrackedField {
        action: HistoryAction::Assigned,
        current: cur_assignee,
        patched: new_assignee,
    },
];

fn tracked_changes(current: &TaskRow, patch: &TaskPatch) -> Vec<Change> {
    let mut changes = Vec::new();
    for field in &TRACKED_FIELDS {
        let Some(new_value) = (field.patched)(patch) else {
            continue;
        };
        let old_value = (field.current)(current);
        if new_value != old_value {
            changes.push(Change {
                action: field.action,
                old_value,
                new_value,
            });
        }
    }
    changes
}

#[derive(Clone)]
pub struct TaskService {
    store: TaskStore,
    history: HistoryLog,
    outbox: NotificationOutbox,
    directory: DirectoryLookup,
}

impl TaskService {
    pub fn new(
        store: TaskStore,
        history: HistoryLog,
        outbox: NotificationOutbox,
        directory: DirectoryLookup,
    ) -> Self {
        Self {
            store,
            history,
            outbox,
            directory,
        }
    }

    /// Create a task, record its CREATED entry, and notify the assignee if
    /// one was set.
    pub async fn create_task(&self, task: &NewTask, actor_id: &str) -> Result<TaskRow> {
        task.validate()?;
        let created = self.store.create(task).await?;
        self.history
            .append(
                &created.id,
                actor_id,
                HistoryAction::Created,
                None,
                Some(&created.title),
            )
            .await?;
        if let Some(assignee) = &created.assigned_to {
            let message = format!("Nueva tarea asignada: {}", created.title);
            self.outbox
                .create(assignee, &message, NotificationType::TaskAssigned)
                .await?;
        }
        info!(task_id = %created.id, actor = %actor_id, "task created");
        Ok(created)
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<TaskRow>> {
        self.store.get(id).await
    }

    pub async fn list_tasks(&self) -> Result<Vec<TaskRow>> {
        self.store.list().await
    }

    /// Apply a partial update, deriving one history entry per tracked field
    /// that actually changed (in the fixed diff order) and an UPDATED
    /// fallback entry when none did, so every accepted update leaves at
    /// least one audit record. A non-null new assignee is notified with the
    /// pre-update title.
    ///
    /// Returns `false` with zero writes when the task is absent or the patch
    /// is empty.
    pub async fn update_task(&self, task_id: &str, patch: &TaskPatch, actor_id: &str) -> Result<bool> {
        patch.validate()?;
        let Some(current) = self.store.get(task_id).await? else {
            return Ok(false);
        };
        if patch.is_empty() {
            return Ok(false);
        }

        let mut changes = tracked_changes(&current, patch);

        if let Some(new_assignee) = &patch.assigned_to {
            if *new_assignee != current.assigned_to {
                if let Some(assignee) = new_assignee {
                    let message =
                        format!("Tarea actualizada y asignada a ti: {}", current.title);
                    self.outbox
                        .create(assignee, &message, NotificationType::TaskUpdated)
                        .await?;
                }
            }
        }

        if changes.is_empty() {
            changes.push(Change {
                action: HistoryAction::Updated,
                old_value: None,
                new_value: None,
            });
        }
        for change in &changes {
            self.history
                .append(
                    task_id,
                    actor_id,
                    change.action,
                    change.old_value.as_deref(),
                    change.new_value.as_deref(),
                )
                .await?;
        }
        debug!(%task_id, entries = changes.len(), "task update recorded");

        self.store.update(task_id, patch).await
    }

    /// Delete a task, recording a DELETED entry first. History for the task
    /// is retained indefinitely.
    pub async fn delete_task(&self, task_id: &str, actor_id: &str) -> Result<bool> {
        let Some(task) = self.store.get(task_id).await? else {
            return Ok(false);
        };
        self.history
            .append(
                task_id,
                actor_id,
                HistoryAction::Deleted,
                Some(&task.title),
                None,
            )
            .await?;
        let removed = self.store.delete(task_id).await?;
        info!(%task_id, actor = %actor_id, "task deleted");
        Ok(removed)
    }

    /// Every task joined with project and assignee display names, resolved
    /// against one directory snapshot per call. Dangling references yield
    /// `None` names.
    pub async fn list_with_details(&self) -> Result<Vec<TaskWithDetails>> {
        let tasks = self.store.list().await?;
        let names = self.directory.snapshot().await?;
        Ok(tasks
            .into_iter()
            .map(|task| {
                let project_name = task
                    .project_id
                    .as_ref()
                    .and_then(|id| names.project_names.get(id).cloned());
                let assigned_to_name = task
                    .assigned_to
                    .as_ref()
                    .and_then(|id| names.usernames.get(id).cloned());
                TaskWithDetails {
                    task,
                    project_name,
                    assigned_to_name,
                }
            })
            .collect())
    }

    /// Filtered search over raw task records; no enrichment.
    pub async fn search(&self, filter: &TaskFilter) -> Result<Vec<TaskRow>> {
        self.store.search(filter).await
    }
}
