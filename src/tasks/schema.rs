//! Domain types for tasks and the records the mutation pipeline derives.
//!
//! Enum wire values are part of the persisted format and the API contract:
//! statuses and priorities use Spanish display strings, history actions are
//! SCREAMING_SNAKE, notification types snake_case.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "En Progreso")]
    InProgress,
    #[serde(rename = "Completada")]
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pendiente",
            TaskStatus::InProgress => "En Progreso",
            TaskStatus::Completed => "Completada",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskPriority {
    #[serde(rename = "Baja")]
    Low,
    #[default]
    #[serde(rename = "Media")]
    Medium,
    #[serde(rename = "Alta")]
    High,
    #[serde(rename = "Crítica")]
    Critical,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "Baja",
            TaskPriority::Medium => "Media",
            TaskPriority::High => "Alta",
            TaskPriority::Critical => "Crítica",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit actions recorded in the history ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    Created,
    StatusChanged,
    TitleChanged,
    Assigned,
    PriorityChanged,
    Updated,
    Deleted,
}

impl HistoryAction {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryAction::Created => "CREATED",
            HistoryAction::StatusChanged => "STATUS_CHANGED",
            HistoryAction::TitleChanged => "TITLE_CHANGED",
            HistoryAction::Assigned => "ASSIGNED",
            HistoryAction::PriorityChanged => "PRIORITY_CHANGED",
            HistoryAction::Updated => "UPDATED",
            HistoryAction::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbox message categories. The task pipeline emits `TaskAssigned` and
/// `TaskUpdated`; the remaining variants belong to the wire enum and are
/// available to collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TaskAssigned,
    TaskUpdated,
    TaskCompleted,
    CommentAdded,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::TaskAssigned => "task_assigned",
            NotificationType::TaskUpdated => "task_updated",
            NotificationType::TaskCompleted => "task_completed",
            NotificationType::CommentAdded => "comment_added",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields for creating a task. Status and priority default to
/// `Pendiente` / `Media` when not supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// RFC3339 timestamp.
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            project_id: None,
            assigned_to: None,
            due_date: None,
            estimated_hours: None,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        validate_title(&self.title)?;
        if let Some(hours) = self.estimated_hours {
            if hours < 0.0 {
                return Err(Error::Validation(
                    "estimated_hours must be non-negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Partial update for a task. `None` means "leave unchanged"; for nullable
/// fields the inner option distinguishes "set to NULL" from "absent".
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub project_id: Option<Option<String>>,
    pub assigned_to: Option<Option<String>>,
    pub due_date: Option<Option<String>>,
    pub estimated_hours: Option<Option<f64>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.project_id.is_none()
            && self.assigned_to.is_none()
            && self.due_date.is_none()
            && self.estimated_hours.is_none()
    }

    pub fn validate(&self) -> Result<(), Error> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(Some(hours)) = self.estimated_hours {
            if hours < 0.0 {
                return Err(Error::Validation(
                    "estimated_hours must be non-negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), Error> {
    if title.trim().is_empty() {
        return Err(Error::Validation("title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::Validation(format!(
            "title exceeds {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_values() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"En Progreso\""
        );
        assert_eq!(TaskStatus::default().as_str(), "Pendiente");
        assert_eq!(TaskPriority::default().as_str(), "Media");
        assert_eq!(HistoryAction::StatusChanged.as_str(), "STATUS_CHANGED");
        assert_eq!(NotificationType::TaskAssigned.as_str(), "task_assigned");
    }

    #[test]
    fn title_validation() {
        assert!(NewTask::new("ok").validate().is_ok());
        assert!(NewTask::new("  ").validate().is_err());
        assert!(NewTask::new("x".repeat(201)).validate().is_err());

        let patch = TaskPatch {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn empty_patch_detection() {
        assert!(TaskPatch::default().is_empty());
        let patch = TaskPatch {
            assigned_to: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
