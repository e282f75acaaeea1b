//! Task persistence: point lookups, listing, partial updates, filtered search.

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::storage::with_timeout;

use super::schema::{NewTask, TaskPatch};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub project_id: Option<String>,
    pub assigned_to: Option<String>,
    /// RFC3339 timestamp.
    pub due_date: Option<String>,
    pub estimated_hours: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Search predicates. All optional and conjunctive; absent or empty
/// predicates are not applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    /// Case-insensitive substring match against title or description.
    pub text: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub project_id: Option<String>,
    pub assigned_to: Option<String>,
}

#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, task: &NewTask) -> Result<TaskRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO tasks
             (id, title, description, status, priority, project_id, assigned_to,
              due_date, estimated_hours, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(&task.project_id)
        .bind(&task.assigned_to)
        .bind(&task.due_date)
        .bind(task.estimated_hours)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| anyhow!("task not found after insert"))
    }

    /// Unknown and malformed ids both resolve to `None` — the two cases are
    /// indistinguishable at this boundary.
    pub async fn get(&self, id: &str) -> Result<Option<TaskRow>> {
        Ok(sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list(&self) -> Result<Vec<TaskRow>> {
        with_timeout(async {
            Ok(
                sqlx::query_as("SELECT * FROM tasks ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?,
            )
        })
        .await
    }

    /// Apply a partial update. Returns `false` without touching the database
    /// when the patch is empty or the id is unknown; bumps `updated_at` on
    /// success.
    pub async fn update(&self, id: &str, patch: &TaskPatch) -> Result<bool> {
        if patch.is_empty() {
            return Ok(false);
        }

        let mut sets: Vec<&str> = Vec::new();
        if patch.title.is_some() {
            sets.push("title = ?");
        }
        if patch.description.is_some() {
            sets.push("description = ?");
        }
        if patch.status.is_some() {
            sets.push("status = ?");
        }
        if patch.priority.is_some() {
            sets.push("priority = ?");
        }
        if patch.project_id.is_some() {
            sets.push("project_id = ?");
        }
        if patch.assigned_to.is_some() {
            sets.push("assigned_to = ?");
        }
        if patch.due_date.is_some() {
            sets.push("due_date = ?");
        }
        if patch.estimated_hours.is_some() {
            sets.push("estimated_hours = ?");
        }

        let sql = format!(
            "UPDATE tasks SET {}, updated_at = ? WHERE id = ?",
            sets.join(", ")
        );
        let now = Utc::now().to_rfc3339();

        let mut query = sqlx::query(&sql);
        if let Some(title) = &patch.title {
            query = query.bind(title);
        }
        if let Some(description) = &patch.description {
            query = query.bind(description.as_deref());
        }
        if let Some(status) = patch.status {
            query = query.bind(status.as_str());
        }
        if let Some(priority) = patch.priority {
            query = query.bind(priority.as_str());
        }
        if let Some(project_id) = &patch.project_id {
            query = query.bind(project_id.as_deref());
        }
        if let Some(assigned_to) = &patch.assigned_to {
            query = query.bind(assigned_to.as_deref());
        }
        if let Some(due_date) = &patch.due_date {
            query = query.bind(due_date.as_deref());
        }
        if let Some(estimated_hours) = &patch.estimated_hours {
            query = query.bind(*estimated_hours);
        }
        let result = query.bind(&now).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Filtered search. Predicates are ANDed; the text predicate is a
    /// case-insensitive substring match over title or description, the rest
    /// are exact matches.
    pub async fn search(&self, filter: &TaskFilter) -> Result<Vec<TaskRow>> {
        let mut rows = self.list().await?;

        if let Some(text) = filter.text.as_deref().filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            rows.retain(|r| {
                r.title.to_lowercase().contains(&needle)
                    || r.description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            });
        }
        if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
            rows.retain(|r| r.status == status);
        }
        if let Some(priority) = filter.priority.as_deref().filter(|p| !p.is_empty()) {
            rows.retain(|r| r.priority == priority);
        }
        if let Some(project_id) = filter.project_id.as_deref().filter(|p| !p.is_empty()) {
            rows.retain(|r| r.project_id.as_deref() == Some(project_id));
        }
        if let Some(assigned_to) = filter.assigned_to.as_deref().filter(|a| !a.is_empty()) {
            rows.retain(|r| r.assigned_to.as_deref() == Some(assigned_to));
        }

        Ok(rows)
    }

    pub async fn list_by_project(&self, project_id: &str) -> Result<Vec<TaskRow>> {
        with_timeout(async {
            Ok(
                sqlx::query_as("SELECT * FROM tasks WHERE project_id = ? ORDER BY created_at DESC")
                    .bind(project_id)
                    .fetch_all(&self.pool)
                    .await?,
            )
        })
        .await
    }

    pub async fn list_by_assignee(&self, user_id: &str) -> Result<Vec<TaskRow>> {
        with_timeout(async {
            Ok(
                sqlx::query_as("SELECT * FROM tasks WHERE assigned_to = ? ORDER BY created_at DESC")
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?,
            )
        })
        .await
    }
}
