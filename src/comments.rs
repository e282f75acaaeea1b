//! Task comments: single-entity persistence plus username enrichment for
//! display.

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::directory::DirectoryLookup;
use crate::error::Error;
use crate::storage::with_timeout;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentWithUser {
    #[serde(flatten)]
    pub comment: CommentRow,
    pub username: String,
}

#[derive(Clone)]
pub struct CommentStore {
    pool: SqlitePool,
}

impl CommentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, task_id: &str, user_id: &str, content: &str) -> Result<CommentRow> {
        if content.trim().is_empty() {
            return Err(Error::Validation("comment content must not be empty".to_string()).into());
        }
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO comments (id, task_id, user_id, content, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(task_id)
        .bind(user_id)
        .bind(content)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as("SELECT * FROM comments WHERE id = ?")
            .bind(&id)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| anyhow!("comment not found after insert"))
    }

    /// Comments for one task, oldest first.
    pub async fn list_for_task(&self, task_id: &str) -> Result<Vec<CommentRow>> {
        with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT * FROM comments WHERE task_id = ? ORDER BY created_at ASC, rowid ASC",
            )
            .bind(task_id)
            .fetch_all(&self.pool)
            .await?)
        })
        .await
    }

    /// Comments for one task with author usernames resolved; unknown authors
    /// show as "Unknown".
    pub async fn list_for_task_with_usernames(
        &self,
        directory: &DirectoryLookup,
        task_id: &str,
    ) -> Result<Vec<CommentWithUser>> {
        let comments = self.list_for_task(task_id).await?;
        let names = directory.snapshot().await?;
        Ok(comments
            .into_iter()
            .map(|comment| {
                let username = names
                    .usernames
                    .get(&comment.user_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string());
                CommentWithUser { comment, username }
            })
            .collect())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
