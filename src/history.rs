//! Append-only audit ledger of task-changing actions.
//!
//! Entries are never updated or deleted by the mutation pipeline; history for
//! a deleted task is retained. `purge_task` exists for external retention
//! policies only.

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::directory::DirectoryLookup;
use crate::storage::with_timeout;
use crate::tasks::schema::HistoryAction;

pub const DEFAULT_RECENT_LIMIT: i64 = 100;
pub const MAX_RECENT_LIMIT: i64 = 500;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct HistoryRow {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub action: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct HistoryLog {
    pool: SqlitePool,
}

impl HistoryLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one entry, assigning its id and stamping the timestamp at
    /// write time.
    pub async fn append(
        &self,
        task_id: &str,
        user_id: &str,
        action: HistoryAction,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) -> Result<HistoryRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO history (id, task_id, user_id, action, old_value, new_value, timestamp)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(task_id)
        .bind(user_id)
        .bind(action.as_str())
        .bind(old_value)
        .bind(new_value)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as("SELECT * FROM history WHERE id = ?")
            .bind(&id)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| anyhow!("history entry not found after insert"))
    }

    /// Entries for one task, oldest first. rowid breaks timestamp ties so
    /// multi-entry updates keep their append order.
    pub async fn list_for_task(&self, task_id: &str) -> Result<Vec<HistoryRow>> {
        with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT * FROM history WHERE task_id = ? ORDER BY timestamp ASC, rowid ASC",
            )
            .bind(task_id)
            .fetch_all(&self.pool)
            .await?)
        })
        .await
    }

    /// Most recent entries across all tasks, newest first. The limit is
    /// clamped to `MAX_RECENT_LIMIT`; `None` means `DEFAULT_RECENT_LIMIT`.
    pub async fn list_recent(&self, limit: Option<i64>) -> Result<Vec<HistoryRow>> {
        let limit = limit
            .unwrap_or(DEFAULT_RECENT_LIMIT)
            .clamp(1, MAX_RECENT_LIMIT);
        with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT * FROM history ORDER BY timestamp DESC, rowid DESC LIMIT ?",
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
        })
        .await
    }

    /// Bulk purge for one task. External retention operation — the mutation
    /// pipeline never calls this.
    pub async fn purge_task(&self, task_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM history WHERE task_id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ─── Read-side enrichment ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct HistoryWithUser {
    #[serde(flatten)]
    pub entry: HistoryRow,
    pub username: String,
}

/// History read model with actor usernames resolved through the directory.
#[derive(Clone)]
pub struct HistoryFeed {
    log: HistoryLog,
    directory: DirectoryLookup,
}

impl HistoryFeed {
    pub fn new(log: HistoryLog, directory: DirectoryLookup) -> Self {
        Self { log, directory }
    }

    pub async fn for_task(&self, task_id: &str) -> Result<Vec<HistoryWithUser>> {
        let entries = self.log.list_for_task(task_id).await?;
        self.resolve(entries).await
    }

    pub async fn recent(&self, limit: Option<i64>) -> Result<Vec<HistoryWithUser>> {
        let entries = self.log.list_recent(limit).await?;
        self.resolve(entries).await
    }

    async fn resolve(&self, entries: Vec<HistoryRow>) -> Result<Vec<HistoryWithUser>> {
        let names = self.directory.snapshot().await?;
        Ok(entries
            .into_iter()
            .map(|entry| {
                let username = names
                    .usernames
                    .get(&entry.user_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string());
                HistoryWithUser { entry, username }
            })
            .collect())
    }
}
