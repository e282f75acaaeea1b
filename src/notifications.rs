//! Per-user notification outbox.
//!
//! `read` is monotone: it starts false and only ever flips to true, so both
//! mark operations touch unread rows exclusively and report whether anything
//! actually changed.

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::storage::with_timeout;
use crate::tasks::schema::NotificationType;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub message: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub read: bool,
    pub created_at: String,
}

#[derive(Clone)]
pub struct NotificationOutbox {
    pool: SqlitePool,
}

impl NotificationOutbox {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: &str,
        message: &str,
        kind: NotificationType,
    ) -> Result<NotificationRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO notifications (id, user_id, message, type, read, created_at)
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(message)
        .bind(kind.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;
        debug!(%user_id, kind = kind.as_str(), "notification created");

        let row = sqlx::query_as("SELECT * FROM notifications WHERE id = ?")
            .bind(&id)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| anyhow!("notification not found after insert"))
    }

    /// Notifications for one user, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> Result<Vec<NotificationRow>> {
        let sql = if unread_only {
            "SELECT * FROM notifications WHERE user_id = ? AND read = 0
             ORDER BY created_at DESC, rowid DESC"
        } else {
            "SELECT * FROM notifications WHERE user_id = ?
             ORDER BY created_at DESC, rowid DESC"
        };
        with_timeout(async {
            Ok(sqlx::query_as(sql)
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?)
        })
        .await
    }

    /// Returns `false` for unknown ids and for notifications already read.
    pub async fn mark_read(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ? AND read = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flips every unread notification for the user; returns whether any
    /// row changed.
    pub async fn mark_all_read(&self, user_id: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE notifications SET read = 1 WHERE user_id = ? AND read = 0")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
