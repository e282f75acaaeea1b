//! Read-only name resolution for project and user references.
//!
//! Enrichment takes one snapshot per call — an O(P+U) pre-pass — instead of
//! issuing a lookup per task. Unresolvable references stay unresolved; they
//! are never errors.

use anyhow::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::storage::with_timeout;

/// Point-in-time id → display-name maps.
#[derive(Debug, Clone, Default)]
pub struct NameSnapshot {
    pub project_names: HashMap<String, String>,
    pub usernames: HashMap<String, String>,
}

#[derive(Clone)]
pub struct DirectoryLookup {
    pool: SqlitePool,
}

impl DirectoryLookup {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn snapshot(&self) -> Result<NameSnapshot> {
        with_timeout(async {
            let projects: Vec<(String, String)> =
                sqlx::query_as("SELECT id, name FROM projects")
                    .fetch_all(&self.pool)
                    .await?;
            let users: Vec<(String, String)> =
                sqlx::query_as("SELECT id, username FROM users")
                    .fetch_all(&self.pool)
                    .await?;
            Ok(NameSnapshot {
                project_names: projects.into_iter().collect(),
                usernames: users.into_iter().collect(),
            })
        })
        .await
    }

    pub async fn username(&self, user_id: &str) -> Result<Option<String>> {
        Ok(
            sqlx::query_scalar("SELECT username FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}
