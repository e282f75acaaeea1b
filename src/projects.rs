//! Project persistence. Single-entity CRUD; project names are unique.

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Error;
use crate::storage::with_timeout;

pub const MAX_PROJECT_NAME_LEN: usize = 100;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewProject {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("project name must not be empty".to_string()));
        }
        if self.name.chars().count() > MAX_PROJECT_NAME_LEN {
            return Err(Error::Validation(format!(
                "project name exceeds {MAX_PROJECT_NAME_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

#[derive(Clone)]
pub struct ProjectStore {
    pool: SqlitePool,
}

impl ProjectStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a project; a taken name is a `Conflict`.
    pub async fn create(&self, project: &NewProject, created_by: &str) -> Result<ProjectRow> {
        project.validate()?;
        if self.find_by_name(&project.name).await?.is_some() {
            return Err(Error::Conflict(format!(
                "project with name '{}' already exists",
                project.name
            ))
            .into());
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO projects (id, name, description, created_by, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(created_by)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| anyhow!("project not found after insert"))
    }

    pub async fn get(&self, id: &str) -> Result<Option<ProjectRow>> {
        Ok(sqlx::query_as("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<ProjectRow>> {
        Ok(sqlx::query_as("SELECT * FROM projects WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list(&self) -> Result<Vec<ProjectRow>> {
        with_timeout(async {
            Ok(
                sqlx::query_as("SELECT * FROM projects ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?,
            )
        })
        .await
    }

    pub async fn update(&self, id: &str, patch: &ProjectPatch) -> Result<bool> {
        if patch.is_empty() {
            return Ok(false);
        }
        let mut sets: Vec<&str> = Vec::new();
        if patch.name.is_some() {
            sets.push("name = ?");
        }
        if patch.description.is_some() {
            sets.push("description = ?");
        }
        let sql = format!("UPDATE projects SET {} WHERE id = ?", sets.join(", "));
        let mut query = sqlx::query(&sql);
        if let Some(name) = &patch.name {
            query = query.bind(name);
        }
        if let Some(description) = &patch.description {
            query = query.bind(description.as_deref());
        }
        let result = query.bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
