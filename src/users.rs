//! User persistence. Credential verification and token issuance stay
//! external — this store only persists the opaque password hash the caller
//! provides.

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::Error;
use crate::storage::with_timeout;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), Error> {
        let username_len = self.username.chars().count();
        if !(3..=50).contains(&username_len) {
            return Err(Error::Validation(
                "username must be 3–50 characters".to_string(),
            ));
        }
        let email_len = self.email.chars().count();
        if !(3..=100).contains(&email_len) {
            return Err(Error::Validation(
                "email must be 3–100 characters".to_string(),
            ));
        }
        if self.hashed_password.is_empty() {
            return Err(Error::Validation(
                "hashed_password must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user; a taken username or email is a `Conflict`.
    pub async fn create(&self, user: &NewUser) -> Result<UserRow> {
        user.validate()?;
        if self.find_by_username(&user.username).await?.is_some() {
            return Err(Error::Conflict(format!(
                "username '{}' already exists",
                user.username
            ))
            .into());
        }
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(Error::Conflict(format!(
                "email '{}' already registered",
                user.email
            ))
            .into());
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (id, username, email, hashed_password, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| anyhow!("user not found after insert"))
    }

    pub async fn get(&self, id: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list(&self) -> Result<Vec<UserRow>> {
        with_timeout(async {
            Ok(
                sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?,
            )
        })
        .await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
