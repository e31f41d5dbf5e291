//! Postgres implementation of the user repository.
//!
//! Password handling lives here: the service layer deals only in plaintext
//! and the repository owns hashing, so the compare-and-swap on password
//! change can hold its row lock across the verify and the rehash. Hashing is
//! CPU-bound by design and runs on the blocking thread pool.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::user::UserRow;
use crate::database::unique_violation;
use crate::domain::{DomainError, User};
use crate::services::user_service::UserRepository;

pub struct PgUserRepository {
    pool: PgPool,
    bcrypt_cost: u32,
}

impl PgUserRepository {
    pub fn new(pool: PgPool, bcrypt_cost: u32) -> Self {
        Self { pool, bcrypt_cost }
    }

    async fn hash_password(&self, password: String) -> Result<String, DomainError> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| DomainError::repo("password hashing task failed", e))?
            .map_err(|e| DomainError::repo("failed to hash password", e))
    }

    async fn verify_password(password: String, hashed: String) -> Result<bool, DomainError> {
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed))
            .await
            .map_err(|e| DomainError::repo("password verification task failed", e))?
            .map_err(|e| DomainError::repo("failed to verify password", e))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(
        &self,
        user_name: &str,
        email: &str,
        max_documents: i32,
        password: &str,
    ) -> Result<Uuid, DomainError> {
        let hashed_password = self.hash_password(password.to_string()).await?;
        let user_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, user_name, email, max_documents, hashed_password)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user_id)
        .bind(user_name)
        .bind(email)
        .bind(max_documents)
        .bind(&hashed_password)
        .execute(&self.pool)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(constraint) => {
                DomainError::unique_conflict(format!("constraint violated: {constraint}"))
            }
            None => DomainError::repo("failed to create user", e),
        })?;
        Ok(user_id)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, user_name, email, max_documents, hashed_password, is_active,
                    created_at, last_modified_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::repo(format!("failed to read user {user_id}"), e))?;
        row.map(User::from)
            .ok_or_else(|| DomainError::not_found(format!("no user found with id {user_id}")))
    }

    async fn deactivate_user(&self, user_id: Uuid) -> Result<(), DomainError> {
        // Idempotent: deactivating an already-inactive user still succeeds.
        let result = sqlx::query(
            "UPDATE users SET is_active = false, last_modified_at = now() WHERE id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::repo(format!("failed to deactivate user {user_id}"), e))?;
        if result.rows_affected() < 1 {
            return Err(DomainError::not_found(format!(
                "no user found with id {user_id} to deactivate"
            )));
        }
        Ok(())
    }

    async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::repo("failed to begin a database transaction", e))?;
        // The row lock serializes concurrent password changes: the loser
        // sees the winner's hash and fails the compare below.
        let row: Option<(Uuid, String)> =
            sqlx::query_as("SELECT id, hashed_password FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| DomainError::repo("failed to read user for password change", e))?;
        let (_, current_hash) = row.ok_or_else(|| {
            DomainError::not_found(format!("no user found with id {user_id} to update"))
        })?;
        if !Self::verify_password(old_password.to_string(), current_hash).await? {
            return Err(DomainError::PasswordMismatch);
        }
        let new_hash = self.hash_password(new_password.to_string()).await?;
        sqlx::query("UPDATE users SET hashed_password = $2, last_modified_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(&new_hash)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::repo("failed to store the new password hash", e))?;
        tx.commit()
            .await
            .map_err(|e| DomainError::repo("failed to commit the password change", e))
    }

    async fn validate_password(
        &self,
        user_name: &str,
        password: &str,
    ) -> Result<(Option<Uuid>, bool), DomainError> {
        let row: Option<(Uuid, String)> =
            sqlx::query_as("SELECT id, hashed_password FROM users WHERE user_name = $1")
                .bind(user_name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::repo(
                        format!("failed to read user with user name {user_name}"),
                        e,
                    )
                })?;
        // A missing user and a wrong password are distinct outcomes: callers
        // map the former to 404 and the latter to 401.
        let (user_id, hashed) = match row {
            Some(found) => found,
            None => {
                return Err(DomainError::not_found(format!(
                    "no user found with user name {user_name}"
                )))
            }
        };
        if Self::verify_password(password.to_string(), hashed).await? {
            Ok((Some(user_id), true))
        } else {
            Ok((None, false))
        }
    }
}
