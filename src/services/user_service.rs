//! User service business rules: input validation and quota defaults over the
//! credential-handling repository.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};
use uuid::Uuid;

use crate::config::{DEFAULT_MAX_DOCUMENTS, MIN_PASSWORD_LENGTH, MIN_USERNAME_LENGTH};
use crate::domain::{DomainError, User};

/// Storage protocol the user service depends on. Password hashing lives
/// behind this seam: the service deals only in plaintext, so the repository
/// can hold its row lock across the verify-and-rehash of a password change.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(
        &self,
        user_name: &str,
        email: &str,
        max_documents: i32,
        password: &str,
    ) -> Result<Uuid, DomainError>;

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, DomainError>;

    /// Idempotent: deactivating an already-inactive user still succeeds.
    async fn deactivate_user(&self, user_id: Uuid) -> Result<(), DomainError>;

    /// Compare-and-swap: verifies `old_password` against the stored hash
    /// under a row write lock before storing the new hash.
    async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), DomainError>;

    /// Returns `(Some(user_id), true)` on a match and `(None, false)` on a
    /// mismatch; a missing user is `NotFound`, so callers can distinguish
    /// "no such user" from "wrong password".
    async fn validate_password(
        &self,
        user_name: &str,
        password: &str,
    ) -> Result<(Option<Uuid>, bool), DomainError>;
}

pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_user(
        &self,
        user_name: &str,
        email: &str,
        max_documents: Option<i32>,
        password: &str,
    ) -> Result<Uuid, DomainError> {
        if user_name.len() < MIN_USERNAME_LENGTH {
            warn!(user_name, "rejected create user: username too short");
            return Err(DomainError::invalid_input(format!(
                "username must be at least {MIN_USERNAME_LENGTH} characters"
            )));
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            warn!(user_name, "rejected create user: password too short");
            return Err(DomainError::invalid_input(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        let max_documents = max_documents.unwrap_or(DEFAULT_MAX_DOCUMENTS);
        self.repo
            .create_user(user_name, email, max_documents, password)
            .await
            .inspect_err(|e| error!(user_name, error = %e, "failed to create user"))
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, DomainError> {
        self.repo.get_user_by_id(user_id).await
    }

    pub async fn deactivate_user(&self, user_id: Uuid) -> Result<(), DomainError> {
        self.repo
            .deactivate_user(user_id)
            .await
            .inspect_err(|e| error!(%user_id, error = %e, "failed to deactivate user"))
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        if new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(DomainError::invalid_input(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        self.repo
            .change_password(user_id, old_password, new_password)
            .await
    }

    pub async fn validate_password(
        &self,
        user_name: &str,
        password: &str,
    ) -> Result<(Option<Uuid>, bool), DomainError> {
        self.repo.validate_password(user_name, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryUserRepository;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryUserRepository::new()))
    }

    #[tokio::test]
    async fn rejects_short_usernames_and_passwords() {
        let service = service();

        let err = service
            .create_user("ab", "ab@example.com", None, "longEnough1!")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let err = service
            .create_user("alice", "alice@example.com", None, "short")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn applies_the_default_document_quota() {
        let service = service();
        let user_id = service
            .create_user("alice", "alice@example.com", None, "password1!")
            .await
            .unwrap();
        let user = service.get_user(user_id).await.unwrap();
        assert_eq!(user.max_documents, DEFAULT_MAX_DOCUMENTS);
        assert!(user.is_active);

        let user_id = service
            .create_user("bob", "bob@example.com", Some(7), "password1!")
            .await
            .unwrap();
        assert_eq!(service.get_user(user_id).await.unwrap().max_documents, 7);
    }

    #[tokio::test]
    async fn duplicate_names_and_emails_conflict() {
        let service = service();
        service
            .create_user("alice", "alice@example.com", None, "password1!")
            .await
            .unwrap();

        let err = service
            .create_user("alice", "other@example.com", None, "password1!")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UniqueConflict(_)));

        let err = service
            .create_user("alice2", "alice@example.com", None, "password1!")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UniqueConflict(_)));
    }

    #[tokio::test]
    async fn password_round_trip() {
        let service = service();
        let user_id = service
            .create_user("alice", "alice@example.com", None, "oldPass!1")
            .await
            .unwrap();

        let (found, valid) = service.validate_password("alice", "oldPass!1").await.unwrap();
        assert_eq!(found, Some(user_id));
        assert!(valid);

        // A stored hash is never the plaintext.
        let user = service.get_user(user_id).await.unwrap();
        assert_ne!(user.hashed_password, "oldPass!1");

        service
            .change_password(user_id, "oldPass!1", "newPass!2")
            .await
            .unwrap();

        let (found, valid) = service.validate_password("alice", "oldPass!1").await.unwrap();
        assert_eq!(found, None);
        assert!(!valid);
        let (found, valid) = service.validate_password("alice", "newPass!2").await.unwrap();
        assert_eq!(found, Some(user_id));
        assert!(valid);
    }

    #[tokio::test]
    async fn validating_an_unknown_user_is_not_found() {
        let service = service();
        let err = service
            .validate_password("nobody", "whatever1!")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn change_password_requires_the_current_password() {
        let service = service();
        let user_id = service
            .create_user("alice", "alice@example.com", None, "oldPass!1")
            .await
            .unwrap();

        let err = service
            .change_password(user_id, "wrongOld!", "newPass!2")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PasswordMismatch));
    }

    #[tokio::test]
    async fn concurrent_password_changes_race_to_one_winner() {
        let service = Arc::new(service());
        let user_id = service
            .create_user("alice", "alice@example.com", None, "oldPass!1")
            .await
            .unwrap();

        let first = {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service.change_password(user_id, "oldPass!1", "winnerA!1").await
            })
        };
        let second = {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service.change_password(user_id, "oldPass!1", "winnerB!1").await
            })
        };
        let (first, second) = (first.await.unwrap(), second.await.unwrap());

        // The row lock serializes the two: at most one compare-and-swap can
        // see the original hash.
        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let loser = if first.is_ok() { second } else { first };
        assert!(matches!(loser.unwrap_err(), DomainError::PasswordMismatch));
    }

    #[tokio::test]
    async fn deactivation_is_idempotent() {
        let service = service();
        let user_id = service
            .create_user("alice", "alice@example.com", None, "password1!")
            .await
            .unwrap();

        service.deactivate_user(user_id).await.unwrap();
        assert!(!service.get_user(user_id).await.unwrap().is_active);
        // Second deactivation is still success.
        service.deactivate_user(user_id).await.unwrap();

        let err = service.deactivate_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
