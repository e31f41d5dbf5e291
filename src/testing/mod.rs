//! In-memory repository implementations for the behavioral test suites.
//!
//! These mirror the Postgres repositories' observable semantics: the same
//! keyset ordering on `(time, id)` descending, the same error kinds for
//! missing rows and conflicts, and a whole-map lock standing in for the row
//! lock that serializes password changes. Timestamps come from a strictly
//! increasing microsecond clock so ordering assertions are deterministic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Cursor, Document, DocumentPermission, DomainError, Permission, PermissionLevel, PrincipalKind,
    SortField, User,
};
use crate::services::document_service::DocumentRepository;
use crate::services::user_service::UserRepository;

// Low cost keeps the hashing-heavy tests fast; production uses the
// configured cost.
const TEST_BCRYPT_COST: u32 = 4;

/// Strictly increasing microsecond clock.
struct TestClock {
    micros: AtomicI64,
}

impl TestClock {
    fn new() -> Self {
        // Start one second in the past so every minted timestamp sits below
        // a beginning cursor taken at the real current time.
        Self {
            micros: AtomicI64::new(Utc::now().timestamp_micros() - 1_000_000),
        }
    }

    fn tick(&self) -> DateTime<Utc> {
        let us = self.micros.fetch_add(1, Ordering::SeqCst) + 1;
        DateTime::from_timestamp_micros(us).expect("test clock in range")
    }
}

struct GuestRecord {
    document_id: Uuid,
}

#[derive(Default)]
struct DocState {
    documents: HashMap<Uuid, Document>,
    // Keyed like the relation: (recipient_id, document_id).
    permissions: HashMap<(Uuid, Uuid), Permission>,
    guests: HashMap<Uuid, GuestRecord>,
}

pub struct MemoryDocumentRepository {
    state: Mutex<DocState>,
    clock: TestClock,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DocState::default()),
            clock: TestClock::new(),
        }
    }

    fn delete_document_rows(state: &mut DocState, document_id: Uuid) -> Result<(), DomainError> {
        state.permissions.retain(|&(_, doc), _| doc != document_id);
        state.guests.retain(|_, g| g.document_id != document_id);
        if state.documents.remove(&document_id).is_none() {
            return Err(DomainError::not_found(format!(
                "no document found with id {document_id}"
            )));
        }
        Ok(())
    }

    fn sort_key(document: &Document, sort_field: SortField) -> (DateTime<Utc>, Uuid) {
        match sort_field {
            SortField::CreatedAt => (document.created_at, document.id),
            SortField::LastModifiedAt => (document.last_modified_at, document.id),
        }
    }
}

impl Default for MemoryDocumentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn create_document(
        &self,
        owner_user_id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Uuid, DomainError> {
        let now = self.clock.tick();
        let document_id = Uuid::new_v4();
        let mut state = self.state.lock().unwrap();
        state.documents.insert(
            document_id,
            Document {
                id: document_id,
                name,
                description,
                created_at: now,
                last_modified_at: now,
            },
        );
        state.permissions.insert(
            (owner_user_id, document_id),
            Permission {
                recipient_id: owner_user_id,
                recipient_kind: PrincipalKind::User,
                document_id,
                permission_level: PermissionLevel::Owner,
                created_by: owner_user_id,
                created_at: now,
                last_modified_at: now,
            },
        );
        Ok(document_id)
    }

    async fn get_document(&self, document_id: Uuid) -> Result<Document, DomainError> {
        let state = self.state.lock().unwrap();
        state.documents.get(&document_id).cloned().ok_or_else(|| {
            DomainError::not_found(format!("no document found with id {document_id}"))
        })
    }

    async fn update_document(
        &self,
        document_id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<(), DomainError> {
        if name.is_none() && description.is_none() {
            return Err(DomainError::invalid_input(
                "at least one of name or description must be provided to update a document",
            ));
        }
        let now = self.clock.tick();
        let mut state = self.state.lock().unwrap();
        let document = state.documents.get_mut(&document_id).ok_or_else(|| {
            DomainError::not_found(format!("no document found with id {document_id}"))
        })?;
        if let Some(name) = name {
            document.name = Some(name);
        }
        if let Some(description) = description {
            document.description = Some(description);
        }
        document.last_modified_at = now;
        Ok(())
    }

    async fn delete_document(&self, document_id: Uuid) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        Self::delete_document_rows(&mut state, document_id)
    }

    async fn delete_documents(
        &self,
        document_ids: &[Uuid],
        _user_id: Uuid,
    ) -> Result<(), DomainError> {
        if document_ids.is_empty() {
            return Err(DomainError::invalid_input(
                "expected at least one document id to delete",
            ));
        }
        let mut state = self.state.lock().unwrap();
        // All-or-nothing: refuse the whole batch before touching anything.
        for document_id in document_ids {
            if !state.documents.contains_key(document_id) {
                return Err(DomainError::not_found(format!(
                    "no document found with id {document_id}"
                )));
            }
        }
        for &document_id in document_ids {
            Self::delete_document_rows(&mut state, document_id)?;
        }
        Ok(())
    }

    async fn list_documents_by_principal(
        &self,
        principal_id: Uuid,
        permissions: &[PermissionLevel],
        cursor: &Cursor,
        page_size: i32,
    ) -> Result<(Vec<DocumentPermission>, Cursor), DomainError> {
        if permissions.is_empty() {
            return Err(DomainError::invalid_input("expected at least one permission"));
        }
        let state = self.state.lock().unwrap();
        let mut rows: Vec<DocumentPermission> = state
            .permissions
            .values()
            .filter(|p| {
                p.recipient_id == principal_id && permissions.contains(&p.permission_level)
            })
            .filter_map(|p| {
                state.documents.get(&p.document_id).map(|d| DocumentPermission {
                    document: d.clone(),
                    permission_level: p.permission_level,
                })
            })
            .filter(|dp| {
                let (t, id) = Self::sort_key(&dp.document, cursor.sort_field);
                cursor.admits(t, id)
            })
            .collect();
        rows.sort_by(|a, b| {
            Self::sort_key(&b.document, cursor.sort_field)
                .cmp(&Self::sort_key(&a.document, cursor.sort_field))
        });
        rows.truncate(page_size.max(0) as usize);

        let response_cursor = match rows.last() {
            Some(last) => {
                let (t, id) = Self::sort_key(&last.document, cursor.sort_field);
                Cursor {
                    sort_field: cursor.sort_field,
                    last_seen_time: t,
                    last_seen_id: id,
                }
            }
            None => *cursor,
        };
        Ok((rows, response_cursor))
    }

    async fn get_permission_of_principal_on_document(
        &self,
        document_id: Uuid,
        principal_id: Uuid,
    ) -> Result<Permission, DomainError> {
        let state = self.state.lock().unwrap();
        state
            .permissions
            .get(&(principal_id, document_id))
            .cloned()
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "no permission found for principal {principal_id} on document {document_id}"
                ))
            })
    }

    async fn list_permissions_on_document(
        &self,
        document_id: Uuid,
        permissions: &[PermissionLevel],
        cursor: &Cursor,
        page_size: i32,
    ) -> Result<(Vec<Permission>, Cursor), DomainError> {
        if permissions.is_empty() {
            return Err(DomainError::invalid_input("expected at least one permission"));
        }
        let state = self.state.lock().unwrap();
        if !state.documents.contains_key(&document_id) {
            return Err(DomainError::not_found(format!(
                "no document found with id {document_id}"
            )));
        }
        let key = |p: &Permission| match cursor.sort_field {
            SortField::CreatedAt => (p.created_at, p.recipient_id),
            SortField::LastModifiedAt => (p.last_modified_at, p.recipient_id),
        };
        let mut rows: Vec<Permission> = state
            .permissions
            .values()
            .filter(|p| p.document_id == document_id && permissions.contains(&p.permission_level))
            .filter(|p| {
                let (t, id) = key(p);
                cursor.admits(t, id)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| key(b).cmp(&key(a)));
        rows.truncate(page_size.max(0) as usize);

        let response_cursor = match rows.last() {
            Some(last) => {
                let (t, id) = key(last);
                Cursor {
                    sort_field: cursor.sort_field,
                    last_seen_time: t,
                    last_seen_id: id,
                }
            }
            None => *cursor,
        };
        Ok((rows, response_cursor))
    }

    async fn create_guest(
        &self,
        creator_user_id: Uuid,
        document_id: Uuid,
        level: PermissionLevel,
    ) -> Result<Uuid, DomainError> {
        let now = self.clock.tick();
        let guest_id = Uuid::new_v4();
        let mut state = self.state.lock().unwrap();
        if !state.documents.contains_key(&document_id) {
            return Err(DomainError::not_found(format!(
                "no document found with id {document_id}"
            )));
        }
        state.guests.insert(guest_id, GuestRecord { document_id });
        state.permissions.insert(
            (guest_id, document_id),
            Permission {
                recipient_id: guest_id,
                recipient_kind: PrincipalKind::Guest,
                document_id,
                permission_level: level,
                created_by: creator_user_id,
                created_at: now,
                last_modified_at: now,
            },
        );
        Ok(guest_id)
    }

    async fn upsert_permission_user(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        level: PermissionLevel,
    ) -> Result<(), DomainError> {
        if level == PermissionLevel::Owner {
            return Err(DomainError::invalid_input(
                "owner permission can only be granted by creating a document",
            ));
        }
        let now = self.clock.tick();
        let mut state = self.state.lock().unwrap();
        if !state.documents.contains_key(&document_id) {
            return Err(DomainError::not_found(format!(
                "no document found with id {document_id}"
            )));
        }
        state
            .permissions
            .entry((user_id, document_id))
            .and_modify(|p| {
                p.permission_level = level;
                p.last_modified_at = now;
            })
            .or_insert(Permission {
                recipient_id: user_id,
                recipient_kind: PrincipalKind::User,
                document_id,
                permission_level: level,
                created_by: user_id,
                created_at: now,
                last_modified_at: now,
            });
        Ok(())
    }

    async fn update_permission_guest(
        &self,
        guest_id: Uuid,
        level: PermissionLevel,
    ) -> Result<(), DomainError> {
        let now = self.clock.tick();
        let mut state = self.state.lock().unwrap();
        let document_id = state
            .guests
            .get(&guest_id)
            .map(|g| g.document_id)
            .ok_or_else(|| {
                DomainError::not_found(format!("no guest found with id {guest_id}"))
            })?;
        let permission = state
            .permissions
            .get_mut(&(guest_id, document_id))
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "no permission found for guest {guest_id} on document {document_id}"
                ))
            })?;
        permission.permission_level = level;
        permission.last_modified_at = now;
        Ok(())
    }

    async fn delete_permission_principal(
        &self,
        recipient_id: Uuid,
        document_id: Uuid,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        if state.permissions.remove(&(recipient_id, document_id)).is_none() {
            return Err(DomainError::not_found(format!(
                "no permission found for recipient {recipient_id} on document {document_id}"
            )));
        }
        Ok(())
    }
}

pub struct MemoryUserRepository {
    state: Mutex<HashMap<Uuid, User>>,
    clock: TestClock,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HashMap::new()),
            clock: TestClock::new(),
        }
    }
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(
        &self,
        user_name: &str,
        email: &str,
        max_documents: i32,
        password: &str,
    ) -> Result<Uuid, DomainError> {
        let hashed_password = bcrypt::hash(password, TEST_BCRYPT_COST)
            .map_err(|e| DomainError::repo("failed to hash password", e))?;
        let now = self.clock.tick();
        let user_id = Uuid::new_v4();
        let mut state = self.state.lock().unwrap();
        if state.values().any(|u| u.user_name == user_name) {
            return Err(DomainError::unique_conflict(
                "constraint violated: users_user_name_key",
            ));
        }
        if state.values().any(|u| u.email == email) {
            return Err(DomainError::unique_conflict(
                "constraint violated: users_email_key",
            ));
        }
        state.insert(
            user_id,
            User {
                user_id,
                user_name: user_name.to_string(),
                email: email.to_string(),
                max_documents,
                hashed_password,
                is_active: true,
                created_at: now,
                last_modified_at: now,
            },
        );
        Ok(user_id)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, DomainError> {
        let state = self.state.lock().unwrap();
        state
            .get(&user_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("no user found with id {user_id}")))
    }

    async fn deactivate_user(&self, user_id: Uuid) -> Result<(), DomainError> {
        let now = self.clock.tick();
        let mut state = self.state.lock().unwrap();
        let user = state.get_mut(&user_id).ok_or_else(|| {
            DomainError::not_found(format!("no user found with id {user_id} to deactivate"))
        })?;
        user.is_active = false;
        user.last_modified_at = now;
        Ok(())
    }

    async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        let now = self.clock.tick();
        // The map lock is held across the verify and the swap, the same
        // serialization the row lock provides in Postgres.
        let mut state = self.state.lock().unwrap();
        let user = state.get_mut(&user_id).ok_or_else(|| {
            DomainError::not_found(format!("no user found with id {user_id} to update"))
        })?;
        let matches = bcrypt::verify(old_password, &user.hashed_password)
            .map_err(|e| DomainError::repo("failed to verify password", e))?;
        if !matches {
            return Err(DomainError::PasswordMismatch);
        }
        user.hashed_password = bcrypt::hash(new_password, TEST_BCRYPT_COST)
            .map_err(|e| DomainError::repo("failed to hash password", e))?;
        user.last_modified_at = now;
        Ok(())
    }

    async fn validate_password(
        &self,
        user_name: &str,
        password: &str,
    ) -> Result<(Option<Uuid>, bool), DomainError> {
        let state = self.state.lock().unwrap();
        let user = state
            .values()
            .find(|u| u.user_name == user_name)
            .ok_or_else(|| {
                DomainError::not_found(format!("no user found with user name {user_name}"))
            })?;
        let matches = bcrypt::verify(password, &user.hashed_password)
            .map_err(|e| DomainError::repo("failed to verify password", e))?;
        if matches {
            Ok((Some(user.user_id), true))
        } else {
            Ok((None, false))
        }
    }
}
