//! Postgres implementation of the document repository.
//!
//! Expected conditions (missing rows, unique conflicts) come back as precise
//! domain errors; anything unexpected is wrapped in `DomainError::Repo` with
//! the sqlx cause attached. Writes that depend on a parent row's existence
//! run the check and the write inside one repeatable-read transaction, so a
//! concurrent delete of the parent makes the transaction fail at commit
//! instead of silently succeeding against a vanished row.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::models::document::{DocumentPermissionRow, DocumentRow};
use crate::database::models::guest::GuestRow;
use crate::database::models::permission::PermissionRow;
use crate::database::unique_violation;
use crate::domain::{
    Cursor, Document, DocumentPermission, DomainError, Permission, PermissionLevel, PrincipalKind,
    SortField,
};
use crate::services::document_service::DocumentRepository;

pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DomainError::repo("failed to begin a database transaction", e))
    }

    /// Upgrade a fresh transaction to repeatable read. Must be the first
    /// statement issued inside the transaction.
    async fn set_repeatable_read(
        tx: &mut Transaction<'static, Postgres>,
    ) -> Result<(), DomainError> {
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut **tx)
            .await
            .map_err(|e| DomainError::repo("failed to set transaction isolation level", e))?;
        Ok(())
    }

    /// Existence gate for writes that reference a document. Reporting
    /// `NotFound` here keeps the error precise instead of letting the insert
    /// surface a raw foreign-key violation.
    async fn document_exists(
        tx: &mut Transaction<'static, Postgres>,
        document_id: Uuid,
    ) -> Result<(), DomainError> {
        let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM documents WHERE id = $1")
            .bind(document_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| DomainError::repo("failed to check that the document exists", e))?;
        match found {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found(format!(
                "no document found with id {document_id}"
            ))),
        }
    }

    async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), DomainError> {
        tx.commit()
            .await
            .map_err(|e| DomainError::repo("failed to commit transaction", e))
    }

    /// Delete everything hanging off one document, then the document itself.
    /// Shared by single and bulk delete; the caller owns the transaction.
    async fn delete_document_in_tx(
        tx: &mut Transaction<'static, Postgres>,
        document_id: Uuid,
    ) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM permissions WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                DomainError::repo(
                    format!("failed to delete permissions on document {document_id}"),
                    e,
                )
            })?;
        sqlx::query("DELETE FROM guests WHERE document_id = $1")
            .bind(document_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                DomainError::repo(format!("failed to delete guests of document {document_id}"), e)
            })?;
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(document_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                DomainError::repo(format!("failed to delete document {document_id}"), e)
            })?;
        if result.rows_affected() < 1 {
            return Err(DomainError::not_found(format!(
                "no document found with id {document_id}"
            )));
        }
        Ok(())
    }

    async fn read_document_pages(
        &self,
        principal_id: Uuid,
        permissions: &[PermissionLevel],
        cursor: &Cursor,
        page_size: i32,
    ) -> Result<Vec<DocumentPermissionRow>, DomainError> {
        // Both queries are matched exactly by a composite
        // (sort_field DESC, id DESC) index; the row comparison keeps the
        // scan index-ordered.
        let query = match cursor.sort_field {
            SortField::CreatedAt => {
                "SELECT d.id, d.name, d.description, d.created_at, d.last_modified_at,
                        p.permission_level
                 FROM documents d
                 JOIN permissions p ON p.document_id = d.id
                 WHERE p.recipient_id = $1
                   AND p.permission_level = ANY($2)
                   AND (d.created_at, d.id) < ($3, $4)
                 ORDER BY d.created_at DESC, d.id DESC
                 LIMIT $5"
            }
            SortField::LastModifiedAt => {
                "SELECT d.id, d.name, d.description, d.created_at, d.last_modified_at,
                        p.permission_level
                 FROM documents d
                 JOIN permissions p ON p.document_id = d.id
                 WHERE p.recipient_id = $1
                   AND p.permission_level = ANY($2)
                   AND (d.last_modified_at, d.id) < ($3, $4)
                 ORDER BY d.last_modified_at DESC, d.id DESC
                 LIMIT $5"
            }
        };
        sqlx::query_as::<_, DocumentPermissionRow>(query)
            .bind(principal_id)
            .bind(permissions)
            .bind(cursor.last_seen_time)
            .bind(cursor.last_seen_id)
            .bind(i64::from(page_size))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::repo("failed to list documents by principal", e))
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn create_document(
        &self,
        owner_user_id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Uuid, DomainError> {
        let document_id = Uuid::new_v4();
        let mut tx = self.begin().await?;
        sqlx::query("INSERT INTO documents (id, name, description) VALUES ($1, $2, $3)")
            .bind(document_id)
            .bind(name)
            .bind(description)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::repo("unable to create a new document", e))?;
        sqlx::query(
            "INSERT INTO permissions
                 (recipient_id, document_id, recipient_type, permission_level, created_by)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(owner_user_id)
        .bind(document_id)
        .bind(PrincipalKind::User)
        .bind(PermissionLevel::Owner)
        .bind(owner_user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(constraint) => DomainError::unique_conflict(format!(
                "conflict creating owner permission on document {document_id}: {constraint}"
            )),
            None => DomainError::repo("unable to create owner permission on new document", e),
        })?;
        Self::commit(tx).await?;
        Ok(document_id)
    }

    async fn get_document(&self, document_id: Uuid) -> Result<Document, DomainError> {
        let row: Option<DocumentRow> = sqlx::query_as(
            "SELECT id, name, description, created_at, last_modified_at
             FROM documents WHERE id = $1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::repo(format!("failed to retrieve document {document_id}"), e)
        })?;
        row.map(Document::from).ok_or_else(|| {
            DomainError::not_found(format!("no document found with id {document_id}"))
        })
    }

    async fn update_document(
        &self,
        document_id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<(), DomainError> {
        // A no-op update hides client bugs; the service rejects it too.
        if name.is_none() && description.is_none() {
            return Err(DomainError::invalid_input(
                "at least one of name or description must be provided to update a document",
            ));
        }
        let result = sqlx::query(
            "UPDATE documents
             SET name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 last_modified_at = now()
             WHERE id = $1",
        )
        .bind(document_id)
        .bind(name)
        .bind(description)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::repo(format!("failed to update document {document_id}"), e))?;
        if result.rows_affected() < 1 {
            return Err(DomainError::not_found(format!(
                "no document found with id {document_id}"
            )));
        }
        Ok(())
    }

    async fn delete_document(&self, document_id: Uuid) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;
        Self::delete_document_in_tx(&mut tx, document_id).await?;
        Self::commit(tx).await
    }

    async fn delete_documents(
        &self,
        document_ids: &[Uuid],
        _user_id: Uuid,
    ) -> Result<(), DomainError> {
        // Permission to delete is enforced upstream; this is a fail-fast
        // batch with all-or-nothing semantics.
        if document_ids.is_empty() {
            return Err(DomainError::invalid_input(
                "expected at least one document id to delete",
            ));
        }
        // This is a long transaction: it holds one pool connection for the
        // whole batch.
        let mut tx = self.begin().await?;
        for &document_id in document_ids {
            Self::delete_document_in_tx(&mut tx, document_id).await?;
        }
        Self::commit(tx).await
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
        let rows = self
            .read_document_pages(principal_id, permissions, cursor, page_size)
            .await?;
        let page: Vec<DocumentPermission> =
            rows.into_iter().map(DocumentPermission::from).collect();
        // An empty page echoes the request cursor back: the terminal signal.
        let response_cursor = match page.last() {
            Some(last) => Cursor {
                sort_field: cursor.sort_field,
                last_seen_time: match cursor.sort_field {
                    SortField::CreatedAt => last.document.created_at,
                    SortField::LastModifiedAt => last.document.last_modified_at,
                },
                last_seen_id: last.document.id,
            },
            None => *cursor,
        };
        Ok((page, response_cursor))
    }

    async fn get_permission_of_principal_on_document(
        &self,
        document_id: Uuid,
        principal_id: Uuid,
    ) -> Result<Permission, DomainError> {
        let row: Option<PermissionRow> = sqlx::query_as(
            "SELECT recipient_id, recipient_type, document_id, permission_level,
                    created_by, created_at, last_modified_at
             FROM permissions
             WHERE document_id = $1 AND recipient_id = $2",
        )
        .bind(document_id)
        .bind(principal_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::repo(
                format!(
                    "failed to get permission of principal {principal_id} on document {document_id}"
                ),
                e,
            )
        })?;
        row.map(Permission::from).ok_or_else(|| {
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
        // The existence gate and the scan share a repeatable-read snapshot:
        // a missing document is NotFound, never an empty page.
        let mut tx = self.begin().await?;
        Self::set_repeatable_read(&mut tx).await?;
        Self::document_exists(&mut tx, document_id).await?;
        let query = match cursor.sort_field {
            SortField::CreatedAt => {
                "SELECT recipient_id, recipient_type, document_id, permission_level,
                        created_by, created_at, last_modified_at
                 FROM permissions
                 WHERE document_id = $1
                   AND permission_level = ANY($2)
                   AND (created_at, recipient_id) < ($3, $4)
                 ORDER BY created_at DESC, recipient_id DESC
                 LIMIT $5"
            }
            SortField::LastModifiedAt => {
                "SELECT recipient_id, recipient_type, document_id, permission_level,
                        created_by, created_at, last_modified_at
                 FROM permissions
                 WHERE document_id = $1
                   AND permission_level = ANY($2)
                   AND (last_modified_at, recipient_id) < ($3, $4)
                 ORDER BY last_modified_at DESC, recipient_id DESC
                 LIMIT $5"
            }
        };
        let rows: Vec<PermissionRow> = sqlx::query_as(query)
            .bind(document_id)
            .bind(permissions)
            .bind(cursor.last_seen_time)
            .bind(cursor.last_seen_id)
            .bind(i64::from(page_size))
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::repo(
                    format!("failed to list permissions on document {document_id}"),
                    e,
                )
            })?;
        Self::commit(tx).await?;
        let page: Vec<Permission> = rows.into_iter().map(Permission::from).collect();
        let response_cursor = match page.last() {
            Some(last) => Cursor {
                sort_field: cursor.sort_field,
                last_seen_time: match cursor.sort_field {
                    SortField::CreatedAt => last.created_at,
                    SortField::LastModifiedAt => last.last_modified_at,
                },
                last_seen_id: last.recipient_id,
            },
            None => *cursor,
        };
        Ok((page, response_cursor))
    }

    async fn create_guest(
        &self,
        creator_user_id: Uuid,
        document_id: Uuid,
        level: PermissionLevel,
    ) -> Result<Uuid, DomainError> {
        let guest_id = Uuid::new_v4();
        let mut tx = self.begin().await?;
        Self::set_repeatable_read(&mut tx).await?;
        Self::document_exists(&mut tx, document_id).await?;
        sqlx::query("INSERT INTO guests (id, document_id, created_by) VALUES ($1, $2, $3)")
            .bind(guest_id)
            .bind(document_id)
            .bind(creator_user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(constraint) => DomainError::unique_conflict(format!(
                    "conflict creating guest {guest_id}: {constraint}"
                )),
                None => DomainError::repo("failed to create guest", e),
            })?;
        sqlx::query(
            "INSERT INTO permissions
                 (recipient_id, document_id, recipient_type, permission_level, created_by)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(guest_id)
        .bind(document_id)
        .bind(PrincipalKind::Guest)
        .bind(level)
        .bind(creator_user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(constraint) => DomainError::unique_conflict(format!(
                "conflict creating permission for guest {guest_id} on document {document_id}: {constraint}"
            )),
            None => DomainError::repo("failed to create permission for guest", e),
        })?;
        Self::commit(tx).await?;
        Ok(guest_id)
    }

    async fn upsert_permission_user(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        level: PermissionLevel,
    ) -> Result<(), DomainError> {
        // The service layer owns this rule; rejecting here as well keeps a
        // buggy caller from minting a second owner.
        if level == PermissionLevel::Owner {
            return Err(DomainError::invalid_input(
                "owner permission can only be granted by creating a document",
            ));
        }
        let mut tx = self.begin().await?;
        Self::set_repeatable_read(&mut tx).await?;
        Self::document_exists(&mut tx, document_id).await?;
        sqlx::query(
            "INSERT INTO permissions
                 (recipient_id, document_id, recipient_type, permission_level, created_by)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (recipient_id, document_id)
             DO UPDATE SET permission_level = EXCLUDED.permission_level,
                           last_modified_at = now()",
        )
        .bind(user_id)
        .bind(document_id)
        .bind(PrincipalKind::User)
        .bind(level)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::repo("failed to upsert user permission", e))?;
        Self::commit(tx).await
    }

    async fn update_permission_guest(
        &self,
        guest_id: Uuid,
        level: PermissionLevel,
    ) -> Result<(), DomainError> {
        // Resolve the guest's document ourselves instead of trusting a
        // caller-supplied document id.
        let guest: Option<GuestRow> = sqlx::query_as(
            "SELECT id, document_id, created_by, created_at, last_modified_at
             FROM guests WHERE id = $1",
        )
        .bind(guest_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::repo(format!("failed to read guest {guest_id}"), e))?;
        let guest = guest.ok_or_else(|| {
            DomainError::not_found(format!("no guest found with id {guest_id}"))
        })?;
        let result = sqlx::query(
            "UPDATE permissions
             SET permission_level = $3, last_modified_at = now()
             WHERE recipient_id = $1 AND document_id = $2",
        )
        .bind(guest_id)
        .bind(guest.document_id)
        .bind(level)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::repo("failed to update guest permission", e))?;
        if result.rows_affected() < 1 {
            // The guest row exists but its permission is gone: stale guest.
            return Err(DomainError::not_found(format!(
                "no permission found for guest {guest_id} on document {}",
                guest.document_id
            )));
        }
        Ok(())
    }

    async fn delete_permission_principal(
        &self,
        recipient_id: Uuid,
        document_id: Uuid,
    ) -> Result<(), DomainError> {
        // The guest identity row, if any, survives: guests are only reaped
        // with their document.
        let result =
            sqlx::query("DELETE FROM permissions WHERE recipient_id = $1 AND document_id = $2")
                .bind(recipient_id)
                .bind(document_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::repo(
                        format!(
                            "failed to delete permission of {recipient_id} on document {document_id}"
                        ),
                        e,
                    )
                })?;
        if result.rows_affected() < 1 {
            return Err(DomainError::not_found(format!(
                "no permission found for recipient {recipient_id} on document {document_id}"
            )));
        }
        Ok(())
    }
}
