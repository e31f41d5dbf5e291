//! Document service business rules.
//!
//! The service wraps a repository with normalization and policy: listing
//! defaults, page-size clamping, and the owner-level gate. It never
//! fabricates a `NotFound` — only the layer that actually queried the store
//! reports absence.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::config::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::domain::{
    Cursor, Document, DocumentPermission, DomainError, Permission, PermissionLevel, SortField,
};

/// Storage protocol the document service depends on. The consumer defines
/// the seam so alternative stores (and the in-memory test double) can slot
/// in behind it.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Atomically create a document and its owner permission row.
    async fn create_document(
        &self,
        owner_user_id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Uuid, DomainError>;

    async fn get_document(&self, document_id: Uuid) -> Result<Document, DomainError>;

    async fn update_document(
        &self,
        document_id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<(), DomainError>;

    /// Atomically delete a document, its permissions, and its guests.
    async fn delete_document(&self, document_id: Uuid) -> Result<(), DomainError>;

    /// All-or-nothing batch delete. A long transaction: it holds one pool
    /// connection for the whole unit.
    async fn delete_documents(
        &self,
        document_ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<(), DomainError>;

    async fn list_documents_by_principal(
        &self,
        principal_id: Uuid,
        permissions: &[PermissionLevel],
        cursor: &Cursor,
        page_size: i32,
    ) -> Result<(Vec<DocumentPermission>, Cursor), DomainError>;

    async fn get_permission_of_principal_on_document(
        &self,
        document_id: Uuid,
        principal_id: Uuid,
    ) -> Result<Permission, DomainError>;

    async fn list_permissions_on_document(
        &self,
        document_id: Uuid,
        permissions: &[PermissionLevel],
        cursor: &Cursor,
        page_size: i32,
    ) -> Result<(Vec<Permission>, Cursor), DomainError>;

    async fn create_guest(
        &self,
        creator_user_id: Uuid,
        document_id: Uuid,
        level: PermissionLevel,
    ) -> Result<Uuid, DomainError>;

    async fn upsert_permission_user(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        level: PermissionLevel,
    ) -> Result<(), DomainError>;

    /// Update the single permission row of a guest, resolving the guest's
    /// document from the guest id.
    async fn update_permission_guest(
        &self,
        guest_id: Uuid,
        level: PermissionLevel,
    ) -> Result<(), DomainError>;

    /// Delete one permission row. Leaves a guest's identity row in place;
    /// guests are only reaped with their document.
    async fn delete_permission_principal(
        &self,
        recipient_id: Uuid,
        document_id: Uuid,
    ) -> Result<(), DomainError>;
}

pub struct DocumentService {
    repo: Arc<dyn DocumentRepository>,
}

/// Replace an out-of-range page size with the default.
fn clamp_page_size(page_size: i32) -> i32 {
    if page_size < 1 || page_size > MAX_PAGE_SIZE {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    }
}

impl DocumentService {
    pub fn new(repo: Arc<dyn DocumentRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_document(
        &self,
        owner_user_id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Uuid, DomainError> {
        // Callers are internal (the gateway); the owner id has already been
        // authenticated, so there is no round-trip to the user service here.
        self.repo
            .create_document(owner_user_id, name, description)
            .await
    }

    pub async fn get_document(&self, document_id: Uuid) -> Result<Document, DomainError> {
        self.repo.get_document(document_id).await
    }

    pub async fn update_document(
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
        self.repo.update_document(document_id, name, description).await
    }

    pub async fn delete_document(&self, document_id: Uuid) -> Result<(), DomainError> {
        self.repo.delete_document(document_id).await
    }

    pub async fn delete_documents(
        &self,
        document_ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<(), DomainError> {
        self.repo.delete_documents(document_ids, user_id).await
    }

    pub async fn list_documents_by_principal(
        &self,
        principal_id: Uuid,
        permissions: Vec<PermissionLevel>,
        cursor: Option<Cursor>,
        page_size: i32,
    ) -> Result<(Vec<DocumentPermission>, Cursor), DomainError> {
        // An empty filter means "all permissions"; a missing cursor starts a
        // fresh traversal over created_at.
        let permissions = if permissions.is_empty() {
            PermissionLevel::all()
        } else {
            permissions
        };
        let cursor = cursor.unwrap_or_else(|| Cursor::beginning(SortField::CreatedAt));
        self.repo
            .list_documents_by_principal(
                principal_id,
                &permissions,
                &cursor,
                clamp_page_size(page_size),
            )
            .await
    }

    pub async fn get_permission_of_principal_on_document(
        &self,
        document_id: Uuid,
        principal_id: Uuid,
    ) -> Result<Permission, DomainError> {
        self.repo
            .get_permission_of_principal_on_document(document_id, principal_id)
            .await
    }

    pub async fn list_permissions_on_document(
        &self,
        document_id: Uuid,
        permissions: Vec<PermissionLevel>,
        cursor: Option<Cursor>,
        page_size: i32,
    ) -> Result<(Vec<Permission>, Cursor), DomainError> {
        let permissions = if permissions.is_empty() {
            PermissionLevel::all()
        } else {
            permissions
        };
        let cursor = cursor.unwrap_or_else(|| Cursor::beginning(SortField::CreatedAt));
        self.repo
            .list_permissions_on_document(
                document_id,
                &permissions,
                &cursor,
                clamp_page_size(page_size),
            )
            .await
    }

    pub async fn create_guest(
        &self,
        creator_user_id: Uuid,
        document_id: Uuid,
        level: PermissionLevel,
    ) -> Result<Uuid, DomainError> {
        if level == PermissionLevel::Owner {
            warn!(%document_id, "rejected attempt to create an owner guest");
            return Err(DomainError::invalid_input(
                "guests cannot hold the owner permission level",
            ));
        }
        self.repo.create_guest(creator_user_id, document_id, level).await
    }

    pub async fn upsert_permission_user(
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
        self.repo
            .upsert_permission_user(user_id, document_id, level)
            .await
    }

    pub async fn update_permission_guest(
        &self,
        guest_id: Uuid,
        level: PermissionLevel,
    ) -> Result<(), DomainError> {
        if level == PermissionLevel::Owner {
            return Err(DomainError::invalid_input(
                "guests cannot hold the owner permission level",
            ));
        }
        self.repo.update_permission_guest(guest_id, level).await
    }

    pub async fn delete_permission_principal(
        &self,
        recipient_id: Uuid,
        document_id: Uuid,
    ) -> Result<(), DomainError> {
        self.repo
            .delete_permission_principal(recipient_id, document_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryDocumentRepository;

    fn service() -> DocumentService {
        DocumentService::new(Arc::new(MemoryDocumentRepository::new()))
    }

    #[tokio::test]
    async fn create_get_update_get_document() {
        let service = service();
        let owner = Uuid::new_v4();

        let document_id = service
            .create_document(owner, Some("dummy document".into()), None)
            .await
            .unwrap();
        let document = service.get_document(document_id).await.unwrap();
        assert_eq!(document.name.as_deref(), Some("dummy document"));
        assert_eq!(document.created_at, document.last_modified_at);

        service
            .update_document(document_id, Some("updated document".into()), None)
            .await
            .unwrap();
        let updated = service.get_document(document_id).await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("updated document"));
        assert!(updated.last_modified_at > updated.created_at);
    }

    #[tokio::test]
    async fn update_with_nothing_to_change_is_invalid() {
        let service = service();
        let owner = Uuid::new_v4();
        let document_id = service.create_document(owner, None, None).await.unwrap();

        let err = service
            .update_document(document_id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn creation_grants_owner_permission() {
        let service = service();
        let owner = Uuid::new_v4();
        let document_id = service.create_document(owner, None, None).await.unwrap();

        let permission = service
            .get_permission_of_principal_on_document(document_id, owner)
            .await
            .unwrap();
        assert_eq!(permission.permission_level, PermissionLevel::Owner);
        assert_eq!(permission.recipient_kind, crate::domain::PrincipalKind::User);
        assert_eq!(permission.created_by, owner);
    }

    #[tokio::test]
    async fn delete_document_cascades_permissions_and_guests() {
        let service = service();
        let owner = Uuid::new_v4();
        let other_user = Uuid::new_v4();

        let document_id = service.create_document(owner, None, None).await.unwrap();
        service
            .upsert_permission_user(other_user, document_id, PermissionLevel::Editor)
            .await
            .unwrap();
        let guest_id = service
            .create_guest(owner, document_id, PermissionLevel::Viewer)
            .await
            .unwrap();

        // All three principals can see their permission before the delete.
        let (permissions, _) = service
            .list_permissions_on_document(document_id, vec![], None, 10)
            .await
            .unwrap();
        assert_eq!(permissions.len(), 3);

        service.delete_document(document_id).await.unwrap();

        let err = service
            .list_permissions_on_document(document_id, vec![], None, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        for principal in [owner, other_user, guest_id] {
            let (page, _) = service
                .list_documents_by_principal(principal, vec![], None, 10)
                .await
                .unwrap();
            assert!(
                page.iter().all(|dp| dp.document.id != document_id),
                "principal {principal} still sees the deleted document"
            );
        }
    }

    #[tokio::test]
    async fn guest_permission_is_updated_by_guest_id() {
        let service = service();
        let owner = Uuid::new_v4();
        let document_id = service.create_document(owner, None, None).await.unwrap();

        let guest_id = service
            .create_guest(owner, document_id, PermissionLevel::Editor)
            .await
            .unwrap();
        let permission = service
            .get_permission_of_principal_on_document(document_id, guest_id)
            .await
            .unwrap();
        assert_eq!(permission.permission_level, PermissionLevel::Editor);

        service
            .update_permission_guest(guest_id, PermissionLevel::Viewer)
            .await
            .unwrap();
        let updated = service
            .get_permission_of_principal_on_document(document_id, guest_id)
            .await
            .unwrap();
        assert_eq!(updated.permission_level, PermissionLevel::Viewer);
        assert!(updated.last_modified_at > updated.created_at);
    }

    #[tokio::test]
    async fn updating_a_missing_guest_is_not_found() {
        let service = service();
        let err = service
            .update_permission_guest(Uuid::new_v4(), PermissionLevel::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn owner_level_is_gated_everywhere() {
        let service = service();
        let owner = Uuid::new_v4();
        let document_id = service.create_document(owner, None, None).await.unwrap();
        let guest_id = service
            .create_guest(owner, document_id, PermissionLevel::Viewer)
            .await
            .unwrap();

        let err = service
            .upsert_permission_user(Uuid::new_v4(), document_id, PermissionLevel::Owner)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let err = service
            .create_guest(owner, document_id, PermissionLevel::Owner)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        let err = service
            .update_permission_guest(guest_id, PermissionLevel::Owner)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn cursor_pagination_is_stable_over_concurrent_inserts() {
        let service = service();
        let owner = Uuid::new_v4();
        let reader = Uuid::new_v4();

        let mut original = Vec::new();
        for i in 0..5 {
            let id = service
                .create_document(owner, Some(format!("doc {i}")), None)
                .await
                .unwrap();
            service
                .upsert_permission_user(reader, id, PermissionLevel::Editor)
                .await
                .unwrap();
            original.push(id);
        }

        // First page: the three newest of the original five.
        let (page1, cursor1) = service
            .list_documents_by_principal(reader, vec![], None, 3)
            .await
            .unwrap();
        assert_eq!(page1.len(), 3);
        let page1_ids: Vec<Uuid> = page1.iter().map(|dp| dp.document.id).collect();
        assert_eq!(page1_ids, vec![original[4], original[3], original[2]]);

        // Two more documents land, all newer than the cursor position.
        for i in 5..7 {
            let id = service
                .create_document(owner, Some(format!("doc {i}")), None)
                .await
                .unwrap();
            service
                .upsert_permission_user(reader, id, PermissionLevel::Editor)
                .await
                .unwrap();
        }

        // The traversal continues behind the cursor: the remaining two of
        // the original five, and none of the new documents.
        let (page2, cursor2) = service
            .list_documents_by_principal(reader, vec![], Some(cursor1), 3)
            .await
            .unwrap();
        let page2_ids: Vec<Uuid> = page2.iter().map(|dp| dp.document.id).collect();
        assert_eq!(page2_ids, vec![original[1], original[0]]);

        // An exhausted traversal echoes the request cursor back.
        let (page3, cursor3) = service
            .list_documents_by_principal(reader, vec![], Some(cursor2), 3)
            .await
            .unwrap();
        assert!(page3.is_empty());
        assert_eq!(cursor3, cursor2);
    }

    #[tokio::test]
    async fn full_traversal_emits_every_row_once_in_order() {
        let service = service();
        let owner = Uuid::new_v4();
        for i in 0..7 {
            service
                .create_document(owner, Some(format!("doc {i}")), None)
                .await
                .unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor: Option<Cursor> = None;
        loop {
            let (page, next) = service
                .list_documents_by_principal(owner, vec![], cursor, 3)
                .await
                .unwrap();
            if page.is_empty() {
                break;
            }
            seen.extend(page);
            cursor = Some(next);
        }

        assert_eq!(seen.len(), 7);
        for pair in seen.windows(2) {
            let (a, b) = (&pair[0].document, &pair[1].document);
            assert!(
                (a.created_at, a.id) > (b.created_at, b.id),
                "rows out of (created_at DESC, id DESC) order"
            );
        }
    }

    #[tokio::test]
    async fn permission_listing_paginates_and_signals_the_end() {
        let service = service();
        let owner = Uuid::new_v4();
        let document_id = service.create_document(owner, None, None).await.unwrap();
        for _ in 0..4 {
            service
                .upsert_permission_user(Uuid::new_v4(), document_id, PermissionLevel::Viewer)
                .await
                .unwrap();
        }

        // Five rows in total: the owner plus four viewers.
        let mut seen = Vec::new();
        let mut cursor: Option<Cursor> = None;
        loop {
            let (page, next) = service
                .list_permissions_on_document(document_id, vec![], cursor, 2)
                .await
                .unwrap();
            if page.is_empty() {
                assert_eq!(Some(next), cursor, "terminal page must echo the cursor");
                break;
            }
            seen.extend(page);
            cursor = Some(next);
        }
        assert_eq!(seen.len(), 5);
        for pair in seen.windows(2) {
            assert!(
                (pair[0].created_at, pair[0].recipient_id)
                    > (pair[1].created_at, pair[1].recipient_id),
                "rows out of (created_at DESC, recipient_id DESC) order"
            );
        }
    }

    #[tokio::test]
    async fn last_modified_sort_surfaces_recent_updates_first() {
        let service = service();
        let owner = Uuid::new_v4();
        let first = service.create_document(owner, None, None).await.unwrap();
        let second = service.create_document(owner, None, None).await.unwrap();

        // Touching the older document moves it to the front of the
        // last-modified ordering but not the created-at ordering.
        service
            .update_document(first, Some("touched".into()), None)
            .await
            .unwrap();

        let (by_modified, _) = service
            .list_documents_by_principal(
                owner,
                vec![],
                Some(Cursor::beginning(SortField::LastModifiedAt)),
                10,
            )
            .await
            .unwrap();
        let ids: Vec<Uuid> = by_modified.iter().map(|dp| dp.document.id).collect();
        assert_eq!(ids, vec![first, second]);

        let (by_created, _) = service
            .list_documents_by_principal(owner, vec![], None, 10)
            .await
            .unwrap();
        let ids: Vec<Uuid> = by_created.iter().map(|dp| dp.document.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn out_of_range_page_sizes_fall_back_to_the_default() {
        let service = service();
        let owner = Uuid::new_v4();
        for _ in 0..12 {
            service.create_document(owner, None, None).await.unwrap();
        }

        for bad_size in [0, -5, MAX_PAGE_SIZE + 1] {
            let (page, _) = service
                .list_documents_by_principal(owner, vec![], None, bad_size)
                .await
                .unwrap();
            assert_eq!(page.len() as i32, DEFAULT_PAGE_SIZE);
        }
    }

    #[tokio::test]
    async fn permission_filter_narrows_listings() {
        let service = service();
        let owner = Uuid::new_v4();
        let reader = Uuid::new_v4();
        let owned = service.create_document(owner, None, None).await.unwrap();
        let shared = service.create_document(reader, None, None).await.unwrap();
        service
            .upsert_permission_user(owner, shared, PermissionLevel::Viewer)
            .await
            .unwrap();

        let (viewer_only, _) = service
            .list_documents_by_principal(owner, vec![PermissionLevel::Viewer], None, 10)
            .await
            .unwrap();
        assert_eq!(viewer_only.len(), 1);
        assert_eq!(viewer_only[0].document.id, shared);

        let (owner_only, _) = service
            .list_documents_by_principal(owner, vec![PermissionLevel::Owner], None, 10)
            .await
            .unwrap();
        assert_eq!(owner_only.len(), 1);
        assert_eq!(owner_only[0].document.id, owned);
    }

    #[tokio::test]
    async fn bulk_delete_is_all_or_nothing() {
        let service = service();
        let owner = Uuid::new_v4();
        let a = service.create_document(owner, None, None).await.unwrap();
        let b = service.create_document(owner, None, None).await.unwrap();

        let err = service.delete_documents(&[], owner).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        // One bad id poisons the whole batch; both documents survive.
        let err = service
            .delete_documents(&[a, Uuid::new_v4()], owner)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(service.get_document(a).await.is_ok());

        service.delete_documents(&[a, b], owner).await.unwrap();
        assert!(matches!(
            service.get_document(a).await.unwrap_err(),
            DomainError::NotFound(_)
        ));
        assert!(matches!(
            service.get_document(b).await.unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn listing_by_unknown_principal_is_empty_not_an_error() {
        // Principals may be issued but have no listable state yet.
        let service = service();
        let (page, _) = service
            .list_documents_by_principal(Uuid::new_v4(), vec![], None, 10)
            .await
            .unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn deleting_guest_permission_keeps_the_guest_identity() {
        let service = service();
        let owner = Uuid::new_v4();
        let document_id = service.create_document(owner, None, None).await.unwrap();
        let guest_id = service
            .create_guest(owner, document_id, PermissionLevel::Viewer)
            .await
            .unwrap();

        service
            .delete_permission_principal(guest_id, document_id)
            .await
            .unwrap();

        // The identity row survives without a permission row: updating the
        // vanished permission reports the stale-guest inconsistency.
        let err = service
            .update_permission_guest(guest_id, PermissionLevel::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        service.delete_document(document_id).await.unwrap();
    }
}
