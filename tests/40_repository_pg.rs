//! Integration tests for the Postgres document repository.
//!
//! These run against a real database and are ignored by default:
//!
//! ```sh
//! POSTGRES_HOST=localhost POSTGRES_DB=vellum_test cargo test -- --ignored
//! ```
//!
//! The document schema migrations are applied before each suite.

use std::sync::Arc;

use uuid::Uuid;

use vellum_api::config;
use vellum_api::database::{self, document_repository::PgDocumentRepository};
use vellum_api::domain::{Cursor, DomainError, PermissionLevel, SortField};
use vellum_api::services::document_service::{DocumentRepository, DocumentService};

async fn test_repository() -> Arc<PgDocumentRepository> {
    let pool = database::connect_pool(&config::config().postgres)
        .await
        .expect("failed to connect to postgres; is the test database up?");
    sqlx::migrate!("migrations/documents")
        .run(&pool)
        .await
        .expect("failed to apply document schema migrations");
    Arc::new(PgDocumentRepository::new(pool))
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn create_then_delete_cascades_permissions_and_guests() {
    let repo = test_repository().await;
    let owner = Uuid::new_v4();

    let document_id = repo
        .create_document(owner, Some("integration doc".into()), None)
        .await
        .unwrap();
    let guest_id = repo
        .create_guest(owner, document_id, PermissionLevel::Viewer)
        .await
        .unwrap();

    let permission = repo
        .get_permission_of_principal_on_document(document_id, owner)
        .await
        .unwrap();
    assert_eq!(permission.permission_level, PermissionLevel::Owner);

    repo.delete_document(document_id).await.unwrap();

    for principal in [owner, guest_id] {
        let err = repo
            .get_permission_of_principal_on_document(document_id, principal)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
    let err = repo
        .update_permission_guest(guest_id, PermissionLevel::Editor)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn upsert_is_visible_in_keyset_listing() {
    let repo = test_repository().await;
    let owner = Uuid::new_v4();
    let reader = Uuid::new_v4();

    let document_id = repo.create_document(owner, None, None).await.unwrap();
    repo.upsert_permission_user(reader, document_id, PermissionLevel::Editor)
        .await
        .unwrap();

    let cursor = Cursor::beginning(SortField::CreatedAt);
    let (page, response_cursor) = repo
        .list_documents_by_principal(reader, &PermissionLevel::all(), &cursor, 10)
        .await
        .unwrap();
    let found = page
        .iter()
        .find(|dp| dp.document.id == document_id)
        .expect("shared document missing from listing");
    assert_eq!(found.permission_level, PermissionLevel::Editor);
    assert_eq!(response_cursor.last_seen_id, page.last().unwrap().document.id);

    // Lowering the level is observed on the next read.
    repo.upsert_permission_user(reader, document_id, PermissionLevel::Viewer)
        .await
        .unwrap();
    let permission = repo
        .get_permission_of_principal_on_document(document_id, reader)
        .await
        .unwrap();
    assert_eq!(permission.permission_level, PermissionLevel::Viewer);

    repo.delete_document(document_id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn owner_gate_and_empty_batch_are_rejected_end_to_end() {
    let repo = test_repository().await;
    let service = DocumentService::new(repo.clone());
    let owner = Uuid::new_v4();
    let document_id = service.create_document(owner, None, None).await.unwrap();

    let err = service
        .upsert_permission_user(Uuid::new_v4(), document_id, PermissionLevel::Owner)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));

    let err = service.delete_documents(&[], owner).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));

    service.delete_documents(&[document_id], owner).await.unwrap();
}
