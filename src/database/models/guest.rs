use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A guest identity minted for anonymous sharing, tied to one document.
#[derive(Debug, Clone, FromRow)]
pub struct GuestRow {
    pub id: Uuid,
    pub document_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}
