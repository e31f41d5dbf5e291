use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::User;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub max_documents: i32,
    pub hashed_password: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.id,
            user_name: row.user_name,
            email: row.email,
            max_documents: row.max_documents,
            hashed_password: row.hashed_password,
            is_active: row.is_active,
            created_at: row.created_at,
            last_modified_at: row.last_modified_at,
        }
    }
}
