use uuid::Uuid;

use crate::api::types::{
    ChangeUserPasswordRequest, CreateUserReply, CreateUserRequest, DeactivateUserRequest, Empty,
    GetUserReply, GetUserRequest, ValidatePasswordReply, ValidatePasswordRequest, WireUser,
};
use crate::client::{call_unary, ClientError};

#[derive(Clone)]
pub struct UserServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl UserServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn create_user(
        &self,
        user_name: String,
        email: String,
        max_documents: Option<i32>,
        password: String,
    ) -> Result<Uuid, ClientError> {
        let reply: CreateUserReply = call_unary(
            &self.http,
            &self.base_url,
            "create_user",
            &CreateUserRequest {
                user_name,
                email,
                max_documents,
                password,
            },
        )
        .await?;
        Ok(reply.user_id)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<WireUser, ClientError> {
        let reply: GetUserReply = call_unary(
            &self.http,
            &self.base_url,
            "get_user",
            &GetUserRequest { user_id },
        )
        .await?;
        Ok(reply.user)
    }

    pub async fn deactivate_user(&self, user_id: Uuid) -> Result<(), ClientError> {
        let _: Empty = call_unary(
            &self.http,
            &self.base_url,
            "deactivate_user",
            &DeactivateUserRequest { user_id },
        )
        .await?;
        Ok(())
    }

    pub async fn change_user_password(
        &self,
        user_id: Uuid,
        old_password: String,
        new_password: String,
    ) -> Result<(), ClientError> {
        let _: Empty = call_unary(
            &self.http,
            &self.base_url,
            "change_user_password",
            &ChangeUserPasswordRequest {
                user_id,
                old_password,
                new_password,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn validate_password(
        &self,
        user_name: String,
        password: String,
    ) -> Result<(Option<Uuid>, bool), ClientError> {
        let reply: ValidatePasswordReply = call_unary(
            &self.http,
            &self.base_url,
            "validate_password",
            &ValidatePasswordRequest {
                user_name,
                password,
            },
        )
        .await?;
        Ok((reply.user_id, reply.is_valid))
    }
}
