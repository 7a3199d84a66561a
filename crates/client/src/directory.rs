use async_trait::async_trait;
use reqwest::Method;

use auditdesk_core::{CompanyId, UserId};
use auditdesk_directory::{
    Company, CompanyDraft, Credentials, PasswordChange, ProfilePatch, User, UserDraft,
};

use crate::api::DirectoryApi;
use crate::client::ApiClient;
use crate::error::ApiError;

#[async_trait]
impl DirectoryApi for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        self.send_json(Method::POST, "users/login/", credentials).await
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get("users/", &[]).await
    }

    async fn get_user(&self, id: UserId) -> Result<User, ApiError> {
        self.get(&format!("users/{id}/"), &[]).await
    }

    async fn create_user(&self, draft: &UserDraft) -> Result<User, ApiError> {
        self.send_json(Method::POST, "users/", draft).await
    }

    async fn update_user(&self, id: UserId, draft: &UserDraft) -> Result<User, ApiError> {
        self.send_json(Method::PUT, &format!("users/{id}/"), draft).await
    }

    async fn update_profile(&self, id: UserId, patch: &ProfilePatch) -> Result<User, ApiError> {
        self.send_json(Method::PATCH, &format!("users/{id}/"), patch).await
    }

    async fn delete_user(&self, id: UserId) -> Result<(), ApiError> {
        self.send_unit::<()>(Method::DELETE, &format!("users/{id}/"), None).await
    }

    async fn change_password(&self, id: UserId, change: &PasswordChange) -> Result<(), ApiError> {
        self.send_unit(Method::POST, &format!("users/{id}/change_password/"), Some(change))
            .await
    }

    async fn list_companies(&self) -> Result<Vec<Company>, ApiError> {
        self.get("companies/", &[]).await
    }

    async fn get_company(&self, id: CompanyId) -> Result<Company, ApiError> {
        self.get(&format!("companies/{id}/"), &[]).await
    }

    async fn create_company(&self, draft: &CompanyDraft) -> Result<Company, ApiError> {
        self.send_json(Method::POST, "companies/", draft).await
    }

    async fn update_company(&self, id: CompanyId, draft: &CompanyDraft) -> Result<Company, ApiError> {
        self.send_json(Method::PUT, &format!("companies/{id}/"), draft).await
    }

    async fn delete_company(&self, id: CompanyId) -> Result<(), ApiError> {
        self.send_unit::<()>(Method::DELETE, &format!("companies/{id}/"), None).await
    }
}
