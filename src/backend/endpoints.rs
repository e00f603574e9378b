//! Typed backend endpoints

use async_trait::async_trait;

use super::client::ApiClient;
use super::error::ApiError;
use crate::models::{
    AuthVerifyResponse, CreateInterestRequest, CreateTestDriveRequest, Interest, TestDrive,
    UpdateProfileRequest, UserProfile,
};

pub const USER_ME_ENDPOINT: &str = "/v1/api/user/me";
pub const INTERESTS_ENDPOINT: &str = "/v1/api/interests";
pub const TEST_DRIVES_ENDPOINT: &str = "/v1/api/test-drives";
pub const AUTH_VERIFY_ENDPOINT: &str = "/v1/api/auth/verify";

/// Backend operations available to a signed-in visitor
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn get_user_profile(&self) -> Result<UserProfile, ApiError>;

    async fn update_user_profile(&self, update: &UpdateProfileRequest) -> Result<UserProfile, ApiError>;

    async fn get_interests(&self) -> Result<Vec<Interest>, ApiError>;

    async fn post_interest(&self, interest: &CreateInterestRequest) -> Result<Interest, ApiError>;

    async fn get_test_drives(&self) -> Result<Vec<TestDrive>, ApiError>;

    async fn post_test_drive(&self, booking: &CreateTestDriveRequest) -> Result<TestDrive, ApiError>;

    /// Register the freshly signed-in user with the backend
    async fn verify_auth(&self) -> Result<AuthVerifyResponse, ApiError>;
}

#[async_trait]
impl BackendApi for ApiClient {
    async fn get_user_profile(&self) -> Result<UserProfile, ApiError> {
        self.get(USER_ME_ENDPOINT).await
    }

    async fn update_user_profile(&self, update: &UpdateProfileRequest) -> Result<UserProfile, ApiError> {
        self.put(USER_ME_ENDPOINT, update).await
    }

    async fn get_interests(&self) -> Result<Vec<Interest>, ApiError> {
        self.get(INTERESTS_ENDPOINT).await
    }

    async fn post_interest(&self, interest: &CreateInterestRequest) -> Result<Interest, ApiError> {
        self.post(INTERESTS_ENDPOINT, Some(interest)).await
    }

    async fn get_test_drives(&self) -> Result<Vec<TestDrive>, ApiError> {
        self.get(TEST_DRIVES_ENDPOINT).await
    }

    async fn post_test_drive(&self, booking: &CreateTestDriveRequest) -> Result<TestDrive, ApiError> {
        self.post(TEST_DRIVES_ENDPOINT, Some(booking)).await
    }

    async fn verify_auth(&self) -> Result<AuthVerifyResponse, ApiError> {
        self.post::<_, ()>(AUTH_VERIFY_ENDPOINT, None).await
    }
}
