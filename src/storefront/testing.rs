//! In-memory backend for controller tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::backend::{ApiError, BackendApi};
use crate::models::{
    AuthVerifyResponse, CreateInterestRequest, CreateTestDriveRequest, Interest, TestDrive,
    UpdateProfileRequest, UserProfile,
};

/// Backend that records every call and answers from memory
///
/// `fail_with` makes one operation fail until another failure replaces it.
#[derive(Default)]
pub(crate) struct FakeBackend {
    profile: Mutex<UserProfile>,
    interests: Mutex<Vec<Interest>>,
    test_drives: Mutex<Vec<TestDrive>>,
    posted_interests: Mutex<Vec<CreateInterestRequest>>,
    posted_test_drives: Mutex<Vec<CreateTestDriveRequest>>,
    profile_updates: Mutex<Vec<UpdateProfileRequest>>,
    failures: Mutex<HashMap<&'static str, ApiError>>,
    calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        *backend.profile.lock().unwrap() = UserProfile {
            uid: "uid-user@example.com".to_string(),
            email: "user@example.com".to_string(),
            ..UserProfile::default()
        };
        backend
    }

    pub fn fail_with(&self, operation: &'static str, error: ApiError) {
        self.failures.lock().unwrap().insert(operation, error);
    }

    pub fn fail_verify_with(&self, error: ApiError) {
        self.fail_with("verify_auth", error);
    }

    pub fn add_interest(&self, interest: Interest) {
        self.interests.lock().unwrap().push(interest);
    }

    /// Backend calls made so far, `verify_auth` included
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn posted_interests(&self) -> Vec<CreateInterestRequest> {
        self.posted_interests.lock().unwrap().clone()
    }

    pub fn posted_test_drives(&self) -> Vec<CreateTestDriveRequest> {
        self.posted_test_drives.lock().unwrap().clone()
    }

    pub fn profile_updates(&self) -> Vec<UpdateProfileRequest> {
        self.profile_updates.lock().unwrap().clone()
    }

    fn enter(&self, operation: &'static str) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failures.lock().unwrap().get(operation) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn get_user_profile(&self) -> Result<UserProfile, ApiError> {
        self.enter("get_user_profile")?;
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn update_user_profile(&self, update: &UpdateProfileRequest) -> Result<UserProfile, ApiError> {
        self.enter("update_user_profile")?;
        self.profile_updates.lock().unwrap().push(update.clone());
        let mut profile = self.profile.lock().unwrap();
        if let Some(name) = &update.name {
            profile.name = Some(name.clone());
        }
        if let Some(city) = &update.city {
            profile.city = Some(city.clone());
        }
        Ok(profile.clone())
    }

    async fn get_interests(&self) -> Result<Vec<Interest>, ApiError> {
        self.enter("get_interests")?;
        Ok(self.interests.lock().unwrap().clone())
    }

    async fn post_interest(&self, interest: &CreateInterestRequest) -> Result<Interest, ApiError> {
        self.enter("post_interest")?;
        self.posted_interests.lock().unwrap().push(interest.clone());
        let mut interests = self.interests.lock().unwrap();
        let created = Interest {
            id: format!("interest-{}", interests.len() + 1),
            user_id: self.profile.lock().unwrap().uid.clone(),
            car_id: interest.car_id.clone(),
            car_owner: interest.car_owner.clone(),
            created_at: "2024-03-10T10:00:00.000Z".to_string(),
        };
        interests.push(created.clone());
        Ok(created)
    }

    async fn get_test_drives(&self) -> Result<Vec<TestDrive>, ApiError> {
        self.enter("get_test_drives")?;
        Ok(self.test_drives.lock().unwrap().clone())
    }

    async fn post_test_drive(&self, booking: &CreateTestDriveRequest) -> Result<TestDrive, ApiError> {
        self.enter("post_test_drive")?;
        self.posted_test_drives.lock().unwrap().push(booking.clone());
        let mut drives = self.test_drives.lock().unwrap();
        let created = TestDrive {
            id: format!("drive-{}", drives.len() + 1),
            user_id: self.profile.lock().unwrap().uid.clone(),
            car_id: booking.car_id.clone(),
            car_owner: booking.car_owner.clone(),
            dealer_id: booking.dealer_id.clone(),
            preferred_date: booking.preferred_date.clone(),
            ..TestDrive::default()
        };
        drives.push(created.clone());
        Ok(created)
    }

    async fn verify_auth(&self) -> Result<AuthVerifyResponse, ApiError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.enter("verify_auth")?;
        let profile = self.profile.lock().unwrap().clone();
        Ok(AuthVerifyResponse {
            uid: profile.uid,
            email: Some(profile.email),
            ..AuthVerifyResponse::default()
        })
    }
}
