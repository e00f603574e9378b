//! Personal dashboard

use serde::Serialize;
use tracing::{info, warn};

use super::ActionResult;
use crate::backend::{login_location, ApiError, BackendApi};
use crate::identity::SessionBridge;
use crate::models::{Interest, SessionUser, TestDrive, UpdateProfileRequest, UserProfile};

pub const NAME_REQUIRED_MESSAGE: &str = "Name is required";
const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardData {
    pub user: SessionUser,
    /// `None` when the profile could not be loaded
    pub profile: Option<UserProfile>,
    pub interests: Vec<Interest>,
    pub test_drives: Vec<TestDrive>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", content = "data", rename_all = "snake_case")]
pub enum DashboardView {
    Ready(DashboardData),
    Redirect(String),
}

/// Dashboard of one signed-in visitor
pub struct Dashboard<'a> {
    bridge: &'a SessionBridge,
    backend: &'a dyn BackendApi,
}

/// Unwrap one dashboard section; `None` on failure, flagging auth failures
fn section<T>(result: Result<T, ApiError>, what: &str, signed_out: &mut bool) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_auth_error() => {
            *signed_out = true;
            None
        }
        Err(e) => {
            warn!("Failed to load {}: {}", what, e);
            None
        }
    }
}

impl<'a> Dashboard<'a> {
    pub fn new(bridge: &'a SessionBridge, backend: &'a dyn BackendApi) -> Self {
        Self { bridge, backend }
    }

    /// Load profile, interests and test drives
    ///
    /// A section that fails to load is left empty; an expired session sends
    /// the visitor to log in.
    pub async fn load(&self) -> DashboardView {
        let Some(user) = self.bridge.current_user() else {
            return DashboardView::Redirect(login_location(Some(DASHBOARD_PATH)));
        };

        let (profile, interests, test_drives) = tokio::join!(
            self.backend.get_user_profile(),
            self.backend.get_interests(),
            self.backend.get_test_drives(),
        );
        let mut signed_out = false;
        let data = DashboardData {
            user,
            profile: section(profile, "profile", &mut signed_out),
            interests: section(interests, "interests", &mut signed_out).unwrap_or_default(),
            test_drives: section(test_drives, "test drives", &mut signed_out).unwrap_or_default(),
        };

        if signed_out {
            return DashboardView::Redirect(login_location(Some(DASHBOARD_PATH)));
        }
        DashboardView::Ready(data)
    }

    /// Save name and city; a blank city is left out of the update
    pub async fn update_profile(&self, name: &str, city: &str) -> ActionResult<UserProfile> {
        let name = name.trim();
        if name.is_empty() {
            return ActionResult::Invalid(NAME_REQUIRED_MESSAGE.to_string());
        }
        if !self.bridge.is_authenticated() {
            return ActionResult::Redirect(login_location(Some(DASHBOARD_PATH)));
        }

        let city = city.trim();
        let update = UpdateProfileRequest {
            name: Some(name.to_string()),
            city: (!city.is_empty()).then(|| city.to_string()),
            attributes: None,
        };
        let result = ActionResult::from_api(
            self.backend.update_user_profile(&update).await,
            DASHBOARD_PATH,
            "Profile update",
        );
        if result.is_done() {
            info!("Profile updated");
        }
        result
    }

    /// Sign out; returns where to go next
    pub async fn logout(&self) -> String {
        if let Err(e) = self.bridge.logout().await {
            warn!("Logout failed: {}", e);
        }
        "/".to_string()
    }
}
