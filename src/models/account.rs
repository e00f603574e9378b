//! Backend account records
//!
//! Profile, interests and test drives as exchanged with the backend REST API.
//! The backend speaks camelCase on the wire.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Profile of the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub city: Option<String>,
    pub attributes: HashMap<String, serde_json::Value>,
    pub audiences: Vec<String>,
    pub ab_test_group: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<HashMap<String, serde_json::Value>>,
}

/// Interest expressed by a user in a car
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Interest {
    pub id: String,
    pub user_id: String,
    pub car_id: String,
    pub car_owner: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterestRequest {
    pub car_id: String,
    pub car_owner: String,
}

/// Lifecycle of a test drive booking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestDriveStatus {
    #[default]
    Requested,
    Confirmed,
    Completed,
    Cancelled,
}

impl fmt::Display for TestDriveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestDriveStatus::Requested => write!(f, "requested"),
            TestDriveStatus::Confirmed => write!(f, "confirmed"),
            TestDriveStatus::Completed => write!(f, "completed"),
            TestDriveStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for TestDriveStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "requested" => Ok(TestDriveStatus::Requested),
            "confirmed" => Ok(TestDriveStatus::Confirmed),
            "completed" => Ok(TestDriveStatus::Completed),
            "cancelled" => Ok(TestDriveStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid test drive status: {}", s)),
        }
    }
}

/// A booked test drive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestDrive {
    pub id: String,
    pub user_id: String,
    pub car_id: String,
    pub car_owner: String,
    pub dealer_id: String,
    pub preferred_date: String,
    pub status: TestDriveStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestDriveRequest {
    pub car_id: String,
    pub car_owner: String,
    pub dealer_id: String,
    /// ISO-8601 date
    pub preferred_date: String,
}

/// Result of verifying an ID token with the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthVerifyResponse {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub email_verified: Option<bool>,
    pub claims: HashMap<String, serde_json::Value>,
}
