//! Car detail page and its gated actions

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::ActionResult;
use crate::backend::{login_location, BackendApi};
use crate::content::{Catalog, Fetched};
use crate::identity::SessionBridge;
use crate::models::{CarEntry, CarVariant, CreateInterestRequest, CreateTestDriveRequest, Interest, TestDrive};
use crate::utils::format::parse_date;
use crate::utils::validate::{is_date_in_range, is_future_date};

/// How far ahead a test drive can be booked
pub const TEST_DRIVE_WINDOW_DAYS: i64 = 30;
pub const INVALID_DATE_MESSAGE: &str = "Please select a valid future date";
pub const WINDOW_MESSAGE: &str = "Test drives can be booked up to 30 days in advance";

/// A car with its variants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarDetail {
    pub car: CarEntry,
    pub variants: Vec<CarVariant>,
}

/// Load the car addressed by `id` (slug or uid) and its variants
///
/// Missing variants do not fail the page.
pub async fn load_car_detail(catalog: &Catalog, id: &str) -> Fetched<CarDetail> {
    let car = match catalog.resolve_car(id).await {
        Fetched::Ready(car) => car,
        Fetched::Empty => return Fetched::Empty,
        Fetched::Failed(e) => return Fetched::Failed(e),
        Fetched::NotConfigured => return Fetched::NotConfigured,
    };
    let variants = catalog.car_variants(&car.uid).await.into_vec();
    Fetched::Ready(CarDetail { car, variants })
}

/// Interest and test-drive actions on one car
#[derive(Debug, Clone)]
pub struct CarActions {
    car: CarEntry,
    path: String,
}

impl CarActions {
    pub fn new(car: CarEntry) -> Self {
        let path = format!("/cars/{}", car.route_id());
        Self { car, path }
    }

    /// Page the visitor returns to after logging in
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Login location for a signed-out visitor, `None` when signed in
    pub fn gate(&self, bridge: &SessionBridge) -> Option<String> {
        if bridge.is_authenticated() {
            None
        } else {
            Some(login_location(Some(&self.path)))
        }
    }

    pub async fn express_interest(
        &self,
        bridge: &SessionBridge,
        backend: &dyn BackendApi,
    ) -> ActionResult<Interest> {
        if let Some(login) = self.gate(bridge) {
            return ActionResult::Redirect(login);
        }

        let request = CreateInterestRequest {
            car_id: self.car.uid.clone(),
            car_owner: self.car.owner().to_string(),
        };
        let result = ActionResult::from_api(backend.post_interest(&request).await, &self.path, "Interest");
        if result.is_done() {
            info!("Interest recorded for car {}", self.car.uid);
        }
        result
    }

    /// Book a test drive on `date_input` (`YYYY-MM-DD`)
    ///
    /// The date must fall after `today` and within the booking window; it is
    /// checked before the login gate and before any request.
    pub async fn book_test_drive(
        &self,
        bridge: &SessionBridge,
        backend: &dyn BackendApi,
        date_input: &str,
        today: NaiveDate,
    ) -> ActionResult<TestDrive> {
        let date = match validate_test_drive_date(date_input, today) {
            Ok(date) => date,
            Err(message) => return ActionResult::Invalid(message.to_string()),
        };
        if let Some(login) = self.gate(bridge) {
            return ActionResult::Redirect(login);
        }

        let owner = self.car.owner().to_string();
        let request = CreateTestDriveRequest {
            car_id: self.car.uid.clone(),
            car_owner: owner.clone(),
            dealer_id: owner,
            preferred_date: format!("{}T00:00:00.000Z", date.format("%Y-%m-%d")),
        };
        let result = ActionResult::from_api(backend.post_test_drive(&request).await, &self.path, "Test drive");
        if result.is_done() {
            info!("Test drive booked for car {} on {}", self.car.uid, date);
        }
        result
    }
}

fn validate_test_drive_date(input: &str, today: NaiveDate) -> Result<NaiveDate, &'static str> {
    let date = parse_date(input).ok_or(INVALID_DATE_MESSAGE)?;
    if !is_future_date(date, today) {
        return Err(INVALID_DATE_MESSAGE);
    }
    if !is_date_in_range(date, today, 1, TEST_DRIVE_WINDOW_DAYS) {
        return Err(WINDOW_MESSAGE);
    }
    Ok(date)
}
