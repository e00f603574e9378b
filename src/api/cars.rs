//! Car API endpoints
//!
//! - GET /cars - Listing with filters, sort, pagination and search
//! - GET /cars/{car_id} - Car detail with variants (slug or uid)
//! - POST /cars/{car_id}/interest - Express interest (signed in)
//! - POST /cars/{car_id}/test-drive - Book a test drive (signed in)

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{page_param, ApiError, AppState, Session};
use crate::content::{CarSort, Fetched, Page};
use crate::models::{CarEntry, CarType, CarVariant};
use crate::storefront::{load_car_detail, CarActions, CarFilters, PriceRange, PRICE_RANGES};
use crate::utils::format_price;

/// Query parameters of the car listing
#[derive(Debug, Default, Deserialize)]
pub struct CarsQuery {
    #[serde(rename = "type")]
    pub car_type: Option<String>,
    pub brand: Option<String>,
    pub fuel: Option<String>,
    pub price: Option<String>,
    pub city: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub q: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CarsQuery {
    fn into_filters(self) -> Result<CarFilters, ApiError> {
        let invalid = |e: anyhow::Error| ApiError::validation_error(e.to_string());
        Ok(CarFilters {
            car_type: non_blank(self.car_type)
                .map(|t| t.parse::<CarType>())
                .transpose()
                .map_err(invalid)?,
            brand: non_blank(self.brand),
            fuel_type: non_blank(self.fuel),
            price: non_blank(self.price)
                .map(|p| p.parse::<PriceRange>())
                .transpose()
                .map_err(invalid)?,
            city: non_blank(self.city),
            sort: match non_blank(self.sort) {
                Some(sort) => sort.parse::<CarSort>().map_err(invalid)?,
                None => CarSort::Newest,
            },
            page: page_param(self.page)?,
            search: self.q.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PriceRangeOption {
    pub label: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CarListResponse {
    pub heading: &'static str,
    pub filters: CarFilters,
    pub cars: Vec<CarEntry>,
    pub total: u64,
    pub total_pages: u32,
    pub pagination: Vec<u32>,
    pub has_active_filters: bool,
    pub brands: Vec<String>,
    pub cities: Vec<String>,
    pub price_ranges: Vec<PriceRangeOption>,
    /// The last load failed; `cars` is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CarDetailResponse {
    pub car: CarEntry,
    pub variants: Vec<CarVariant>,
    pub price_label: String,
    pub signed_in: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TestDriveBody {
    #[serde(default)]
    pub preferred_date: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cars))
        .route("/{car_id}", get(get_car))
        .route("/{car_id}/interest", post(express_interest))
        .route("/{car_id}/test-drive", post(book_test_drive))
}

/// GET /cars - Car listing
///
/// A request superseded by a newer listing request of the same visitor
/// answers 409.
async fn list_cars(
    State(state): State<AppState>,
    Extension(session): Session,
    Query(query): Query<CarsQuery>,
) -> Result<Json<CarListResponse>, ApiError> {
    let filters = query.into_filters()?;
    let catalog = &state.catalog;

    let listing = session.car_listing();
    if !listing.load(catalog.fetch_cars(&filters.to_params())).await {
        return Err(ApiError::conflict("Superseded by a newer listing request"));
    }
    let (brands, cities) = tokio::join!(catalog.brands(), catalog.cities());

    let (page, error) = match listing.state().result {
        Some(Fetched::Ready(page)) => (page, None),
        Some(Fetched::Failed(message)) => (Page::empty(0, 0), Some(message)),
        _ => (Page::empty(0, 0), None),
    };
    let total = page.total();

    Ok(Json(CarListResponse {
        heading: filters.heading(),
        cars: filters.visible(page.items()).into_iter().cloned().collect(),
        total,
        total_pages: filters.total_pages(total),
        pagination: filters.pagination(total),
        has_active_filters: filters.has_active_filters(),
        brands: brands.into_vec(),
        cities: cities.into_vec(),
        price_ranges: PRICE_RANGES
            .iter()
            .map(|&(label, value)| PriceRangeOption { label, value })
            .collect(),
        error,
        filters,
    }))
}

/// GET /cars/{car_id} - Car detail by slug or uid
async fn get_car(
    State(state): State<AppState>,
    Extension(session): Session,
    Path(car_id): Path<String>,
) -> Result<Json<CarDetailResponse>, ApiError> {
    match load_car_detail(&state.catalog, &car_id).await {
        Fetched::Ready(detail) => Ok(Json(CarDetailResponse {
            price_label: format_price(detail.car.price),
            car: detail.car,
            variants: detail.variants,
            signed_in: session.bridge().is_authenticated(),
        })),
        other => Err(ApiError::from_missing(other, "Car")),
    }
}

async fn car_actions(state: &AppState, car_id: &str) -> Result<CarActions, ApiError> {
    match state.catalog.resolve_car(car_id).await {
        Fetched::Ready(car) => Ok(CarActions::new(car)),
        other => Err(ApiError::from_missing(other, "Car")),
    }
}

/// POST /cars/{car_id}/interest - Express interest in a car
async fn express_interest(
    State(state): State<AppState>,
    Extension(session): Session,
    Path(car_id): Path<String>,
) -> Result<Response, ApiError> {
    let actions = car_actions(&state, &car_id).await?;
    let backend = session.backend(actions.path());
    let response = actions
        .express_interest(session.bridge(), backend.client())
        .await
        .into_response();
    Ok(backend.respond(response))
}

/// POST /cars/{car_id}/test-drive - Book a test drive
///
/// Body: `{"preferred_date": "YYYY-MM-DD"}`
async fn book_test_drive(
    State(state): State<AppState>,
    Extension(session): Session,
    Path(car_id): Path<String>,
    Json(body): Json<TestDriveBody>,
) -> Result<Response, ApiError> {
    let actions = car_actions(&state, &car_id).await?;
    let backend = session.backend(actions.path());
    let today = chrono::Local::now().date_naive();
    let response = actions
        .book_test_drive(session.bridge(), backend.client(), &body.preferred_date, today)
        .await
        .into_response();
    Ok(backend.respond(response))
}
