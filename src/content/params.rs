//! Typed listing parameters
//!
//! Each params struct translates to one [`Query`] against its content type.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::query::Query;
use crate::models::{CarType, NewsCategory};

pub const CAR: &str = "car";
pub const CAR_VARIANT: &str = "car_variant_specs";
pub const REVIEW: &str = "review";
pub const NEWS: &str = "news";
pub const HEADER: &str = "header";
pub const FOOTER: &str = "footer";
pub const BANNER: &str = "banner";

pub const DEFAULT_CAR_LIMIT: u32 = 12;
pub const DEFAULT_REVIEW_LIMIT: u32 = 12;
pub const DEFAULT_NEWS_LIMIT: u32 = 20;

/// Car listing order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
}

impl CarSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarSort::Newest => "newest",
            CarSort::Oldest => "oldest",
            CarSort::PriceAsc => "price_asc",
            CarSort::PriceDesc => "price_desc",
        }
    }

    fn apply(&self, query: Query) -> Query {
        match self {
            CarSort::Newest => query.descending("created_at"),
            CarSort::Oldest => query.ascending("created_at"),
            CarSort::PriceAsc => query.ascending("price"),
            CarSort::PriceDesc => query.descending("price"),
        }
    }
}

impl FromStr for CarSort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(CarSort::Newest),
            "oldest" => Ok(CarSort::Oldest),
            "price_asc" => Ok(CarSort::PriceAsc),
            "price_desc" => Ok(CarSort::PriceDesc),
            _ => Err(anyhow::anyhow!("Invalid car sort: {}", s)),
        }
    }
}

/// Review listing order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
    #[default]
    Newest,
    Oldest,
    RatingHigh,
    RatingLow,
}

impl ReviewSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewSort::Newest => "newest",
            ReviewSort::Oldest => "oldest",
            ReviewSort::RatingHigh => "rating_high",
            ReviewSort::RatingLow => "rating_low",
        }
    }

    fn apply(&self, query: Query) -> Query {
        match self {
            ReviewSort::Newest => query.descending("publish_date"),
            ReviewSort::Oldest => query.ascending("publish_date"),
            ReviewSort::RatingHigh => query.descending("rating"),
            ReviewSort::RatingLow => query.ascending("rating"),
        }
    }
}

impl FromStr for ReviewSort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(ReviewSort::Newest),
            "oldest" => Ok(ReviewSort::Oldest),
            "rating_high" => Ok(ReviewSort::RatingHigh),
            "rating_low" => Ok(ReviewSort::RatingLow),
            _ => Err(anyhow::anyhow!("Invalid review sort: {}", s)),
        }
    }
}

/// News listing order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsSort {
    #[default]
    Newest,
    Oldest,
}

impl FromStr for NewsSort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(NewsSort::Newest),
            "oldest" => Ok(NewsSort::Oldest),
            _ => Err(anyhow::anyhow!("Invalid news sort: {}", s)),
        }
    }
}

/// Car listing filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarParams {
    pub brand: Option<String>,
    pub fuel_type: Option<String>,
    /// Exclusive lower bound, ignored when zero
    pub price_min: Option<f64>,
    /// Exclusive upper bound
    pub price_max: Option<f64>,
    pub city: Option<String>,
    pub is_new: Option<bool>,
    pub is_featured: bool,
    pub car_type: Option<CarType>,
    pub sort: CarSort,
    pub limit: u32,
    pub skip: u32,
}

impl Default for CarParams {
    fn default() -> Self {
        Self {
            brand: None,
            fuel_type: None,
            price_min: None,
            price_max: None,
            city: None,
            is_new: None,
            is_featured: false,
            car_type: None,
            sort: CarSort::default(),
            limit: DEFAULT_CAR_LIMIT,
            skip: 0,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl CarParams {
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        if let Some(brand) = non_empty(&self.brand) {
            query = query.where_eq("brand", brand);
        }
        if let Some(fuel) = non_empty(&self.fuel_type) {
            query = query.where_eq("fuel_type", fuel);
        }
        if let Some(min) = self.price_min.filter(|m| *m > 0.0) {
            query = query.greater_than("price", min);
        }
        if let Some(max) = self.price_max.filter(|m| *m > 0.0) {
            query = query.less_than("price", max);
        }
        if let Some(city) = non_empty(&self.city) {
            query = query.where_eq("city", city);
        }
        if let Some(is_new) = self.is_new {
            query = query.where_eq("is_new", is_new);
        }
        if let Some(car_type) = self.car_type {
            query = query.where_eq("car_type", car_type.to_string());
        }
        if self.is_featured {
            query = query.where_eq("is_featured", true);
        }
        self.sort
            .apply(query)
            .limit(self.limit)
            .skip(self.skip)
            .include_count()
    }
}

/// Review listing filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewParams {
    pub review_type: Option<String>,
    pub car_brand: Option<String>,
    pub is_featured: bool,
    pub is_editors_pick: bool,
    pub sort: ReviewSort,
    pub limit: u32,
    pub skip: u32,
}

impl Default for ReviewParams {
    fn default() -> Self {
        Self {
            review_type: None,
            car_brand: None,
            is_featured: false,
            is_editors_pick: false,
            sort: ReviewSort::default(),
            limit: DEFAULT_REVIEW_LIMIT,
            skip: 0,
        }
    }
}

impl ReviewParams {
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        if let Some(review_type) = non_empty(&self.review_type) {
            query = query.where_eq("review_type", review_type);
        }
        if let Some(brand) = non_empty(&self.car_brand) {
            query = query.where_eq("car_brand", brand);
        }
        if self.is_featured {
            query = query.where_eq("is_featured", true);
        }
        if self.is_editors_pick {
            query = query.where_eq("is_editors_pick", true);
        }
        self.sort
            .apply(query)
            .limit(self.limit)
            .skip(self.skip)
            .include_count()
    }
}

/// News listing filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsParams {
    pub category: Option<NewsCategory>,
    pub is_breaking: Option<bool>,
    pub is_featured: Option<bool>,
    /// Matched against `related_brand`
    pub brand: Option<String>,
    /// Case-insensitive title search
    pub search: Option<String>,
    pub sort: NewsSort,
    pub limit: u32,
    pub skip: u32,
}

impl Default for NewsParams {
    fn default() -> Self {
        Self {
            category: None,
            is_breaking: None,
            is_featured: None,
            brand: None,
            search: None,
            sort: NewsSort::default(),
            limit: DEFAULT_NEWS_LIMIT,
            skip: 0,
        }
    }
}

impl NewsParams {
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        if let Some(category) = self.category {
            query = query.where_eq("category", category.as_str());
        }
        if let Some(is_breaking) = self.is_breaking {
            query = query.where_eq("is_breaking", is_breaking);
        }
        if let Some(is_featured) = self.is_featured {
            query = query.where_eq("is_featured", is_featured);
        }
        if let Some(brand) = non_empty(&self.brand) {
            query = query.where_eq("related_brand", brand);
        }
        if let Some(search) = non_empty(&self.search) {
            query = query.regex("title", &format!(".*{}.*", regex::escape(search)));
        }
        let query = match self.sort {
            NewsSort::Newest => query.descending("publish_date"),
            NewsSort::Oldest => query.ascending("publish_date"),
        };
        query.skip(self.skip).limit(self.limit).include_count()
    }
}
