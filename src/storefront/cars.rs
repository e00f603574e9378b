//! Car listing page

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::listing::{page_offset, pagination_window, total_pages};
use crate::content::{CarParams, CarSort};
use crate::models::{CarEntry, CarType};

pub const CARS_PER_PAGE: u32 = 12;

/// Price filter options as `(label, value)`
pub const PRICE_RANGES: &[(&str, &str)] = &[
    ("Under ₹5 Lakh", "0-500000"),
    ("₹5-10 Lakh", "500000-1000000"),
    ("₹10-20 Lakh", "1000000-2000000"),
    ("₹20-50 Lakh", "2000000-5000000"),
    ("Above ₹50 Lakh", "5000000-"),
];

/// `min-max` price bounds; either side may be open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl FromStr for PriceRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("Invalid price range: {}", s))?;
        let bound = |v: &str| -> anyhow::Result<Option<u64>> {
            match v.trim() {
                "" => Ok(None),
                v => Ok(Some(v.parse()?)),
            }
        };
        Ok(Self {
            min: bound(min)?,
            max: bound(max)?,
        })
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(min) = self.min {
            write!(f, "{}", min)?;
        }
        f.write_str("-")?;
        if let Some(max) = self.max {
            write!(f, "{}", max)?;
        }
        Ok(())
    }
}

/// Filters, sort, page and search box of the car listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarFilters {
    pub car_type: Option<CarType>,
    pub brand: Option<String>,
    pub fuel_type: Option<String>,
    pub price: Option<PriceRange>,
    pub city: Option<String>,
    pub sort: CarSort,
    /// 1-based
    pub page: u32,
    /// Narrows the loaded page without another request
    pub search: String,
}

impl Default for CarFilters {
    fn default() -> Self {
        Self {
            car_type: None,
            brand: None,
            fuel_type: None,
            price: None,
            city: None,
            sort: CarSort::Newest,
            page: 1,
            search: String::new(),
        }
    }
}

impl CarFilters {
    pub fn to_params(&self) -> CarParams {
        CarParams {
            brand: self.brand.clone(),
            fuel_type: self.fuel_type.clone(),
            price_min: self.price.and_then(|p| p.min).map(|v| v as f64),
            price_max: self.price.and_then(|p| p.max).map(|v| v as f64),
            city: self.city.clone(),
            car_type: self.car_type,
            sort: self.sort,
            limit: CARS_PER_PAGE,
            skip: page_offset(self.page, CARS_PER_PAGE),
            ..CarParams::default()
        }
    }

    /// Brand, fuel, price or city narrows the listing
    pub fn has_active_filters(&self) -> bool {
        self.brand.is_some() || self.fuel_type.is_some() || self.price.is_some() || self.city.is_some()
    }

    /// Reset filters and sort and go back to the first page
    ///
    /// The car type comes from the URL and the search box is separate, so
    /// both stay.
    pub fn clear_filters(&mut self) {
        self.brand = None;
        self.fuel_type = None;
        self.price = None;
        self.city = None;
        self.sort = CarSort::Newest;
        self.page = 1;
    }

    pub fn total_pages(&self, total: u64) -> u32 {
        total_pages(total, CARS_PER_PAGE)
    }

    pub fn pagination(&self, total: u64) -> Vec<u32> {
        pagination_window(self.total_pages(total))
    }

    /// Cars of the loaded page matching the search box by title, brand or model
    pub fn visible<'a>(&self, cars: &'a [CarEntry]) -> Vec<&'a CarEntry> {
        let needle = self.search.trim().to_lowercase();
        cars.iter()
            .filter(|car| {
                needle.is_empty()
                    || car.title.to_lowercase().contains(&needle)
                    || car.brand.to_lowercase().contains(&needle)
                    || car.model.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Page heading for the car type
    pub fn heading(&self) -> &'static str {
        match self.car_type {
            Some(CarType::New) => "New Cars",
            Some(CarType::Used) => "Used Cars",
            None => "Browse Cars",
        }
    }
}
