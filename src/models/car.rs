//! Car catalog models
//!
//! Entries of the `car` and `car_variant_specs` content types. The CMS owns
//! the authoritative shape, so every field the storefront does not strictly
//! need is optional and unknown fields are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Asset reference as delivered by the CMS
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub uid: String,
    pub url: String,
    pub title: String,
    pub filename: String,
}

/// Taxonomy term attached to an entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyReference {
    pub taxonomy_uid: String,
    pub term_uid: String,
}

/// Term of a taxonomy (brands, cities, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyItem {
    pub uid: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// Dimensions and capacities, all in metric units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarSpecifications {
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub wheelbase: Option<f64>,
    pub ground_clearance: Option<f64>,
    pub boot_space: Option<f64>,
    pub fuel_tank_capacity: Option<f64>,
    pub kerb_weight: Option<f64>,
}

/// New or pre-owned listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarType {
    New,
    Used,
}

impl fmt::Display for CarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarType::New => write!(f, "new"),
            CarType::Used => write!(f, "used"),
        }
    }
}

impl FromStr for CarType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(CarType::New),
            "used" => Ok(CarType::Used),
            _ => Err(anyhow::anyhow!("Invalid car type: {}", s)),
        }
    }
}

/// A car listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarEntry {
    pub uid: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub locale: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub taxonomies: Vec<TaxonomyReference>,
    pub slug: Option<String>,
    pub brand: String,
    pub model: String,
    pub variant: Option<String>,
    pub year: i32,
    pub price: f64,
    pub ex_showroom_price: Option<f64>,
    pub fuel_type: String,
    pub transmission: String,
    pub body_type: String,
    pub seating_capacity: u32,
    pub mileage: Option<String>,
    pub engine_capacity: Option<String>,
    pub max_power: Option<String>,
    pub max_torque: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub images: Vec<Image>,
    pub thumbnail: Option<Image>,
    pub colors: Vec<String>,
    pub features: Vec<String>,
    pub safety_features: Vec<String>,
    pub city: Option<String>,
    pub is_new: Option<bool>,
    pub is_featured: Option<bool>,
    pub car_type: Option<CarType>,
    pub dealer_name: Option<String>,
    pub dealer_contact: Option<String>,
    // Used car specific fields
    pub odometer_reading: Option<u64>,
    pub ownership: Option<String>,
    pub ownership_history: Option<String>,
    pub registration_number: Option<String>,
    pub rto_city_display: Option<String>,
    pub registration_year: Option<i32>,
    pub insurance_valid_till: Option<String>,
    pub specifications: Option<CarSpecifications>,
}

impl CarEntry {
    /// Party that receives interests and test drives for this car
    pub fn owner(&self) -> &str {
        match self.dealer_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => DEFAULT_CAR_OWNER,
        }
    }

    /// Slug when present, uid otherwise
    pub fn route_id(&self) -> &str {
        match self.slug.as_deref() {
            Some(slug) if !slug.is_empty() => slug,
            _ => &self.uid,
        }
    }

    pub fn is_featured(&self) -> bool {
        self.is_featured.unwrap_or(false)
    }
}

/// Owner used when a listing carries no dealer
pub const DEFAULT_CAR_OWNER: &str = "autostack";

/// Reference to another entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryReference {
    pub uid: String,
}

/// Variant specification of a car
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarVariant {
    pub uid: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub locale: String,
    pub car_reference: Vec<EntryReference>,
    pub variant_name: String,
    pub price: f64,
    pub fuel_type: String,
    pub transmission: String,
    pub engine_capacity: String,
    pub max_power: String,
    pub max_torque: String,
    pub mileage: String,
    pub features: Vec<String>,
}
