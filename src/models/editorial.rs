//! Editorial models: reviews and news

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::car::Image;

/// Per-aspect ratings out of five
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingBreakdown {
    pub performance: Option<f64>,
    pub comfort: Option<f64>,
    pub features: Option<f64>,
    pub safety: Option<f64>,
    pub value_for_money: Option<f64>,
}

/// A car review
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewEntry {
    pub uid: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub locale: String,
    pub slug: String,
    pub car_name: String,
    pub car_brand: String,
    /// Expert Review, First Drive, Long Term Review, Comparison, User Review
    pub review_type: String,
    pub author_name: String,
    pub author_designation: Option<String>,
    pub author_image: Option<Image>,
    pub publish_date: String,
    pub rating: f64,
    pub rating_breakdown: Option<RatingBreakdown>,
    pub excerpt: String,
    pub content: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub verdict: Option<String>,
    pub thumbnail: Option<Image>,
    pub images: Vec<Image>,
    pub video_url: Option<String>,
    pub read_time: Option<u32>,
    pub is_featured: Option<bool>,
    pub is_editors_pick: Option<bool>,
    pub review_tags: Vec<String>,
}

/// Review types offered by the reviews page filter
pub const REVIEW_TYPES: &[&str] = &[
    "Expert Review",
    "First Drive",
    "Long Term Review",
    "Comparison",
    "User Review",
];

/// News category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewsCategory {
    Launch,
    Upcoming,
    Electric,
    Industry,
    Technology,
    Policy,
    Motorsport,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 7] = [
        NewsCategory::Launch,
        NewsCategory::Upcoming,
        NewsCategory::Electric,
        NewsCategory::Industry,
        NewsCategory::Technology,
        NewsCategory::Policy,
        NewsCategory::Motorsport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::Launch => "Launch",
            NewsCategory::Upcoming => "Upcoming",
            NewsCategory::Electric => "Electric",
            NewsCategory::Industry => "Industry",
            NewsCategory::Technology => "Technology",
            NewsCategory::Policy => "Policy",
            NewsCategory::Motorsport => "Motorsport",
        }
    }
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NewsCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("Invalid news category: {}", s))
    }
}

/// A news article
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsEntry {
    pub uid: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub locale: String,
    pub slug: String,
    pub category: Option<NewsCategory>,
    pub author_name: String,
    pub publish_date: String,
    pub excerpt: String,
    pub content: String,
    pub thumbnail: Option<Image>,
    pub images: Vec<Image>,
    pub related_brand: Option<String>,
    pub related_model: Option<String>,
    pub read_time: Option<u32>,
    pub is_featured: Option<bool>,
    pub is_breaking: Option<bool>,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
    pub news_tags: Vec<String>,
}

impl NewsEntry {
    pub fn is_featured(&self) -> bool {
        self.is_featured.unwrap_or(false)
    }

    pub fn is_breaking(&self) -> bool {
        self.is_breaking.unwrap_or(false)
    }
}
