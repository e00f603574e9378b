//! Review and news listing pages

use serde::{Deserialize, Serialize};

use super::listing::{page_offset, pagination_window, total_pages};
use crate::content::{NewsParams, NewsSort, ReviewParams, ReviewSort};
use crate::models::{NewsCategory, NewsEntry, ReviewEntry};

pub const REVIEWS_PER_PAGE: u32 = 12;
/// News is loaded in one batch and narrowed in place
pub const NEWS_PAGE_SIZE: u32 = 50;
const FEATURED_NEWS_SLOTS: usize = 3;

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Filters of the reviews page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewFilters {
    pub review_type: Option<String>,
    pub brand: Option<String>,
    pub sort: ReviewSort,
    pub page: u32,
    pub search: String,
}

impl Default for ReviewFilters {
    fn default() -> Self {
        Self {
            review_type: None,
            brand: None,
            sort: ReviewSort::Newest,
            page: 1,
            search: String::new(),
        }
    }
}

impl ReviewFilters {
    pub fn to_params(&self) -> ReviewParams {
        ReviewParams {
            review_type: self.review_type.clone(),
            car_brand: self.brand.clone(),
            sort: self.sort,
            limit: REVIEWS_PER_PAGE,
            skip: page_offset(self.page, REVIEWS_PER_PAGE),
            ..ReviewParams::default()
        }
    }

    pub fn has_active_filters(&self) -> bool {
        self.review_type.is_some() || self.brand.is_some()
    }

    pub fn clear_filters(&mut self) {
        self.review_type = None;
        self.brand = None;
        self.sort = ReviewSort::Newest;
        self.page = 1;
    }

    pub fn total_pages(&self, total: u64) -> u32 {
        total_pages(total, REVIEWS_PER_PAGE)
    }

    pub fn pagination(&self, total: u64) -> Vec<u32> {
        pagination_window(self.total_pages(total))
    }

    /// Reviews matching the search box by title, car name or brand
    pub fn visible<'a>(&self, reviews: &'a [ReviewEntry]) -> Vec<&'a ReviewEntry> {
        let needle = self.search.trim().to_lowercase();
        reviews
            .iter()
            .filter(|r| {
                needle.is_empty()
                    || contains(&r.title, &needle)
                    || contains(&r.car_name, &needle)
                    || contains(&r.car_brand, &needle)
            })
            .collect()
    }
}

/// Filters of the news page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsFilters {
    /// `None` shows every category
    pub category: Option<NewsCategory>,
    pub search: String,
}

/// News split into the blocks of the news page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewsSections {
    /// Up to three featured articles
    pub featured: Vec<NewsEntry>,
    /// Everything not featured above
    pub regular: Vec<NewsEntry>,
    /// First breaking article, shown as a ticker
    pub breaking: Option<NewsEntry>,
}

impl NewsFilters {
    pub fn to_params(&self) -> NewsParams {
        NewsParams {
            category: self.category,
            sort: NewsSort::Newest,
            limit: NEWS_PAGE_SIZE,
            ..NewsParams::default()
        }
    }

    /// Articles matching the search box by title, excerpt, brand or model
    pub fn visible<'a>(&self, news: &'a [NewsEntry]) -> Vec<&'a NewsEntry> {
        let needle = self.search.trim().to_lowercase();
        news.iter()
            .filter(|n| {
                needle.is_empty()
                    || contains(&n.title, &needle)
                    || contains(&n.excerpt, &needle)
                    || n.related_brand.as_deref().is_some_and(|b| contains(b, &needle))
                    || n.related_model.as_deref().is_some_and(|m| contains(m, &needle))
            })
            .collect()
    }

    pub fn sections(&self, news: &[NewsEntry]) -> NewsSections {
        let visible = self.visible(news);
        let featured: Vec<NewsEntry> = visible
            .iter()
            .filter(|n| n.is_featured())
            .take(FEATURED_NEWS_SLOTS)
            .map(|n| (*n).clone())
            .collect();
        let regular = visible
            .iter()
            .filter(|n| !featured.iter().any(|f| f.uid == n.uid))
            .map(|n| (*n).clone())
            .collect();
        let breaking = visible.iter().find(|n| n.is_breaking()).map(|n| (*n).clone());
        NewsSections {
            featured,
            regular,
            breaking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(title: &str, car_name: &str, brand: &str) -> ReviewEntry {
        ReviewEntry {
            uid: title.to_string(),
            title: title.to_string(),
            car_name: car_name.to_string(),
            car_brand: brand.to_string(),
            ..ReviewEntry::default()
        }
    }

    fn news(uid: &str, featured: bool, breaking: bool) -> NewsEntry {
        NewsEntry {
            uid: uid.to_string(),
            title: format!("Story {}", uid),
            is_featured: Some(featured),
            is_breaking: Some(breaking),
            ..NewsEntry::default()
        }
    }

    #[test]
    fn test_review_filters() {
        let mut filters = ReviewFilters {
            review_type: Some("First Drive".to_string()),
            page: 2,
            sort: ReviewSort::RatingLow,
            ..ReviewFilters::default()
        };
        let params = filters.to_params();
        assert_eq!(params.skip, 12);
        assert_eq!(params.review_type.as_deref(), Some("First Drive"));
        assert!(filters.has_active_filters());

        filters.clear_filters();
        assert_eq!(filters, ReviewFilters::default());
        assert_eq!(filters.pagination(30), vec![1, 2, 3]);
    }

    #[test]
    fn test_review_search() {
        let reviews = vec![
            review("Nexon long term", "Tata Nexon", "Tata"),
            review("Creta first drive", "Hyundai Creta", "Hyundai"),
        ];
        let filters = ReviewFilters {
            search: "hyundai".to_string(),
            ..ReviewFilters::default()
        };
        let visible = filters.visible(&reviews);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].car_name, "Hyundai Creta");
    }

    #[test]
    fn test_news_sections() {
        let items = vec![
            news("a", true, false),
            news("b", false, true),
            news("c", true, false),
            news("d", true, true),
            news("e", true, false),
        ];
        let sections = NewsFilters::default().sections(&items);
        let uids = |v: &[NewsEntry]| v.iter().map(|n| n.uid.clone()).collect::<Vec<_>>();
        assert_eq!(uids(&sections.featured), vec!["a", "c", "d"]);
        assert_eq!(uids(&sections.regular), vec!["b", "e"]);
        assert_eq!(sections.breaking.map(|n| n.uid), Some("b".to_string()));
    }

    #[test]
    fn test_news_search_and_params() {
        let mut ev = news("ev", false, false);
        ev.related_model = Some("Sierra EV".to_string());
        let items = vec![ev, news("other", false, false)];
        let filters = NewsFilters {
            category: Some(NewsCategory::Electric),
            search: "sierra".to_string(),
        };
        assert_eq!(filters.visible(&items).len(), 1);

        let params = filters.to_params();
        assert_eq!(params.limit, 50);
        assert_eq!(params.category, Some(NewsCategory::Electric));
        assert_eq!(params.search, None);
    }
}
