//! Layout singletons: header, footer and home banner

use serde::{Deserialize, Serialize};

use super::car::Image;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationItem {
    pub label: String,
    pub url: String,
    pub is_highlighted: bool,
    pub open_in_new_tab: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Logo {
    pub uid: String,
    pub url: String,
    pub title: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

/// Site header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderEntry {
    pub uid: String,
    pub title: String,
    pub logo: Option<Logo>,
    pub logo_text: String,
    pub logo_link: String,
    pub navigation: Vec<NavigationItem>,
    pub cta_label: String,
    pub cta_url: String,
    pub show_search: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterLinkSection {
    pub section_title: String,
    pub links: Vec<FooterLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterSocialLink {
    pub platform: String,
    pub url: String,
}

/// Site footer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterEntry {
    pub uid: String,
    pub title: String,
    pub logo: Option<Logo>,
    pub brand_name: String,
    pub tagline: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_address: Option<String>,
    pub link_sections: Vec<FooterLinkSection>,
    pub social_links: Vec<FooterSocialLink>,
    pub copyright_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerCta {
    pub text: String,
    pub url: String,
    /// primary, secondary or outline
    pub style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroBanner {
    pub headline: String,
    pub subheadline: Option<String>,
    pub background_image: Option<Image>,
    pub background_image_url: Option<String>,
    pub overlay_opacity: Option<f64>,
    pub text_color: Option<String>,
    pub primary_cta: Option<BannerCta>,
    pub secondary_cta: Option<BannerCta>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionalBanner {
    pub title: String,
    pub description: Option<String>,
    pub image: Option<Image>,
    pub image_url: Option<String>,
    pub icon: Option<String>,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    pub badge_text: Option<String>,
    pub background_color: Option<String>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopularSearch {
    pub label: String,
    pub search_term: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub show_search: Option<bool>,
    pub search_placeholder: Option<String>,
    pub popular_searches: Vec<PopularSearch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatItem {
    pub value: String,
    pub label: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSection {
    pub show_stats: Option<bool>,
    pub stats: Vec<StatItem>,
}

/// Home page banner configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerEntry {
    pub uid: String,
    pub title: String,
    pub hero_banners: Vec<HeroBanner>,
    pub promotional_banners: Vec<PromotionalBanner>,
    pub search_section: Option<SearchSection>,
    pub stats_section: Option<StatsSection>,
}

impl BannerEntry {
    /// Active hero banners in display order
    ///
    /// Banners without an explicit flag count as active.
    pub fn active_heroes(&self) -> Vec<&HeroBanner> {
        let mut heroes: Vec<&HeroBanner> = self
            .hero_banners
            .iter()
            .filter(|b| b.is_active.unwrap_or(true))
            .collect();
        heroes.sort_by_key(|b| b.display_order.unwrap_or(i32::MAX));
        heroes
    }
}
