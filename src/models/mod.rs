//! Data models
//!
//! This module contains the data structures shared across the storefront:
//! - Catalog entries delivered by the CMS (car, variant, review, news, layout)
//! - Backend records (profile, interests, test drives, auth verification)
//! - The signed-in session user

mod account;
mod car;
mod editorial;
mod layout;
mod session;

pub use account::{
    AuthVerifyResponse, CreateInterestRequest, CreateTestDriveRequest, Interest, TestDrive,
    TestDriveStatus, UpdateProfileRequest, UserProfile,
};
pub use car::{
    CarEntry, CarSpecifications, CarType, CarVariant, EntryReference, Image, TaxonomyItem,
    TaxonomyReference, DEFAULT_CAR_OWNER,
};
pub use editorial::{NewsCategory, NewsEntry, RatingBreakdown, ReviewEntry, REVIEW_TYPES};
pub use layout::{
    BannerCta, BannerEntry, FooterEntry, FooterLink, FooterLinkSection, FooterSocialLink,
    HeaderEntry, HeroBanner, Logo, NavigationItem, PopularSearch, PromotionalBanner,
    SearchSection, StatItem, StatsSection,
};
pub use session::SessionUser;
