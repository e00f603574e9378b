//! Listing state shared by the car, review and news pages

use serde::Serialize;
use std::future::Future;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use crate::content::{Fetched, Page, RequestSequence};

/// Highest page number a listing accepts
pub const MAX_PAGE: u32 = 10_000;

/// Items to skip to reach `page` (1-based; 0 counts as 1)
pub fn page_offset(page: u32, per_page: u32) -> u32 {
    page.max(1).saturating_sub(1).saturating_mul(per_page)
}

/// Pages needed for `total` items
pub fn total_pages(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(u64::from(per_page)) as u32
}

/// Page buttons to show: the first five pages, then the last one
pub fn pagination_window(total_pages: u32) -> Vec<u32> {
    let mut pages: Vec<u32> = (1..=total_pages.min(5)).collect();
    if total_pages > 5 {
        pages.push(total_pages);
    }
    pages
}

/// What a listing currently shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingState<T> {
    pub loading: bool,
    /// Outcome of the latest applied load, `None` before the first one
    pub result: Option<Fetched<Page<T>>>,
}

impl<T> Default for ListingState<T> {
    fn default() -> Self {
        Self {
            loading: false,
            result: None,
        }
    }
}

/// Results of a listing page
///
/// Loads may overlap when the visitor changes filters quickly; only the
/// most recently started one is applied.
#[derive(Debug)]
pub struct Listing<T> {
    sequence: RequestSequence,
    state: RwLock<ListingState<T>>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            sequence: RequestSequence::new(),
            state: RwLock::new(ListingState::default()),
        }
    }
}

impl<T: Clone> Listing<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fetch` and apply its outcome if no newer load started meanwhile
    ///
    /// Returns whether the outcome was applied.
    pub async fn load<F>(&self, fetch: F) -> bool
    where
        F: Future<Output = Fetched<Page<T>>>,
    {
        let ticket = self.sequence.issue();
        self.state.write().unwrap_or_else(PoisonError::into_inner).loading = true;

        let outcome = fetch.await;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !self.sequence.is_current(ticket) {
            debug!("Discarding stale listing result {:?}", ticket);
            return false;
        }
        state.loading = false;
        state.result = Some(outcome);
        true
    }

    pub fn state(&self) -> ListingState<T> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().unwrap_or_else(PoisonError::into_inner).loading
    }

    /// Items of the applied page, empty for every other outcome
    pub fn items(&self) -> Vec<T> {
        match &self.state.read().unwrap_or_else(PoisonError::into_inner).result {
            Some(Fetched::Ready(page)) => page.items().to_vec(),
            _ => Vec::new(),
        }
    }

    /// Total matches of the applied page
    pub fn total(&self) -> u64 {
        match &self.state.read().unwrap_or_else(PoisonError::into_inner).result {
            Some(Fetched::Ready(page)) => page.total(),
            _ => 0,
        }
    }
}
