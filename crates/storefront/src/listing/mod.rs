//! Product list coordination: search, pagination and infinite loading.
//!
//! [`ListCoordinator`] is the synchronous state machine. It never performs
//! I/O itself; it hands out [`RequestTicket`]s describing what to fetch and
//! accepts completions back. [`session`] wraps it in a Tokio task together
//! with the search debouncer and the catalog source.
//!
//! # Rules
//!
//! - Only the debounced search term takes part in the query key; the raw
//!   input is kept for display.
//! - A new search term or a view mode switch resets the page to 1.
//! - Grid mode replaces the list with each page; list mode appends pages
//!   after the first, writing each page over its own `skip` offset.
//! - A failed fetch or a missing page empties the list.
//! - Fetch data only ever describes the query in flight or just finished,
//!   so page bounds are unknown while a request is loading.

pub mod session;

use pocketshop_core::{ProductId, ViewMode};
use thiserror::Error;
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::catalog::{Product, ProductPage, SearchQuery};
use crate::error::FetchError;
use crate::navigation::Intent;
use crate::resource::{Completion, FetchResource, RequestTicket, Resolution};

pub use session::{ListCommand, ListHandle, SessionClosed};

/// A one-shot message shown to the reader until it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The reader reached the end and every matching product is loaded.
    NoMoreItems,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMoreItems => write!(f, "No more items"),
        }
    }
}

/// Outcome of a "near end" signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NearEnd {
    /// The next page was requested.
    LoadMore(RequestTicket<SearchQuery>),
    /// Everything is loaded; a [`Notice::NoMoreItems`] was raised.
    Exhausted,
    /// The signal does not apply right now (grid mode, loading, or no data).
    Ignored,
}

/// Rejected page navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageError {
    /// Page navigation only exists in grid mode.
    #[error("page navigation is only available in grid view")]
    NotGridView,
    /// The page count is unknown until the current request finishes.
    #[error("products are still loading")]
    Loading,
    /// The page is outside `1..=pages`.
    #[error("page {page} is out of range (1-{pages})")]
    OutOfRange {
        /// Requested page.
        page: u32,
        /// Number of available pages.
        pages: u32,
    },
}

/// Everything a view needs to render the list, captured at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    /// Search box contents, updated immediately.
    pub search_input: String,
    /// Debounced term used for fetching.
    pub search_term: String,
    pub page: u32,
    pub limit: u32,
    pub view_mode: ViewMode,
    /// Products to display (one page in grid mode, accumulated in list mode).
    pub products: Vec<Product>,
    /// Total matches for the current query, once it has loaded.
    pub total: Option<u32>,
    pub loading: bool,
    pub error: Option<FetchError>,
    pub notice: Option<Notice>,
}

impl ListSnapshot {
    /// First-page spinner.
    #[must_use]
    pub const fn is_initial_loading(&self) -> bool {
        self.loading && self.page == 1
    }

    /// Spinner under an infinite list.
    #[must_use]
    pub const fn is_loading_more(&self) -> bool {
        self.loading && self.page > 1
    }

    /// Empty-state message ("No products found").
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.loading && self.products.is_empty()
    }

    /// Number of grid pages.
    #[must_use]
    pub const fn page_count(&self) -> u32 {
        match self.total {
            Some(total) if self.limit > 0 => total.div_ceil(self.limit),
            _ => 0,
        }
    }

    /// Whether the grid pagination control is shown.
    #[must_use]
    pub fn shows_pagination(&self) -> bool {
        self.view_mode == ViewMode::Grid && self.total.is_some_and(|total| total > self.limit)
    }

    /// Navigation intent for selecting a product card.
    #[must_use]
    pub const fn open(&self, id: ProductId) -> Intent {
        Intent::Product(id)
    }
}

/// Search, paging and accumulation state for one list view session.
#[derive(Debug)]
pub struct ListCoordinator {
    limit: u32,
    search_input: String,
    search_term: String,
    page: u32,
    view_mode: ViewMode,
    products: Vec<Product>,
    fetch: FetchResource<SearchQuery, ProductPage>,
    notice: Option<(Notice, Instant)>,
    notice_ttl: Duration,
}

impl ListCoordinator {
    /// A fresh session: empty search, page 1, grid view.
    #[must_use]
    pub fn new(limit: u32, notice_ttl: Duration) -> Self {
        Self {
            limit: limit.max(1),
            search_input: String::new(),
            search_term: String::new(),
            page: 1,
            view_mode: ViewMode::default(),
            products: Vec::new(),
            fetch: FetchResource::new(),
            notice: None,
            notice_ttl,
        }
    }

    /// Query key for the current state.
    #[must_use]
    pub fn query(&self) -> SearchQuery {
        SearchQuery::new(self.search_term.clone(), self.page, self.limit)
    }

    /// Request the current query if it differs from the last one issued.
    pub fn sync(&mut self) -> Option<RequestTicket<SearchQuery>> {
        let query = self.query();
        self.fetch.request(query)
    }

    /// Re-issue the current query, e.g. after an error.
    ///
    /// In list view the accumulated products must reach the current page's
    /// offset. When they do not (an error emptied the list) the list starts
    /// over at page 1.
    pub fn retry(&mut self) -> RequestTicket<SearchQuery> {
        if self.view_mode == ViewMode::List && self.products.len() < self.offset() {
            debug!(page = self.page, "Restarting list from page 1");
            self.page = 1;
        }
        let query = self.query();
        self.fetch.refetch(query)
    }

    fn offset(&self) -> usize {
        usize::try_from(self.query().skip()).unwrap_or(usize::MAX)
    }

    /// Record what the user typed. Does not fetch.
    pub fn set_search_input(&mut self, text: impl Into<String>) {
        self.search_input = text.into();
    }

    /// Apply a settled (debounced) search term.
    ///
    /// A changed term resets the page to 1 and returns the request to issue.
    pub fn apply_search_term(&mut self, term: impl Into<String>) -> Option<RequestTicket<SearchQuery>> {
        let term = term.into();
        if term != self.search_term {
            debug!(term = %term, "Search term settled");
            self.search_term = term;
            self.page = 1;
        }
        self.sync()
    }

    /// Switch between grid and list views.
    ///
    /// Switching always starts over at page 1 with a fresh request, so a
    /// response still in flight for the previous mode can never be merged
    /// into the new mode's list.
    pub fn set_view_mode(&mut self, mode: ViewMode) -> Option<RequestTicket<SearchQuery>> {
        if mode == self.view_mode {
            return None;
        }
        debug!(from = %self.view_mode, to = %mode, "View mode changed");
        self.view_mode = mode;
        self.page = 1;
        self.products.clear();
        self.notice = None;
        Some(self.retry())
    }

    /// Jump to a grid page.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] outside grid view, while a request is loading,
    /// or when `page` is not in `1..=page_count`.
    pub fn go_to_page(&mut self, page: u32) -> Result<Option<RequestTicket<SearchQuery>>, PageError> {
        if self.view_mode != ViewMode::Grid {
            return Err(PageError::NotGridView);
        }
        if self.is_loading() {
            return Err(PageError::Loading);
        }
        let pages = self.page_count();
        if page == 0 || page > pages {
            return Err(PageError::OutOfRange { page, pages });
        }
        self.page = page;
        Ok(self.sync())
    }

    /// The view reports that the reader is near the end of the list.
    ///
    /// Edge-triggered: call once per boundary crossing. `now` stamps the
    /// notice when everything is already loaded.
    pub fn near_end(&mut self, now: Instant) -> NearEnd {
        if self.view_mode != ViewMode::List {
            return NearEnd::Ignored;
        }
        let state = self.fetch.state();
        if state.loading {
            return NearEnd::Ignored;
        }
        let Some(data) = state.data.as_ref() else {
            return NearEnd::Ignored;
        };

        let total = usize::try_from(data.total).unwrap_or(usize::MAX);
        if self.products.len() < total {
            self.page += 1;
            debug!(page = self.page, "Loading next page");
            match self.sync() {
                Some(ticket) => NearEnd::LoadMore(ticket),
                None => NearEnd::Ignored,
            }
        } else {
            self.notice = Some((Notice::NoMoreItems, now + self.notice_ttl));
            NearEnd::Exhausted
        }
    }

    /// Apply a finished fetch. Stale completions are ignored.
    pub fn apply(&mut self, completion: Completion<SearchQuery, ProductPage>) -> Resolution {
        let Completion { ticket, result } = completion;
        let resolution = self.fetch.resolve(&ticket, result);
        if resolution == Resolution::Stale {
            return resolution;
        }

        match self.fetch.state().data.as_ref() {
            Some(page) => {
                if self.view_mode == ViewMode::List && ticket.key().page() > 1 {
                    let offset = usize::try_from(ticket.key().skip()).unwrap_or(usize::MAX);
                    self.products.truncate(offset);
                    self.products.extend(page.products.iter().cloned());
                } else {
                    self.products.clone_from(&page.products);
                }
            }
            None => self.products.clear(),
        }
        resolution
    }

    /// Deadline of the visible notice, if any.
    #[must_use]
    pub fn notice_deadline(&self) -> Option<Instant> {
        self.notice.map(|(_, deadline)| deadline)
    }

    /// Drop the notice if it has expired by `now`.
    pub fn expire_notice(&mut self, now: Instant) {
        if self.notice.is_some_and(|(_, deadline)| deadline <= now) {
            self.notice = None;
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.fetch.state().loading
    }

    /// Number of grid pages for the current query, 0 while it loads.
    #[must_use]
    pub fn page_count(&self) -> u32 {
        self.fetch
            .state()
            .data
            .as_ref()
            .map_or(0, |page| page.page_count(self.limit))
    }

    /// Capture the current state for rendering.
    #[must_use]
    pub fn snapshot(&self) -> ListSnapshot {
        let state = self.fetch.state();
        ListSnapshot {
            search_input: self.search_input.clone(),
            search_term: self.search_term.clone(),
            page: self.page,
            limit: self.limit,
            view_mode: self.view_mode,
            products: self.products.clone(),
            total: state.data.as_ref().map(|page| page.total),
            loading: state.loading,
            error: state.error.clone(),
            notice: self.notice.map(|(notice, _)| notice),
        }
    }
}
