//! One-shot catalog search.

use std::io::Write;

use pocketshop_core::ViewMode;
use pocketshop_storefront::catalog::{ProductSource, SearchQuery};
use pocketshop_storefront::listing::{ListCoordinator, NearEnd};
use pocketshop_storefront::resource::{Completion, RequestTicket};
use pocketshop_storefront::state::AppState;
use tokio::time::Instant;
use tracing::{info, instrument};

use super::render;

/// Print one page of results for `term`.
///
/// In list view, pages `1..=page` are fetched one after another and shown
/// together, the same way scrolling would accumulate them.
///
/// # Errors
///
/// Returns an error if the page is out of range, the fetch fails, or stdout
/// cannot be written.
#[instrument(skip(state))]
pub async fn run(
    state: &AppState,
    term: &str,
    view: ViewMode,
    page: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let listing = state.config().listing;
    let mut list = ListCoordinator::new(listing.page_limit, listing.notice_ttl);

    // The term is used as-is; there is nothing to debounce.
    list.set_search_input(term);
    let mut ticket = list.apply_search_term(term);
    if let Some(refetch) = list.set_view_mode(view) {
        ticket = Some(refetch);
    }
    fetch(state, &mut list, ticket).await;

    while list.page() < page && list.snapshot().error.is_none() {
        let next = match view {
            ViewMode::Grid => list.go_to_page(page)?,
            ViewMode::List => match list.near_end(Instant::now()) {
                NearEnd::LoadMore(ticket) => Some(ticket),
                NearEnd::Exhausted | NearEnd::Ignored => break,
            },
        };
        if next.is_none() {
            break;
        }
        fetch(state, &mut list, next).await;
    }

    let snapshot = list.snapshot();
    info!(
        products = snapshot.products.len(),
        total = ?snapshot.total,
        "Search complete"
    );

    let mut out = std::io::stdout().lock();
    render::list(&mut out, &snapshot)?;
    out.flush()?;

    match snapshot.error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

async fn fetch(
    state: &AppState,
    list: &mut ListCoordinator,
    ticket: Option<RequestTicket<SearchQuery>>,
) {
    if let Some(ticket) = ticket {
        let result = state.catalog().search(ticket.key()).await;
        list.apply(Completion { ticket, result });
    }
}
