//! One-shot product detail.

use std::io::Write;

use pocketshop_core::ProductId;
use pocketshop_storefront::detail::DetailState;
use pocketshop_storefront::state::AppState;

use super::render;

/// Print a product's detail screen.
///
/// # Errors
///
/// Returns an error if the product does not exist, the fetch fails, or
/// stdout cannot be written.
pub async fn run(state: &AppState, id: ProductId) -> Result<(), Box<dyn std::error::Error>> {
    let view = state.product_detail(id).await;

    let mut out = std::io::stdout().lock();
    render::detail(&mut out, &view)?;
    out.flush()?;

    match view.state() {
        DetailState::NotFound(id) => Err(format!("product {id} not found").into()),
        DetailState::Failed(error) => Err(error.clone().into()),
        DetailState::Loading | DetailState::Loaded(_) => Ok(()),
    }
}
