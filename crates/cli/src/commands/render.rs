//! Plain-text rendering of list, detail and cart screens.

use std::io::{self, Write};

use pocketshop_core::{Quantity, ViewMode};
use pocketshop_storefront::cart::CartSnapshot;
use pocketshop_storefront::catalog::Product;
use pocketshop_storefront::detail::{DetailState, ProductDetailView};
use pocketshop_storefront::filters::{self, LABEL_PALETTE};
use pocketshop_storefront::listing::ListSnapshot;

const TITLE_WIDTH: usize = 36;

/// Product list: rows, pagination and any notice.
pub fn list(out: &mut impl Write, snapshot: &ListSnapshot) -> io::Result<()> {
    let search = if snapshot.search_input.is_empty() {
        "(all products)"
    } else {
        snapshot.search_input.as_str()
    };
    writeln!(out, "Search: {search}  [{} view]", snapshot.view_mode)?;

    if snapshot.is_initial_loading() {
        writeln!(out, "Loading products...")?;
    }
    if let Some(error) = &snapshot.error {
        writeln!(out, "Error: {error}")?;
        if error.is_retryable() {
            writeln!(out, "Type 'retry' to try again.")?;
        }
    } else if snapshot.is_empty() {
        writeln!(out, "No products found")?;
    }

    for product in &snapshot.products {
        product_row(out, product)?;
    }

    if snapshot.is_loading_more() {
        writeln!(out, "Loading more...")?;
    }
    if snapshot.shows_pagination() {
        writeln!(out, "Page {} of {}", snapshot.page, snapshot.page_count())?;
    } else if let (ViewMode::List, Some(total)) = (snapshot.view_mode, snapshot.total) {
        writeln!(out, "Showing {} of {total}", snapshot.products.len())?;
    }
    if let Some(notice) = snapshot.notice {
        writeln!(out, "{notice}")?;
    }
    Ok(())
}

fn product_row(out: &mut impl Write, product: &Product) -> io::Result<()> {
    writeln!(
        out,
        "{:>5}  {:<width$}  {:>9}  {}  {}",
        product.id,
        truncate(&product.title, TITLE_WIDTH),
        product.unit_price().to_string(),
        filters::rating(product.rating),
        chip(&product.category),
        width = TITLE_WIDTH,
    )
}

/// Product detail screen.
pub fn detail(out: &mut impl Write, view: &ProductDetailView) -> io::Result<()> {
    let product = match view.state() {
        DetailState::Loading => return writeln!(out, "Loading..."),
        DetailState::NotFound(id) => return writeln!(out, "Product {id} not found"),
        DetailState::Failed(error) => return writeln!(out, "Error: {error}"),
        DetailState::Loaded(product) => product,
    };

    writeln!(out, "{} (#{})", product.title, product.id)?;
    let subtitle = product.subtitle();
    if !subtitle.is_empty() {
        writeln!(out, "{subtitle}")?;
    }
    writeln!(
        out,
        "{}  {}  {} in stock",
        product.unit_price(),
        filters::rating(product.rating),
        product.stock
    )?;
    if let Some(status) = &product.availability_status {
        writeln!(out, "{status}")?;
    }
    if !product.description.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", product.description)?;
    }

    writeln!(out)?;
    if let Some(sku) = &product.sku {
        writeln!(out, "SKU: {sku}")?;
    }
    if let Some(weight) = product.weight {
        writeln!(out, "Weight: {weight}g")?;
    }
    if let Some(d) = product.dimensions {
        writeln!(out, "Dimensions: {} x {} x {} cm", d.width, d.height, d.depth)?;
    }
    for info in [
        &product.warranty_information,
        &product.shipping_information,
        &product.return_policy,
    ]
    .into_iter()
    .flatten()
    {
        writeln!(out, "{info}")?;
    }
    if let Some(barcode) = product.meta.as_ref().and_then(|m| m.barcode.as_deref()) {
        writeln!(out, "Barcode: {barcode}")?;
    }

    if !product.reviews.is_empty() {
        writeln!(out)?;
        writeln!(out, "Reviews:")?;
        for review in &product.reviews {
            writeln!(
                out,
                "  {}  {} ({})",
                "★".repeat(usize::from(review.rating.min(5))),
                review.reviewer_name,
                review.date.format("%b %-d, %Y")
            )?;
            writeln!(out, "    {}", review.comment)?;
        }
    }

    writeln!(out)?;
    let quantity = view.quantity();
    writeln!(out, "Quantity: {quantity} (1-{})", Quantity::MAX)?;
    if let Some(total) = view.line_total() {
        writeln!(out, "Total: {total}")?;
    }
    let button = view.button();
    if button.is_enabled() {
        writeln!(out, "[{}] type 'add'", button.label())
    } else {
        writeln!(out, "[{}]", button.label())
    }
}

/// Cart screen.
pub fn cart(out: &mut impl Write, cart: &CartSnapshot) -> io::Result<()> {
    if cart.items.is_empty() {
        return writeln!(out, "Your cart is empty");
    }
    for item in &cart.items {
        writeln!(
            out,
            "{:>5}  {:<width$}  {}",
            item.id(),
            truncate(&item.product.title, TITLE_WIDTH),
            filters::line_summary(item.product.unit_price(), item.quantity, item.line_total()),
            width = TITLE_WIDTH,
        )?;
    }
    writeln!(out, "Total: {}", cart.total)?;
    writeln!(out, "Items: {}", cart.badge_count())
}

/// Category label on a coloured background.
fn chip(label: &str) -> String {
    match filters::color_for_label(label, LABEL_PALETTE).and_then(rgb) {
        Some((r, g, b)) => format!("\x1b[30;48;2;{r};{g};{b}m {label} \x1b[0m"),
        None => format!("[{label}]"),
    }
}

fn rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}
