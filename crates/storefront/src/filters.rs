//! Display helpers shared by views.

use pocketshop_core::Price;

/// Chip background colours, picked per label by [`color_for_label`].
pub const LABEL_PALETTE: &[&str] = &[
    "#e57373", "#f06292", "#ba68c8", "#7986cb", "#4fc3f7", "#4db6ac", "#81c784", "#ffb74d",
];

/// Deterministic colour for a label.
///
/// Folds the label's UTF-16 code units with `hash = c + (hash << 5) - hash`
/// and picks `|hash| % palette.len()`. Only the shift is done in 32 bits
/// (on the low 32 bits of the running hash); the sum is kept wide, so
/// `"smartphones"` hashes to `-3_966_448_690`. Returns `None` for an empty
/// palette.
#[must_use]
pub fn color_for_label<'a>(label: &str, palette: &[&'a str]) -> Option<&'a str> {
    let len = u64::try_from(palette.len()).ok().filter(|&len| len > 0)?;
    let hash = label_hash(label);
    let index = usize::try_from(hash.unsigned_abs() % len).ok()?;
    palette.get(index).copied()
}

#[allow(clippy::cast_possible_truncation)]
fn label_hash(label: &str) -> i64 {
    label.encode_utf16().fold(0_i64, |hash, c| {
        let shifted = i64::from((hash as i32).wrapping_shl(5));
        i64::from(c).wrapping_add(shifted).wrapping_sub(hash)
    })
}

/// "$12.00 × 3 = $36.00"
#[must_use]
pub fn line_summary(unit: Price, quantity: impl std::fmt::Display, total: Price) -> String {
    format!("{unit} × {quantity} = {total}")
}

/// Star rating to one decimal, e.g. "★ 4.9".
#[must_use]
pub fn rating(value: f64) -> String {
    format!("★ {value:.1}")
}
