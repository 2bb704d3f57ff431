//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Dimensions that bring an image down to `max_height`, keeping its aspect ratio.
///
/// Returns `None` when the image already fits, so it can be copied untouched.
/// The width never rounds down to zero.
///
/// # Examples
/// ```
/// # use grimoire::imaging::fit_to_height;
/// // 4000x3000 landscape capped at 1500px tall → 2000x1500
/// assert_eq!(fit_to_height((4000, 3000), 1500), Some((2000, 1500)));
///
/// // Already short enough
/// assert_eq!(fit_to_height((800, 600), 1500), None);
/// ```
pub fn fit_to_height(original: (u32, u32), max_height: u32) -> Option<(u32, u32)> {
    let (orig_w, orig_h) = original;
    if orig_h <= max_height || orig_h == 0 || max_height == 0 {
        return None;
    }
    let ratio = max_height as f64 / orig_h as f64;
    let width = ((orig_w as f64 * ratio).round() as u32).max(1);
    Some((width, max_height))
}
