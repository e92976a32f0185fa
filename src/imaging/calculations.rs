//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit `original` inside a `bound`×`bound` box, preserving aspect ratio.
///
/// Images already inside the box keep their size; the output is never larger
/// than the input. The longer edge lands exactly on `bound` and the shorter
/// edge is rounded, but never below 1px.
///
/// # Examples
/// ```
/// # use travel_atlas::imaging::fit_within;
/// // 4000x3000 landscape into a 300px box → 300x225
/// assert_eq!(fit_within((4000, 3000), 300), (300, 225));
///
/// // Already small enough: unchanged
/// assert_eq!(fit_within((200, 100), 300), (200, 100));
/// ```
pub fn fit_within(original: (u32, u32), bound: u32) -> (u32, u32) {
    let (width, height) = original;
    let bound = bound.max(1);
    if width <= bound && height <= bound {
        return (width, height);
    }

    let scale_edge = |edge: u32, longer: u32| -> u32 {
        ((edge as f64 * bound as f64 / longer as f64).round() as u32).clamp(1, bound)
    };

    if width >= height {
        (bound, scale_edge(height, width))
    } else {
        (scale_edge(width, height), bound)
    }
}
