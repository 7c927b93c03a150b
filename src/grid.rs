//! Uniform marker lattice seeding the watershed flood.
//!
//! Marker spacing derives from image size and a 1-20 detail level; higher
//! detail gives denser markers and therefore smaller regions. A fixed
//! budget caps the marker count: when exceeded, spacing is scaled up until
//! the grid fits, keeping the whole image covered rather than dropping
//! markers.

use tracing::debug;

/// Upper bound on markers per segmentation run.
pub const MARKER_BUDGET: usize = 5000;

/// Spacing never drops below this, whatever the detail level.
pub const MIN_SPACING: usize = 10;

/// Valid detail range; values outside are clamped.
pub const DETAIL_RANGE: (u32, u32) = (1, 20);

/// A seed pixel with its flood label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Marker {
    pub x: usize,
    pub y: usize,
    /// Unique label, 1-based, assigned in row-major grid order.
    pub label: i32,
}

/// Compute the marker spacing for an image and detail level.
///
/// Detail is clamped to 1..=20. The multiplier decreases monotonically in
/// detail (1.3 at detail 1 down to 0.6 at detail 20), so spacing strictly
/// decreases as detail rises until the floor cuts in.
pub fn marker_spacing(width: usize, height: usize, detail: u32) -> usize {
    let detail = detail.clamp(DETAIL_RANGE.0, DETAIL_RANGE.1);
    let max_region_size = width.min(height) as f32 / 20.0;
    let base_spacing = max_region_size * 0.7;
    let multiplier = 1.3 - (detail - 1) as f32 * (0.7 / 19.0);
    let spacing = (base_spacing * multiplier).floor() as usize;
    spacing.max(MIN_SPACING)
}

/// Markers per axis for a given spacing. The grid is inset by half a
/// spacing so markers sit at cell centers.
fn axis_count(dim: usize, spacing: usize) -> usize {
    let offset = spacing / 2;
    if dim <= offset {
        return 1;
    }
    (dim - offset) / spacing + 1
}

/// Place the marker lattice for one segmentation run.
///
/// # Arguments
/// * `width`, `height` - Processing image dimensions (non-zero)
/// * `detail` - Detail level, clamped to 1..=20
///
/// # Returns
/// Row-major ordered markers with labels `1..=n`, `n <= MARKER_BUDGET`.
pub fn place_markers(width: usize, height: usize, detail: u32) -> Vec<Marker> {
    let mut spacing = marker_spacing(width, height, detail);

    // Scale spacing up until the grid fits the budget. Never drops markers:
    // the coarser grid still spans the full image.
    loop {
        let count = axis_count(width, spacing) * axis_count(height, spacing);
        if count <= MARKER_BUDGET {
            break;
        }
        let scale = (count as f32 / MARKER_BUDGET as f32).sqrt();
        let grown = ((spacing as f32) * scale).ceil() as usize;
        // Guard against a stuck loop on pathological rounding
        spacing = grown.max(spacing + 1);
    }

    let offset = spacing / 2;
    let cols = axis_count(width, spacing);
    let rows = axis_count(height, spacing);

    let mut markers = Vec::with_capacity(cols * rows);
    let mut label = 1i32;
    for row in 0..rows {
        let y = (offset + row * spacing).min(height - 1);
        for col in 0..cols {
            let x = (offset + col * spacing).min(width - 1);
            markers.push(Marker { x, y, label });
            label += 1;
        }
    }

    debug!(cols, rows, spacing, "placed marker grid");
    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spacing_monotonically_decreases_with_detail() {
        let mut prev = usize::MAX;
        for detail in 1..=20 {
            let s = marker_spacing(4000, 3000, detail);
            assert!(s <= prev, "spacing must not increase with detail");
            if prev > MIN_SPACING {
                assert!(s < prev || prev == usize::MAX, "spacing must strictly decrease above the floor");
            }
            prev = s;
        }
    }

    #[test]
    fn test_spacing_respects_floor() {
        for detail in 1..=20 {
            assert!(marker_spacing(300, 200, detail) >= MIN_SPACING);
        }
        // Tiny image where the formula would go below 10
        assert_eq!(marker_spacing(40, 40, 20), MIN_SPACING);
    }

    #[test]
    fn test_detail_clamped() {
        assert_eq!(marker_spacing(1000, 1000, 0), marker_spacing(1000, 1000, 1));
        assert_eq!(marker_spacing(1000, 1000, 99), marker_spacing(1000, 1000, 20));
    }

    #[test]
    fn test_budget_never_exceeded() {
        // Large image + max detail would want far more than 5000 markers
        for &(w, h) in &[(8000usize, 6000usize), (4096, 4096), (10000, 1000), (640, 480)] {
            let markers = place_markers(w, h, 20);
            assert!(markers.len() <= MARKER_BUDGET, "{}x{} produced {}", w, h, markers.len());
            assert!(!markers.is_empty());
        }
    }

    #[test]
    fn test_markers_in_bounds_with_unique_labels() {
        let markers = place_markers(357, 241, 15);
        let mut seen = std::collections::HashSet::new();
        for (i, m) in markers.iter().enumerate() {
            assert!(m.x < 357 && m.y < 241);
            assert_eq!(m.label, i as i32 + 1);
            assert!(seen.insert((m.x, m.y)), "duplicate marker position");
        }
    }

    #[test]
    fn test_tiny_image_gets_at_least_one_marker() {
        let markers = place_markers(5, 5, 10);
        assert!(!markers.is_empty());
        assert_eq!(markers[0].label, 1);
    }
}
