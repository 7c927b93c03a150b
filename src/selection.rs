//! Selection primitives over a segmented region list.
//!
//! Hit-testing and similarity flooding are pure reads apart from the
//! explicit `selected` flag; all take coordinates in source-image space
//! and convert through each region's scale factor. Malformed inputs (no
//! regions, non-finite coordinates) produce empty results instead of
//! errors.

use std::collections::VecDeque;

use tracing::debug;

use crate::contour::rasterize_polygon;
use crate::raster::Rect;
use crate::region::{color_distance, Region};

/// Find the region owning the source-image point `(x, y)`.
///
/// Regions are probed in reverse index order so that, were masks ever to
/// overlap (contour edits), the last-created region wins as a z-order
/// proxy. Bounding box first, exact mask lookup second.
pub fn find_region_at_point(x: f32, y: f32, regions: &[Region]) -> Option<usize> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    for region in regions.iter().rev() {
        let px = (x * region.scale_factor).floor() as i32;
        let py = (y * region.scale_factor).floor() as i32;
        if region.contains_point(px, py) {
            return Some(region.index);
        }
    }
    None
}

/// All regions owning at least one pixel inside the circle of radius `r`
/// (source-image units) about `(x, y)`.
///
/// Bounding boxes prune candidates; surviving regions are confirmed by an
/// exact mask check over the pixels the circle covers.
pub fn find_regions_in_radius(x: f32, y: f32, r: f32, regions: &[Region]) -> Vec<usize> {
    if !x.is_finite() || !y.is_finite() || !r.is_finite() || r < 0.0 {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for region in regions {
        let cx = x * region.scale_factor;
        let cy = y * region.scale_factor;
        let pr = r * region.scale_factor;
        if !region.bounds.intersects_circle(cx, cy, pr) {
            continue;
        }

        let x0 = ((cx - pr).floor() as i32).max(region.bounds.x);
        let x1 = ((cx + pr).ceil() as i32).min(region.bounds.x + region.bounds.width as i32 - 1);
        let y0 = ((cy - pr).floor() as i32).max(region.bounds.y);
        let y1 = ((cy + pr).ceil() as i32).min(region.bounds.y + region.bounds.height as i32 - 1);

        'probe: for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= pr * pr && region.contains_point(px, py) {
                    hits.push(region.index);
                    break 'probe;
                }
            }
        }
    }
    hits
}

/// Flood the adjacency graph from `seed`, accepting regions whose average
/// color stays within `threshold` of the seed's color.
///
/// The distance is always measured against the seed, never against the
/// neighbor that discovered a region: chains of incrementally similar
/// colors cannot drift the selection away from the seed tone. Rejected
/// regions are not expanded. Accepted regions are marked `selected` and
/// returned in discovery order (seed first).
pub fn select_similar_regions(
    seed: usize,
    regions: &mut [Region],
    threshold: f32,
) -> Vec<usize> {
    if seed >= regions.len() || !threshold.is_finite() {
        return Vec::new();
    }

    let seed_color = regions[seed].avg_color;
    let mut visited = vec![false; regions.len()];
    let mut accepted = Vec::new();
    let mut queue = VecDeque::new();

    visited[seed] = true;
    queue.push_back(seed);

    while let Some(idx) = queue.pop_front() {
        if color_distance(regions[idx].avg_color, seed_color) > threshold {
            continue; // not expanded further
        }
        regions[idx].selected = true;
        accepted.push(idx);

        let neighbors: Vec<usize> = regions[idx].adjacent.iter().copied().collect();
        for n in neighbors {
            if n < regions.len() && !visited[n] {
                visited[n] = true;
                queue.push_back(n);
            }
        }
    }

    debug!(seed, accepted = accepted.len(), threshold, "similarity selection");
    accepted
}

/// Rasterize the union of all selected regions into one binary buffer at
/// source-image resolution (255 = selected, 0 = elsewhere).
///
/// Regions are drawn independently with a plain fill, so the output is
/// simply the union of their contours mapped back through scale_factor.
pub fn create_mask(regions: &[Region], out_width: usize, out_height: usize) -> Vec<u8> {
    let mut out = vec![0u8; out_width * out_height];
    if out_width == 0 || out_height == 0 {
        return out;
    }

    for region in regions.iter().filter(|r| r.selected) {
        if region.contour.is_empty() || region.scale_factor <= 0.0 {
            continue;
        }
        let inv = 1.0 / region.scale_factor;
        let scaled: Vec<(f32, f32)> = region
            .contour
            .iter()
            .map(|&(x, y)| (x * inv, y * inv))
            .collect();

        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for &(x, y) in &scaled {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let x0 = (min_x.floor() as i32).max(0);
        let y0 = (min_y.floor() as i32).max(0);
        let x1 = (max_x.ceil() as i32).min(out_width as i32 - 1);
        let y1 = (max_y.ceil() as i32).min(out_height as i32 - 1);
        if x1 < x0 || y1 < y0 {
            continue;
        }

        let bounds = Rect::new(x0, y0, (x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);
        let local = rasterize_polygon(&scaled, bounds);
        for ly in 0..bounds.height as usize {
            let row = (y0 as usize + ly) * out_width;
            for lx in 0..bounds.width as usize {
                if local[ly * bounds.width as usize + lx] != 0 {
                    out[row + x0 as usize + lx] = 255;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::build_regions;

    /// 6x2 strip of three 2-wide regions with a color chain 0-1-2.
    fn chain_fixture() -> Vec<Region> {
        let mut labels = vec![0i32; 12];
        let mut rgba = vec![0u8; 12 * 4];
        let colors = [100u8, 105, 200];
        for y in 0..2 {
            for x in 0..6 {
                let band = x / 2;
                let idx = y * 6 + x;
                labels[idx] = band as i32 + 1;
                rgba[idx * 4] = colors[band];
                rgba[idx * 4 + 1] = colors[band];
                rgba[idx * 4 + 2] = colors[band];
                rgba[idx * 4 + 3] = 255;
            }
        }
        build_regions(&labels, &rgba, 6, 2, 1.0)
    }

    #[test]
    fn test_point_hit() {
        let regions = chain_fixture();
        assert_eq!(find_region_at_point(0.2, 0.2, &regions), Some(0));
        assert_eq!(find_region_at_point(3.0, 1.0, &regions), Some(1));
        assert_eq!(find_region_at_point(5.9, 1.9, &regions), Some(2));
        assert_eq!(find_region_at_point(9.0, 0.0, &regions), None);
    }

    #[test]
    fn test_point_hit_rejects_non_finite() {
        let regions = chain_fixture();
        assert_eq!(find_region_at_point(f32::NAN, 0.0, &regions), None);
        assert_eq!(find_region_at_point(0.0, f32::INFINITY, &regions), None);
    }

    #[test]
    fn test_point_hit_scales_through_scale_factor() {
        let mut regions = chain_fixture();
        for r in regions.iter_mut() {
            r.scale_factor = 0.5; // processing at half resolution
        }
        // Source point (10, 2) maps to processing (5, 1): last band
        assert_eq!(find_region_at_point(10.0, 2.0, &regions), Some(2));
    }

    #[test]
    fn test_radius_search_exact_ownership() {
        let regions = chain_fixture();
        // Circle reaching only band 0 pixels
        assert_eq!(find_regions_in_radius(1.0, 1.0, 1.0, &regions), vec![0]);
        // Circle spanning the 0/1 boundary
        let hits = find_regions_in_radius(2.0, 1.0, 1.0, &regions);
        assert!(hits.contains(&0) && hits.contains(&1));
        assert!(!hits.contains(&2));
        // Degenerate inputs
        assert!(find_regions_in_radius(1.0, 1.0, -1.0, &regions).is_empty());
        assert!(find_regions_in_radius(1.0, 1.0, 1.0, &[]).is_empty());
    }

    #[test]
    fn test_similarity_selection_does_not_drift() {
        // Colors 100, 105, 200 in a chain: region 1 is within 20 of the
        // seed, region 2 is within 95 of region 1 but far from the seed
        let mut regions = chain_fixture();
        let result = select_similar_regions(0, &mut regions, 20.0);
        assert_eq!(result, vec![0, 1]);
        assert!(regions[0].selected && regions[1].selected);
        assert!(!regions[2].selected);
    }

    #[test]
    fn test_similarity_selection_seed_only_when_neighbors_differ() {
        let mut regions = chain_fixture();
        let result = select_similar_regions(2, &mut regions, 20.0);
        assert_eq!(result, vec![2]);
    }

    #[test]
    fn test_similarity_selection_bad_seed() {
        let mut regions = chain_fixture();
        assert!(select_similar_regions(99, &mut regions, 20.0).is_empty());
    }

    #[test]
    fn test_create_mask_covers_selected_regions() {
        let mut regions = chain_fixture();
        crate::contour::attach_contours(&mut regions);
        regions[0].selected = true;
        let mask = create_mask(&regions, 6, 2);
        assert_eq!(mask.len(), 12);
        assert_eq!(mask[0], 255); // inside band 0
        assert_eq!(mask[5], 0); // band 2 untouched
    }

    #[test]
    fn test_create_mask_no_selection_is_black() {
        let regions = chain_fixture();
        let mask = create_mask(&regions, 6, 2);
        assert!(mask.iter().all(|&v| v == 0));
    }
}
