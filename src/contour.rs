//! Contour extraction, densification and polygon rasterization.
//!
//! Regions keep an ordered closed polygon traced from their mask with
//! Moore neighborhood boundary following. Long polygon edges are densified
//! so that later rescaling (scale_factor or a perspective transform)
//! cannot round a straight span into a sub-pixel gap between adjacent
//! regions. `rebuild_region_mask` goes the other way: from an edited or
//! transformed contour back to bounds + mask.

use crate::raster::Rect;
use crate::region::Region;

/// Maximum polygon edge length after densification, in pixels.
pub const MAX_SEGMENT_LEN: f32 = 10.0;

/// Moore neighborhood directions (8-connected, clockwise from right)
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),   // 0: right
    (1, 1),   // 1: down-right
    (0, 1),   // 2: down
    (-1, 1),  // 3: down-left
    (-1, 0),  // 4: left
    (-1, -1), // 5: up-left
    (0, -1),  // 6: up
    (1, -1),  // 7: up-right
];

/// Check if a mask pixel is set (treating out-of-bounds as unset).
#[inline]
fn is_set(mask: &[u8], width: usize, height: usize, x: i32, y: i32) -> bool {
    if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
        mask[(y as usize) * width + (x as usize)] != 0
    } else {
        false
    }
}

/// Check if a pixel is on the boundary (set with at least one unset 4-neighbor).
#[inline]
fn is_boundary(mask: &[u8], width: usize, height: usize, x: i32, y: i32) -> bool {
    if !is_set(mask, width, height, x, y) {
        return false;
    }
    !is_set(mask, width, height, x - 1, y)
        || !is_set(mask, width, height, x + 1, y)
        || !is_set(mask, width, height, x, y - 1)
        || !is_set(mask, width, height, x, y + 1)
}

/// Trace the outer boundary of a binary mask into an ordered closed
/// polygon of pixel centers (x + 0.5, y + 0.5), local coordinates.
///
/// A single-pixel mask yields a single-vertex contour; an empty mask
/// yields an empty one.
pub fn trace_mask_contour(mask: &[u8], width: usize, height: usize) -> Vec<(f32, f32)> {
    // First boundary pixel in row-major order
    let mut start = None;
    'scan: for y in 0..height as i32 {
        for x in 0..width as i32 {
            if is_boundary(mask, width, height, x, y) {
                start = Some((x, y));
                break 'scan;
            }
        }
    }
    let (start_x, start_y) = match start {
        Some(s) => s,
        None => return Vec::new(),
    };

    // Initial backtrack direction: first unset neighbor
    let mut dir = 0usize;
    for (i, &(dx, dy)) in DIRECTIONS.iter().enumerate() {
        if !is_set(mask, width, height, start_x + dx, start_y + dy) {
            dir = i;
            break;
        }
    }

    let mut contour = Vec::new();
    let mut x = start_x;
    let mut y = start_y;

    let max_steps = width * height * 2;
    let mut steps = 0;

    loop {
        contour.push((x as f32 + 0.5, y as f32 + 0.5));

        // Moore neighbor search, clockwise from just past the backtrack
        let search_start = (dir + 5) % 8;
        let mut found = false;
        for i in 0..8 {
            let check_dir = (search_start + i) % 8;
            let (dx, dy) = DIRECTIONS[check_dir];
            let nx = x + dx;
            let ny = y + dy;

            if is_set(mask, width, height, nx, ny) {
                if nx == start_x && ny == start_y && steps > 0 {
                    return contour;
                }
                if is_boundary(mask, width, height, nx, ny) {
                    x = nx;
                    y = ny;
                    dir = check_dir;
                    found = true;
                    break;
                }
            }
        }

        if !found {
            // Isolated pixel: the single vertex already pushed is the
            // minimal valid shape
            break;
        }

        steps += 1;
        if steps >= max_steps {
            break;
        }
    }

    contour
}

/// Insert evenly spaced vertices so no polygon edge (including the closing
/// edge) exceeds `max_len`. Contours with fewer than two vertices are
/// returned unchanged, and a contour already within the limit keeps its
/// vertex count.
pub fn densify_contour(points: &[(f32, f32)], max_len: f32) -> Vec<(f32, f32)> {
    if points.len() < 2 || max_len <= 0.0 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity(points.len());
    let n = points.len();
    for i in 0..n {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % n];
        out.push((x0, y0));

        let dx = x1 - x0;
        let dy = y1 - y0;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > max_len {
            let pieces = (dist / max_len).ceil() as usize;
            for k in 1..pieces {
                let t = k as f32 / pieces as f32;
                out.push((x0 + dx * t, y0 + dy * t));
            }
        }
    }
    out
}

/// Rasterize a closed polygon into a mask local to `bounds`, even-odd
/// fill rule sampled at pixel centers.
pub fn rasterize_polygon(contour: &[(f32, f32)], bounds: Rect) -> Vec<u8> {
    let w = bounds.width as usize;
    let h = bounds.height as usize;
    let mut mask = vec![0u8; w * h];
    if contour.len() < 3 {
        // Degenerate: mark the vertices themselves
        for &(px, py) in contour {
            let lx = px.floor() as i32 - bounds.x;
            let ly = py.floor() as i32 - bounds.y;
            if lx >= 0 && ly >= 0 && (lx as usize) < w && (ly as usize) < h {
                mask[ly as usize * w + lx as usize] = 1;
            }
        }
        return mask;
    }

    let n = contour.len();
    let mut crossings: Vec<f32> = Vec::new();
    for row in 0..h {
        let sy = bounds.y as f32 + row as f32 + 0.5;
        crossings.clear();
        for i in 0..n {
            let (x0, y0) = contour[i];
            let (x1, y1) = contour[(i + 1) % n];
            if (y0 <= sy && y1 > sy) || (y1 <= sy && y0 > sy) {
                let t = (sy - y0) / (y1 - y0);
                crossings.push(x0 + t * (x1 - x0));
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap());

        for pair in crossings.chunks_exact(2) {
            let (a, b) = (pair[0], pair[1]);
            // Pixels whose center x lies inside the span
            let first = (a - bounds.x as f32 - 0.5).ceil().max(0.0) as usize;
            let last = (b - bounds.x as f32 - 0.5).floor().min(w as f32 - 1.0);
            if last < 0.0 {
                continue;
            }
            for lx in first..=last as usize {
                mask[row * w + lx] = 1;
            }
        }
    }

    mask
}

/// Recompute a region's bounds and mask from its contour alone.
///
/// Used after a contour edit or geometric transform without re-running the
/// segmentation. Bounds become the inclusive integer bounding box of the
/// contour; the mask is rasterized fresh with the same even-odd rule the
/// extraction step uses. A region with an empty contour is left untouched.
pub fn rebuild_region_mask(region: &mut Region) {
    if region.contour.is_empty() {
        return;
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for &(x, y) in &region.contour {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    let x0 = min_x.floor() as i32;
    let y0 = min_y.floor() as i32;
    let x1 = max_x.floor() as i32;
    let y1 = max_y.floor() as i32;
    let bounds = Rect::new(x0, y0, (x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);

    region.mask = rasterize_polygon(&region.contour, bounds);
    region.bounds = bounds;
}

/// Trace and densify contours for every region in place.
pub fn attach_contours(regions: &mut [Region]) {
    for region in regions.iter_mut() {
        let local = trace_mask_contour(
            &region.mask,
            region.bounds.width as usize,
            region.bounds.height as usize,
        );
        let offset: Vec<(f32, f32)> = local
            .into_iter()
            .map(|(x, y)| (x + region.bounds.x as f32, y + region.bounds.y as f32))
            .collect();
        region.contour = densify_contour(&offset, MAX_SEGMENT_LEN);
    }
}
