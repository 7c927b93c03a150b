//! WebAssembly exports for the segmentation engine.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. The region
//! list from the most recent `segment_rgba_wasm` call is kept in
//! thread-local session state (wasm runs single-threaded) and the
//! selection operations act on it; each new segmentation replaces the
//! list wholesale.
//!
//! Geometry crosses the boundary as flat arrays:
//! - contours: `[num_regions, len_1, x1, y1, x2, y2, ..., len_2, ...]`
//!   in source-image coordinates
//! - masks: row-major bytes, 255 = selected

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

use crate::pipeline::{segment_rgba, SegmentOptions};
use crate::region::Region;
use crate::selection;

thread_local! {
    static REGIONS: RefCell<Vec<Region>> = RefCell::new(Vec::new());
}

/// Segment an RGBA image and store the region list in session state.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width`, `height` - Image dimensions in pixels
/// * `detail` - Detail level 1-20
/// * `merge_strength` - Color-merge strength 0-100, 0 disables
///
/// # Returns
/// Number of regions, or -1 when the input is invalid.
#[wasm_bindgen]
pub fn segment_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    detail: u32,
    merge_strength: f32,
) -> i32 {
    let options = SegmentOptions {
        detail,
        merge_strength,
        ..Default::default()
    };
    match segment_rgba(data, width, height, &options) {
        Ok(regions) => {
            let count = regions.len() as i32;
            REGIONS.with(|r| *r.borrow_mut() = regions);
            count
        }
        Err(_) => -1,
    }
}

/// Flatten all region contours in source-image coordinates.
#[wasm_bindgen]
pub fn region_contours_wasm() -> Vec<f32> {
    REGIONS.with(|r| {
        let regions = r.borrow();
        let mut out = Vec::new();
        out.push(regions.len() as f32);
        for region in regions.iter() {
            let inv = if region.scale_factor > 0.0 {
                1.0 / region.scale_factor
            } else {
                1.0
            };
            out.push(region.contour.len() as f32);
            for &(x, y) in &region.contour {
                out.push(x * inv);
                out.push(y * inv);
            }
        }
        out
    })
}

/// Average color of one region as `[r, g, b]`, or empty when out of range.
#[wasm_bindgen]
pub fn region_avg_color_wasm(index: usize) -> Vec<f32> {
    REGIONS.with(|r| {
        r.borrow()
            .get(index)
            .map(|region| region.avg_color.to_vec())
            .unwrap_or_default()
    })
}

/// Region index at a source-image point, or -1.
#[wasm_bindgen]
pub fn find_region_at_point_wasm(x: f32, y: f32) -> i32 {
    REGIONS.with(|r| {
        selection::find_region_at_point(x, y, &r.borrow())
            .map(|i| i as i32)
            .unwrap_or(-1)
    })
}

/// Indices of regions owning pixels within the circle.
#[wasm_bindgen]
pub fn find_regions_in_radius_wasm(x: f32, y: f32, radius: f32) -> Vec<i32> {
    REGIONS.with(|r| {
        selection::find_regions_in_radius(x, y, radius, &r.borrow())
            .into_iter()
            .map(|i| i as i32)
            .collect()
    })
}

/// Similarity flood from a seed region; marks results selected.
#[wasm_bindgen]
pub fn select_similar_wasm(seed: usize, threshold: f32) -> Vec<i32> {
    REGIONS.with(|r| {
        selection::select_similar_regions(seed, &mut r.borrow_mut(), threshold)
            .into_iter()
            .map(|i| i as i32)
            .collect()
    })
}

/// Toggle one region's selected flag.
#[wasm_bindgen]
pub fn set_selected_wasm(index: usize, selected: bool) {
    REGIONS.with(|r| {
        if let Some(region) = r.borrow_mut().get_mut(index) {
            region.selected = selected;
        }
    });
}

/// Clear every region's selected flag.
#[wasm_bindgen]
pub fn clear_selection_wasm() {
    REGIONS.with(|r| {
        for region in r.borrow_mut().iter_mut() {
            region.selected = false;
        }
    });
}

/// Binary projection mask of the selected set at source resolution.
#[wasm_bindgen]
pub fn create_mask_wasm(width: usize, height: usize) -> Vec<u8> {
    REGIONS.with(|r| selection::create_mask(&r.borrow(), width, height))
}
