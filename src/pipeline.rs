//! The segmentation pipeline: one blocking call from RGBA photo to the
//! final region list.
//!
//! Stages run in a fixed order — marker grid, watershed flood, coverage
//! resolution, region building, redistribution, optional color merge,
//! contour extraction — each owning its temporary buffers; only the
//! region list escapes. The call is synchronous and deterministic for a
//! given input. Callers that need a responsive UI should defer the call
//! themselves; the engine has no internal suspension points.

use tracing::debug;

use ndarray::Array2;

use crate::contour::attach_contours;
use crate::coverage;
use crate::error::{Result, SegmentError};
use crate::gradient;
use crate::grid;
use crate::merge;
use crate::raster::{downscale_rgba, RasterBuffer};
use crate::region::{build_regions, Region};
use crate::watershed;

/// Parameters for one segmentation run.
#[derive(Clone, Copy, Debug)]
pub struct SegmentOptions {
    /// Detail level, clamped to 1..=20. Higher means denser markers and
    /// smaller regions.
    pub detail: u32,
    /// Color-merge strength 0..=100; 0 disables the merge pass.
    pub merge_strength: f32,
    /// Minimum surviving region area as a fraction of the image area.
    pub min_area_fraction: f32,
    /// Longest axis of the processing image; larger photos are
    /// downscaled and regions carry the resulting scale factor.
    pub max_processing_dim: u32,
    /// Gaussian sigma applied before the gradient; 0 disables the blur.
    pub blur_sigma: f32,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            detail: 10,
            merge_strength: 0.0,
            min_area_fraction: 0.001,
            max_processing_dim: 1024,
            blur_sigma: 2.0,
        }
    }
}

impl SegmentOptions {
    fn validate(&self) -> Result<()> {
        if !self.merge_strength.is_finite() {
            return Err(SegmentError::invalid("merge_strength must be finite"));
        }
        if !self.min_area_fraction.is_finite()
            || self.min_area_fraction < 0.0
            || self.min_area_fraction >= 1.0
        {
            return Err(SegmentError::invalid(
                "min_area_fraction must be finite and in [0, 1)",
            ));
        }
        if !self.blur_sigma.is_finite() || self.blur_sigma < 0.0 {
            return Err(SegmentError::invalid("blur_sigma must be finite and >= 0"));
        }
        if self.max_processing_dim == 0 {
            return Err(SegmentError::invalid("max_processing_dim must be non-zero"));
        }
        Ok(())
    }
}

fn validate_image(rgba: &[u8], width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(SegmentError::invalid("image dimensions must be non-zero"));
    }
    if rgba.len() != width * height * 4 {
        return Err(SegmentError::invalid(format!(
            "RGBA buffer length {} does not match {}x{}",
            rgba.len(),
            width,
            height
        )));
    }
    Ok(())
}

/// Segment a photograph into edge-aligned regions.
///
/// Downscales to `options.max_processing_dim`, builds the edge map with
/// the standard grayscale/blur/Sobel steps, then runs the full labeling
/// pipeline. Every returned region carries the processing scale factor.
pub fn segment_rgba(
    rgba: &[u8],
    width: usize,
    height: usize,
    options: &SegmentOptions,
) -> Result<Vec<Region>> {
    validate_image(rgba, width, height)?;
    options.validate()?;

    let max_dim = width.max(height);
    let target = options.max_processing_dim as usize;

    let (pixels, pw, ph, scale_factor) = if max_dim > target {
        let scale = target as f32 / max_dim as f32;
        let pw = ((width as f32 * scale).round() as usize).max(1);
        let ph = ((height as f32 * scale).round() as usize).max(1);
        debug!(pw, ph, scale, "downscaling for processing");
        (downscale_rgba(rgba, width, height, pw, ph), pw, ph, pw as f32 / width as f32)
    } else {
        (rgba.to_vec(), width, height, 1.0)
    };

    let edges = gradient::edge_map(&pixels, pw, ph, options.blur_sigma);
    let raster = RasterBuffer::from_rgba(pixels, pw, ph)
        .ok_or_else(|| SegmentError::invalid("processing buffer construction failed"))?;
    run(raster, &edges, scale_factor, options)
}

/// Segment with a caller-supplied edge map instead of the built-in
/// gradient steps. The edge map must match the image dimensions; no
/// downscaling is applied.
pub fn segment_with_edges(
    rgba: &[u8],
    width: usize,
    height: usize,
    edges: &Array2<f32>,
    options: &SegmentOptions,
) -> Result<Vec<Region>> {
    validate_image(rgba, width, height)?;
    options.validate()?;
    if edges.dim() != (height, width) {
        return Err(SegmentError::invalid("edge map dimensions do not match image"));
    }
    let raster = RasterBuffer::from_rgba(rgba.to_vec(), width, height)
        .ok_or_else(|| SegmentError::invalid("processing buffer construction failed"))?;
    run(raster, edges, 1.0, options)
}

fn run(
    mut raster: RasterBuffer,
    edges: &Array2<f32>,
    scale_factor: f32,
    options: &SegmentOptions,
) -> Result<Vec<Region>> {
    let (width, height) = (raster.width, raster.height);
    let markers = grid::place_markers(width, height, options.detail);

    raster.labels = watershed::flood(edges, &markers);
    coverage::resolve(&mut raster.labels, width, height);

    let min_area = merge::min_region_area(width, height, options.min_area_fraction);
    merge::redistribute_small(&mut raster.labels, width, height, min_area);

    let mut regions = build_regions(&raster.labels, &raster.pixels, width, height, scale_factor);
    debug!(regions = regions.len(), "regions after redistribution");

    let threshold = merge::merge_threshold(options.merge_strength);
    if threshold > 0.0 && regions.len() > 1 {
        let mut ds = merge::merge_similar(&regions, threshold);
        merge::apply_partition(&mut raster.labels, &mut ds);
        regions = build_regions(&raster.labels, &raster.pixels, width, height, scale_factor);
        debug!(regions = regions.len(), "regions after color merge");
    }

    attach_contours(&mut regions);
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 64x64 photo stand-in: four solid quadrants with distinct colors.
    fn quadrant_image() -> Vec<u8> {
        let mut rgba = vec![0u8; 64 * 64 * 4];
        for y in 0..64 {
            for x in 0..64 {
                let i = (y * 64 + x) * 4;
                let (r, g, b) = match (x < 32, y < 32) {
                    (true, true) => (220u8, 40u8, 40u8),
                    (false, true) => (40, 220, 40),
                    (true, false) => (40, 40, 220),
                    (false, false) => (220, 220, 40),
                };
                rgba[i] = r;
                rgba[i + 1] = g;
                rgba[i + 2] = b;
                rgba[i + 3] = 255;
            }
        }
        rgba
    }

    #[test]
    fn test_rejects_zero_size_image() {
        let err = segment_rgba(&[], 0, 0, &SegmentOptions::default());
        assert!(matches!(err, Err(SegmentError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        let err = segment_rgba(&[0u8; 10], 4, 4, &SegmentOptions::default());
        assert!(matches!(err, Err(SegmentError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_non_finite_options() {
        let rgba = quadrant_image();
        let options = SegmentOptions {
            merge_strength: f32::NAN,
            ..Default::default()
        };
        assert!(segment_rgba(&rgba, 64, 64, &options).is_err());
    }

    #[test]
    fn test_complete_coverage_without_overlap() {
        let rgba = quadrant_image();
        let regions = segment_rgba(&rgba, 64, 64, &SegmentOptions::default()).unwrap();
        assert!(!regions.is_empty());

        let mut owners = vec![0u32; 64 * 64];
        for r in &regions {
            for y in 0..64i32 {
                for x in 0..64i32 {
                    if r.contains_point(x, y) {
                        owners[(y * 64 + x) as usize] += 1;
                    }
                }
            }
        }
        assert!(
            owners.iter().all(|&c| c == 1),
            "every pixel must be owned exactly once"
        );
    }

    #[test]
    fn test_minimum_region_size_holds() {
        let rgba = quadrant_image();
        let options = SegmentOptions::default();
        let regions = segment_rgba(&rgba, 64, 64, &options).unwrap();
        let min_area = merge::min_region_area(64, 64, options.min_area_fraction);
        for r in &regions {
            assert!(r.pixel_count() >= min_area, "region {} too small", r.index);
        }
    }

    #[test]
    fn test_adjacency_symmetric_and_contours_attached() {
        let rgba = quadrant_image();
        let regions = segment_rgba(&rgba, 64, 64, &SegmentOptions::default()).unwrap();
        for r in &regions {
            assert!(!r.contour.is_empty());
            for &n in &r.adjacent {
                assert!(regions[n].adjacent.contains(&r.index));
            }
        }
    }

    #[test]
    fn test_deterministic_output() {
        let rgba = quadrant_image();
        let a = segment_rgba(&rgba, 64, 64, &SegmentOptions::default()).unwrap();
        let b = segment_rgba(&rgba, 64, 64, &SegmentOptions::default()).unwrap();
        assert_eq!(a.len(), b.len());
        for (ra, rb) in a.iter().zip(&b) {
            assert_eq!(ra.bounds, rb.bounds);
            assert_eq!(ra.mask, rb.mask);
            assert_eq!(ra.adjacent, rb.adjacent);
        }
    }

    #[test]
    fn test_merge_strength_reduces_region_count() {
        let rgba = quadrant_image();
        let plain = segment_rgba(&rgba, 64, 64, &SegmentOptions::default()).unwrap();
        let merged = segment_rgba(
            &rgba,
            64,
            64,
            &SegmentOptions {
                merge_strength: 100.0,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(merged.len() <= plain.len());
        assert!(merged.len() >= 1);
    }

    #[test]
    fn test_downscale_records_scale_factor() {
        let rgba = quadrant_image();
        let options = SegmentOptions {
            max_processing_dim: 32,
            ..Default::default()
        };
        let regions = segment_rgba(&rgba, 64, 64, &options).unwrap();
        for r in &regions {
            assert!((r.scale_factor - 0.5).abs() < 1e-6);
            assert!(r.bounds.x + (r.bounds.width as i32) <= 32);
            assert!(r.bounds.y + (r.bounds.height as i32) <= 32);
        }
    }

    #[test]
    fn test_segment_with_edges_checks_dimensions() {
        let rgba = quadrant_image();
        let edges = Array2::<f32>::zeros((32, 32));
        assert!(segment_with_edges(&rgba, 64, 64, &edges, &SegmentOptions::default()).is_err());
    }

    #[test]
    fn test_segment_with_edges_runs() {
        let rgba = quadrant_image();
        let edges = Array2::<f32>::zeros((64, 64));
        let regions =
            segment_with_edges(&rgba, 64, 64, &edges, &SegmentOptions::default()).unwrap();
        assert!(!regions.is_empty());
        for r in &regions {
            assert_eq!(r.scale_factor, 1.0);
        }
    }
}
