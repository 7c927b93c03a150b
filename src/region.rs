//! Region records and the label-map region builder.
//!
//! A [`Region`] is always fully populated: tight bounds, a local binary
//! mask, average color and the adjacency set are produced together from
//! the resolved label map. Contours are attached afterwards by the contour
//! extractor. Region masks partition the processing image: no pixel is
//! owned twice and none is left unowned.

use std::collections::{BTreeSet, HashMap};

use crate::raster::Rect;

/// One segmented region of the processing image.
#[derive(Clone, Debug)]
pub struct Region {
    /// Stable while the region list is unmodified.
    pub index: usize,
    /// Tight integer bounding box, processing-resolution coordinates.
    pub bounds: Rect,
    /// `bounds.width * bounds.height` bytes, 1 = owned.
    pub mask: Vec<u8>,
    /// Ordered closed polygon in processing-resolution coordinates.
    pub contour: Vec<(f32, f32)>,
    /// Processing resolution / original resolution. Geometry divides by
    /// this when mapped back to source coordinates.
    pub scale_factor: f32,
    /// Mean RGB over owned pixels.
    pub avg_color: [f32; 3],
    /// Indices of regions sharing an 8-connected boundary pixel pair.
    pub adjacent: BTreeSet<usize>,
    /// Mutated only by the selection engine / UI.
    pub selected: bool,
}

impl Region {
    /// Owned-pixel count, derived from the mask.
    pub fn pixel_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m != 0).count()
    }

    /// Exact ownership test at processing-resolution pixel `(x, y)`.
    #[inline]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        if !self.bounds.contains(x, y) {
            return false;
        }
        let lx = (x - self.bounds.x) as usize;
        let ly = (y - self.bounds.y) as usize;
        self.mask[ly * self.bounds.width as usize + lx] != 0
    }
}

/// Per-label accumulator for the single building pass.
struct Accum {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
    count: usize,
    color_sum: [f64; 3],
}

impl Accum {
    fn new(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            count: 0,
            color_sum: [0.0; 3],
        }
    }
}

/// Build region records from a fully resolved label map.
///
/// One pass accumulates bounds, pixel counts, color sums and adjacency
/// edges (right, down and both down-diagonals cover every 8-connected
/// pair once); a second pass materializes the cropped masks. Region
/// indices are assigned by ascending label, so identical label maps yield
/// identical region lists.
///
/// # Arguments
/// * `labels` - Resolved label map (every entry positive)
/// * `rgba` - RGBA pixels of the same image
/// * `scale_factor` - Processing / original resolution ratio
pub fn build_regions(
    labels: &[i32],
    rgba: &[u8],
    width: usize,
    height: usize,
    scale_factor: f32,
) -> Vec<Region> {
    debug_assert_eq!(labels.len(), width * height);
    debug_assert_eq!(rgba.len(), width * height * 4);

    let mut accums: HashMap<i32, Accum> = HashMap::new();
    // label pairs sharing a boundary, recorded once per direction later
    let mut touching: BTreeSet<(i32, i32)> = BTreeSet::new();

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let label = labels[idx];

            let acc = accums.entry(label).or_insert_with(|| Accum::new(x, y));
            acc.min_x = acc.min_x.min(x);
            acc.min_y = acc.min_y.min(y);
            acc.max_x = acc.max_x.max(x);
            acc.max_y = acc.max_y.max(y);
            acc.count += 1;
            let p = idx * 4;
            acc.color_sum[0] += rgba[p] as f64;
            acc.color_sum[1] += rgba[p + 1] as f64;
            acc.color_sum[2] += rgba[p + 2] as f64;

            // Forward 8-connected pairs: E, SW, S, SE
            for (dx, dy) in [(1i32, 0i32), (-1, 1), (0, 1), (1, 1)] {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || nx as usize >= width || ny as usize >= height {
                    continue;
                }
                let other = labels[ny as usize * width + nx as usize];
                if other != label {
                    touching.insert((label.min(other), label.max(other)));
                }
            }
        }
    }

    // Ascending label order fixes region indices
    let mut sorted_labels: Vec<i32> = accums.keys().copied().collect();
    sorted_labels.sort_unstable();
    let label_to_index: HashMap<i32, usize> = sorted_labels
        .iter()
        .enumerate()
        .map(|(i, &l)| (l, i))
        .collect();

    let mut regions: Vec<Region> = sorted_labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let acc = &accums[label];
            let w = acc.max_x - acc.min_x + 1;
            let h = acc.max_y - acc.min_y + 1;
            let n = acc.count as f64;
            Region {
                index,
                bounds: Rect::new(acc.min_x as i32, acc.min_y as i32, w as u32, h as u32),
                mask: vec![0u8; w * h],
                contour: Vec::new(),
                scale_factor,
                avg_color: [
                    (acc.color_sum[0] / n) as f32,
                    (acc.color_sum[1] / n) as f32,
                    (acc.color_sum[2] / n) as f32,
                ],
                adjacent: BTreeSet::new(),
                selected: false,
            }
        })
        .collect();

    for (a, b) in touching {
        let ia = label_to_index[&a];
        let ib = label_to_index[&b];
        regions[ia].adjacent.insert(ib);
        regions[ib].adjacent.insert(ia);
    }

    // Materialize cropped masks
    for y in 0..height {
        for x in 0..width {
            let region = &mut regions[label_to_index[&labels[y * width + x]]];
            let lx = x - region.bounds.x as usize;
            let ly = y - region.bounds.y as usize;
            region.mask[ly * region.bounds.width as usize + lx] = 1;
        }
    }

    regions
}

/// Euclidean distance between two RGB colors.
#[inline]
pub fn color_distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    (dr * dr + dg * dg + db * db).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Label map split into left/right halves with distinct colors.
    fn two_half_fixture() -> (Vec<i32>, Vec<u8>) {
        let mut labels = vec![0i32; 16];
        let mut rgba = vec![0u8; 16 * 4];
        for y in 0..4 {
            for x in 0..4 {
                let idx = y * 4 + x;
                labels[idx] = if x < 2 { 1 } else { 2 };
                let p = idx * 4;
                if x < 2 {
                    rgba[p] = 200; // red-ish
                } else {
                    rgba[p + 2] = 100; // blue-ish
                }
                rgba[p + 3] = 255;
            }
        }
        (labels, rgba)
    }

    #[test]
    fn test_two_regions_with_tight_bounds() {
        let (labels, rgba) = two_half_fixture();
        let regions = build_regions(&labels, &rgba, 4, 4, 1.0);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].bounds, Rect::new(0, 0, 2, 4));
        assert_eq!(regions[1].bounds, Rect::new(2, 0, 2, 4));
        assert_eq!(regions[0].pixel_count(), 8);
        assert_eq!(regions[1].pixel_count(), 8);
    }

    #[test]
    fn test_average_colors() {
        let (labels, rgba) = two_half_fixture();
        let regions = build_regions(&labels, &rgba, 4, 4, 1.0);
        assert!((regions[0].avg_color[0] - 200.0).abs() < 1e-3);
        assert!((regions[1].avg_color[2] - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let (labels, rgba) = two_half_fixture();
        let regions = build_regions(&labels, &rgba, 4, 4, 1.0);
        assert!(regions[0].adjacent.contains(&1));
        assert!(regions[1].adjacent.contains(&0));
    }

    #[test]
    fn test_diagonal_touch_counts_as_adjacent() {
        // 2x2 quadrants: 1 and 4 (indices 0 and 3) meet only diagonally
        let labels = vec![1, 2, 3, 4];
        let rgba = vec![0u8; 4 * 4];
        let regions = build_regions(&labels, &rgba, 2, 2, 1.0);
        assert!(regions[0].adjacent.contains(&3));
        assert!(regions[3].adjacent.contains(&0));
        assert!(regions[1].adjacent.contains(&2));
    }

    #[test]
    fn test_masks_tile_without_overlap() {
        let (labels, rgba) = two_half_fixture();
        let regions = build_regions(&labels, &rgba, 4, 4, 1.0);
        let mut owners = vec![0u32; 16];
        for r in &regions {
            for y in 0..4i32 {
                for x in 0..4i32 {
                    if r.contains_point(x, y) {
                        owners[(y * 4 + x) as usize] += 1;
                    }
                }
            }
        }
        assert!(owners.iter().all(|&c| c == 1), "every pixel owned exactly once");
    }

    #[test]
    fn test_contains_point_rejects_outside_bounds() {
        let (labels, rgba) = two_half_fixture();
        let regions = build_regions(&labels, &rgba, 4, 4, 1.0);
        assert!(!regions[0].contains_point(-1, 0));
        assert!(!regions[0].contains_point(2, 0));
    }

    #[test]
    fn test_color_distance() {
        assert_eq!(color_distance([0.0; 3], [3.0, 4.0, 0.0]), 5.0);
    }
}
