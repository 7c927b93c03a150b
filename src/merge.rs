//! Region merging: redistribution of undersized regions and the optional
//! color-similarity merge pass.
//!
//! Redistribution dissolves every region below the minimum area by
//! reassigning its pixels to the nearest sufficiently large region, found
//! by expanding square rings around each pixel. The color pass unions
//! adjacent regions whose average colors sit below a strength-derived
//! threshold. After either pass the caller rebuilds region records from
//! the rewritten label map.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, trace};

use crate::region::{color_distance, Region};

/// Ring search cap for redistribution (Chebyshev radius, pixels).
pub const REDISTRIBUTION_RADIUS_CAP: i32 = 64;

/// Union-find over region indices.
pub struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Union keeping the smaller index as root, so partitions are
    /// deterministic regardless of union order.
    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[high] = low;
    }
}

/// Minimum surviving region area for an image, from the area fraction.
pub fn min_region_area(width: usize, height: usize, fraction: f32) -> usize {
    (((width * height) as f32) * fraction).floor().max(1.0) as usize
}

/// Dissolve every region below `min_area` pixels.
///
/// Each dissolved pixel searches expanding square rings (radius 1 up to
/// [`REDISTRIBUTION_RADIUS_CAP`]) of the pre-pass label map for the
/// nearest pixel owned by a qualifying region, taking the lowest label on
/// ties. Pixels whose search exhausts the cap fall back to the lowest
/// qualifying label, or the lowest label present when nothing qualifies
/// (degenerate images). Coverage is preserved: no pixel becomes unowned.
pub fn redistribute_small(labels: &mut [i32], width: usize, height: usize, min_area: usize) {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for &l in labels.iter() {
        *counts.entry(l).or_insert(0) += 1;
    }

    let qualifying: HashSet<i32> = counts
        .iter()
        .filter(|(_, &c)| c >= min_area)
        .map(|(&l, _)| l)
        .collect();
    if qualifying.len() == counts.len() {
        return;
    }

    let fallback = qualifying
        .iter()
        .copied()
        .min()
        .or_else(|| counts.keys().copied().min())
        .unwrap_or(1);

    let snapshot = labels.to_vec();
    let mut dissolved = 0usize;
    let mut fallbacks = 0usize;

    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let idx = y as usize * width + x as usize;
            if qualifying.contains(&snapshot[idx]) {
                continue;
            }

            let mut assigned = None;
            'rings: for r in 1..=REDISTRIBUTION_RADIUS_CAP {
                let mut best: Option<i32> = None;
                for dy in -r..=r {
                    for dx in -r..=r {
                        if dx.abs().max(dy.abs()) != r {
                            continue;
                        }
                        let nx = x + dx;
                        let ny = y + dy;
                        if nx < 0 || ny < 0 || nx as usize >= width || ny as usize >= height {
                            continue;
                        }
                        let l = snapshot[ny as usize * width + nx as usize];
                        if qualifying.contains(&l) && best.map_or(true, |b| l < b) {
                            best = Some(l);
                        }
                    }
                }
                if best.is_some() {
                    assigned = best;
                    break 'rings;
                }
            }

            labels[idx] = match assigned {
                Some(l) => l,
                None => {
                    fallbacks += 1;
                    fallback
                }
            };
            dissolved += 1;
        }
    }

    if fallbacks > 0 {
        trace!(fallbacks, "redistribution radius cap exceeded, used fallback label");
    }
    debug!(
        dissolved,
        surviving = qualifying.len().max(1),
        "redistributed undersized regions"
    );
}

/// Color-merge threshold from a 0-100 strength. Monotonic: strength 0
/// disables merging, 100 merges anything within 150 RGB distance.
pub fn merge_threshold(strength: f32) -> f32 {
    strength.clamp(0.0, 100.0) / 100.0 * 150.0
}

/// Union adjacent region pairs whose average colors are closer than
/// `threshold`. Pure with respect to the region list; the caller applies
/// the partition to the label map and rebuilds.
pub fn merge_similar(regions: &[Region], threshold: f32) -> DisjointSet {
    let mut ds = DisjointSet::new(regions.len());
    if threshold <= 0.0 {
        return ds;
    }
    let mut merged = 0usize;
    for region in regions {
        for &n in &region.adjacent {
            if n <= region.index {
                continue; // each pair once
            }
            if color_distance(region.avg_color, regions[n].avg_color) < threshold {
                ds.union(region.index, n);
                merged += 1;
            }
        }
    }
    debug!(pairs = merged, threshold, "color merge pass");
    ds
}

/// Rewrite the label map according to a region-index partition.
///
/// Region indices correspond to the map's labels in ascending order (the
/// same ordering the region builder uses). Each pixel's label becomes the
/// partition root's index + 1.
pub fn apply_partition(labels: &mut [i32], ds: &mut DisjointSet) {
    let uniq: Vec<i32> = labels.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    let index_of: HashMap<i32, usize> = uniq.iter().enumerate().map(|(i, &l)| (l, i)).collect();
    for l in labels.iter_mut() {
        let root = ds.find(index_of[l]);
        *l = root as i32 + 1;
    }
}
