//! Coverage resolution: eliminate ridge and background pixels.
//!
//! After the flood the label map still contains `-1` (ridge) and `0`
//! (unreached) entries. Complete coverage requires every pixel to carry a
//! positive label, so unresolved pixels repeatedly adopt the label of an
//! already-resolved 8-neighbor until none remain. A pass that makes no
//! progress hits the last-resort fallback: remaining pixels take the lowest
//! label present in the map (or 1 on a map with no labels at all), which
//! can only happen on degenerate inputs such as a marker-free flood.

use tracing::{debug, trace};

const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Resolve every non-positive pixel by 8-connected propagation.
///
/// Scans row-major and reads the live map, so chains of unresolved pixels
/// can collapse within a single pass. On ties the lowest positive neighbor
/// label wins. Postcondition: all entries are `>= 1`.
pub fn resolve(labels: &mut [i32], width: usize, height: usize) {
    debug_assert_eq!(labels.len(), width * height);

    let mut unresolved: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, &l)| l <= 0)
        .map(|(i, _)| i)
        .collect();

    let mut passes = 0usize;
    while !unresolved.is_empty() {
        let before = unresolved.len();
        let mut remaining = Vec::new();

        for &idx in &unresolved {
            let x = (idx % width) as i32;
            let y = (idx / width) as i32;

            let mut best = 0i32;
            for (dx, dy) in NEIGHBORS_8 {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx as usize >= width || ny as usize >= height {
                    continue;
                }
                let l = labels[ny as usize * width + nx as usize];
                if l > 0 && (best == 0 || l < best) {
                    best = l;
                }
            }

            if best > 0 {
                labels[idx] = best;
            } else {
                remaining.push(idx);
            }
        }

        passes += 1;
        if remaining.len() == before {
            // No progress: isolated pixels with no resolved neighbor at all.
            let fallback = labels.iter().copied().filter(|&l| l > 0).min().unwrap_or(1);
            trace!(
                pixels = remaining.len(),
                fallback,
                "coverage fallback engaged"
            );
            for idx in remaining {
                labels[idx] = fallback;
            }
            break;
        }
        unresolved = remaining;
    }

    debug!(passes, "coverage resolved");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ridge_pixels_adopt_neighbor_label() {
        // 3x3: center is ridge, ring is label 2
        let mut labels = vec![2, 2, 2, 2, -1, 2, 2, 2, 2];
        resolve(&mut labels, 3, 3);
        assert_eq!(labels[4], 2);
    }

    #[test]
    fn test_lowest_label_wins_tie() {
        // Center ridge touches labels 3 and 2
        let mut labels = vec![3, 3, 3, 2, -1, 3, 2, 2, 2];
        resolve(&mut labels, 3, 3);
        assert_eq!(labels[4], 2);
    }

    #[test]
    fn test_chain_resolves_within_passes() {
        // Row: 1, 0, 0, 0, 0 — propagation walks rightward
        let mut labels = vec![1, 0, 0, 0, 0];
        resolve(&mut labels, 5, 1);
        assert!(labels.iter().all(|&l| l == 1));
    }

    #[test]
    fn test_all_background_hits_fallback() {
        let mut labels = vec![0; 9];
        resolve(&mut labels, 3, 3);
        assert!(labels.iter().all(|&l| l == 1));
    }

    #[test]
    fn test_postcondition_all_positive() {
        let mut labels = vec![0, -1, 2, -1, 0, -1, 3, -1, 0, 0, 0, 2, -1, -1, 3, 0];
        resolve(&mut labels, 4, 4);
        assert!(labels.iter().all(|&l| l >= 1));
    }
}
