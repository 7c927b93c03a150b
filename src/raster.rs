//! Raster buffers and integer rectangles.
//!
//! [`RasterBuffer`] owns the RGBA source pixels of the processing-resolution
//! image together with a same-size `i32` label map. It is a plain data
//! holder; the pipeline stages read and write it directly via flat indexing.

/// Integer rectangle, tight to the pixels it describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Whether `(px, py)` falls inside the rectangle.
    #[inline]
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && py >= self.y
            && px < self.x + self.width as i32
            && py < self.y + self.height as i32
    }

    /// Whether the rectangle intersects the circle of radius `r` about
    /// `(cx, cy)`. Uses the closest point on the rect to the center.
    pub fn intersects_circle(&self, cx: f32, cy: f32, r: f32) -> bool {
        let nearest_x = cx.clamp(self.x as f32, (self.x + self.width as i32) as f32);
        let nearest_y = cy.clamp(self.y as f32, (self.y + self.height as i32) as f32);
        let dx = cx - nearest_x;
        let dy = cy - nearest_y;
        dx * dx + dy * dy <= r * r
    }
}

/// Source pixels plus label map for one segmentation run.
///
/// Labels use three pixel classes during the pipeline:
/// - `> 0`: owned by the region with that label
/// - `-1`: ridge pixel (reached simultaneously by two floods)
/// - `0`: unassigned background
///
/// After coverage resolution only positive labels remain.
pub struct RasterBuffer {
    pub width: usize,
    pub height: usize,
    /// RGBA samples, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    /// One entry per pixel.
    pub labels: Vec<i32>,
}

impl RasterBuffer {
    /// Wrap an RGBA buffer. Returns `None` when dimensions are zero or the
    /// buffer length does not match.
    pub fn from_rgba(pixels: Vec<u8>, width: usize, height: usize) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != width * height * 4 {
            return None;
        }
        let labels = vec![0i32; width * height];
        Some(Self { width, height, pixels, labels })
    }

}

/// Downscale an RGBA image by nearest-neighbor sampling.
///
/// # Arguments
/// * `rgba` - Source pixels (width * height * 4)
/// * `width`, `height` - Source dimensions
/// * `new_width`, `new_height` - Target dimensions (both non-zero)
///
/// # Returns
/// Resampled RGBA buffer of `new_width * new_height * 4` bytes.
pub fn downscale_rgba(
    rgba: &[u8],
    width: usize,
    height: usize,
    new_width: usize,
    new_height: usize,
) -> Vec<u8> {
    let mut out = vec![0u8; new_width * new_height * 4];
    for y in 0..new_height {
        let sy = (y * height / new_height).min(height - 1);
        for x in 0..new_width {
            let sx = (x * width / new_width).min(width - 1);
            let src = (sy * width + sx) * 4;
            let dst = (y * new_width + x) * 4;
            out[dst..dst + 4].copy_from_slice(&rgba[src..src + 4]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(10, 20, 5, 5);
        assert!(r.contains(10, 20));
        assert!(r.contains(14, 24));
        assert!(!r.contains(15, 20));
        assert!(!r.contains(9, 20));
    }

    #[test]
    fn test_rect_circle_intersection() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.intersects_circle(5.0, 5.0, 1.0)); // inside
        assert!(r.intersects_circle(12.0, 5.0, 3.0)); // overlaps right edge
        assert!(!r.intersects_circle(20.0, 20.0, 2.0)); // far away
    }

    #[test]
    fn test_from_rgba_validates() {
        assert!(RasterBuffer::from_rgba(vec![0; 16], 2, 2).is_some());
        assert!(RasterBuffer::from_rgba(vec![0; 15], 2, 2).is_none());
        assert!(RasterBuffer::from_rgba(vec![], 0, 0).is_none());
    }

    #[test]
    fn test_downscale_halves() {
        // 4x4 image, top-left quadrant red, rest black
        let mut rgba = vec![0u8; 4 * 4 * 4];
        for y in 0..2 {
            for x in 0..2 {
                rgba[(y * 4 + x) * 4] = 255;
            }
        }
        let small = downscale_rgba(&rgba, 4, 4, 2, 2);
        assert_eq!(small.len(), 2 * 2 * 4);
        assert_eq!(small[0], 255); // top-left stays red
        assert_eq!(small[(1 * 2 + 1) * 4], 0); // bottom-right stays black
    }
}
