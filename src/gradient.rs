//! Edge-map construction: grayscale, Gaussian blur, Sobel magnitude.
//!
//! The watershed floods over a single-channel edge-weighted surface. This
//! module produces that surface from the RGBA processing image using the
//! standard steps: BT.709 grayscale, separable Gaussian blur to suppress
//! sensor noise, then Sobel gradient magnitude.
//!
//! Callers with their own edge pipeline can skip this module and pass a
//! precomputed map to [`crate::pipeline::segment_with_edges`].

use ndarray::Array2;
use rayon::prelude::*;

// BT.709 luminosity coefficients
const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

/// Generate a 1D Gaussian kernel.
///
/// # Arguments
/// * `sigma` - Standard deviation of the Gaussian
///
/// # Returns
/// Normalized 1D kernel as Vec<f32>
fn gaussian_kernel_1d(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }

    // Kernel size = 6 sigma (covers 99.7% of distribution), ensure odd
    let kernel_size = ((sigma * 6.0).ceil() as usize) | 1;
    let half = kernel_size / 2;

    let mut kernel: Vec<f32> = (0..kernel_size)
        .map(|i| {
            let x = i as f32 - half as f32;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }

    kernel
}

/// Convert RGBA pixels to a grayscale float raster using BT.709 luminosity.
pub fn grayscale(rgba: &[u8], width: usize, height: usize) -> Array2<f32> {
    let mut gray = Array2::<f32>::zeros((height, width));
    for y in 0..height {
        for x in 0..width {
            let i = (y * width + x) * 4;
            let r = rgba[i] as f32;
            let g = rgba[i + 1] as f32;
            let b = rgba[i + 2] as f32;
            gray[[y, x]] = LUMA_R * r + LUMA_G * g + LUMA_B * b;
        }
    }
    gray
}

/// Apply separable two-pass Gaussian blur to a single-channel raster.
///
/// Edges are handled by clamping sample coordinates to the raster.
pub fn blur(input: &Array2<f32>, sigma: f32) -> Array2<f32> {
    let (height, width) = input.dim();
    let kernel = gaussian_kernel_1d(sigma);
    let half = kernel.len() / 2;

    let mut temp = Array2::<f32>::zeros((height, width));
    let mut result = Array2::<f32>::zeros((height, width));

    // Horizontal pass
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + ki as isize - half as isize)
                    .clamp(0, width as isize - 1) as usize;
                sum += input[[y, sx]] * kv;
            }
            temp[[y, x]] = sum;
        }
    }

    // Vertical pass
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = (y as isize + ki as isize - half as isize)
                    .clamp(0, height as isize - 1) as usize;
                sum += temp[[sy, x]] * kv;
            }
            result[[y, x]] = sum;
        }
    }

    result
}

/// Compute Sobel gradient magnitude of a single-channel raster.
///
/// Border pixels (no full 3x3 neighborhood) are left at zero, which keeps
/// the image frame flood-friendly.
pub fn sobel_magnitude(input: &Array2<f32>) -> Array2<f32> {
    let (height, width) = input.dim();
    let mut output = Array2::<f32>::zeros((height, width));

    if height < 3 || width < 3 {
        return output;
    }

    // Sobel kernels
    let kernel_h: [[f32; 3]; 3] = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
    let kernel_v: [[f32; 3]; 3] = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

    let rows: Vec<Vec<f32>> = (1..height - 1)
        .into_par_iter()
        .map(|y| {
            let mut row = vec![0.0f32; width];
            for x in 1..width - 1 {
                let mut gx = 0.0f32;
                let mut gy = 0.0f32;
                for ky in 0..3 {
                    for kx in 0..3 {
                        let v = input[[y + ky - 1, x + kx - 1]];
                        gx += v * kernel_h[ky][kx];
                        gy += v * kernel_v[ky][kx];
                    }
                }
                row[x] = (gx * gx + gy * gy).sqrt();
            }
            row
        })
        .collect();

    for (i, row) in rows.into_iter().enumerate() {
        for (x, v) in row.into_iter().enumerate() {
            output[[i + 1, x]] = v;
        }
    }

    output
}

/// Build the edge map the watershed floods over.
///
/// # Arguments
/// * `rgba` - RGBA pixels of the processing image
/// * `width`, `height` - Image dimensions
/// * `blur_sigma` - Gaussian sigma applied before the gradient (2.0 works
///   well for photographs; 0 disables the blur)
///
/// # Returns
/// Gradient-magnitude raster of the same dimensions.
pub fn edge_map(rgba: &[u8], width: usize, height: usize, blur_sigma: f32) -> Array2<f32> {
    let gray = grayscale(rgba, width, height);
    let smoothed = if blur_sigma > 0.0 { blur(&gray, blur_sigma) } else { gray };
    sobel_magnitude(&smoothed)
}
