//! Structural similarity index (Wang et al., 2004) over 8-bit grayscale images.
//!
//! Local statistics come from a uniform square window. The mean is taken over
//! every pixel whose window lies entirely inside the image, so no border
//! padding mode is involved.

use image::GrayImage;
use rayon::prelude::*;

/// Dynamic range of 8-bit intensities.
const DATA_RANGE: f64 = 255.0;

#[derive(Debug, Clone, Copy)]
pub struct SsimParams {
    /// Side of the square window; must be odd.
    pub window_size: u32,
    pub k1: f64,
    pub k2: f64,
}

impl Default for SsimParams {
    fn default() -> Self {
        Self {
            window_size: 7,
            k1: 0.01,
            k2: 0.03,
        }
    }
}

/// Window sums of x, y, x², y² and xy, kept as integers so the statistics
/// are exact before the final division.
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    sx: u64,
    sy: u64,
    sxx: u64,
    syy: u64,
    sxy: u64,
}

impl Moments {
    fn add(&mut self, x: u8, y: u8) {
        let (x, y) = (x as u64, y as u64);
        self.sx += x;
        self.sy += y;
        self.sxx += x * x;
        self.syy += y * y;
        self.sxy += x * y;
    }

    fn accumulate(&mut self, other: &Moments) {
        self.sx += other.sx;
        self.sy += other.sy;
        self.sxx += other.sxx;
        self.syy += other.syy;
        self.sxy += other.sxy;
    }

    fn remove(&mut self, other: &Moments) {
        self.sx -= other.sx;
        self.sy -= other.sy;
        self.sxx -= other.sxx;
        self.syy -= other.syy;
        self.sxy -= other.sxy;
    }
}

/// Mean SSIM of two equally sized grayscale images.
///
/// Returns `None` when the sizes differ or either side is smaller than the
/// window.
pub fn mean_ssim(reference: &GrayImage, candidate: &GrayImage, params: &SsimParams) -> Option<f64> {
    let (width, height) = reference.dimensions();
    let win = params.window_size;
    if candidate.dimensions() != (width, height) || win == 0 || width < win || height < win {
        return None;
    }

    let n = (win * win) as f64;
    let cov_norm = n / (n - 1.0);
    let c1 = (params.k1 * DATA_RANGE).powi(2);
    let c2 = (params.k2 * DATA_RANGE).powi(2);

    let ref_raw = reference.as_raw();
    let cand_raw = candidate.as_raw();
    let w = width as usize;
    let win_us = win as usize;
    let out_rows = (height - win + 1) as usize;
    let out_cols = w - win_us + 1;

    let local_ssim = |m: &Moments| -> f64 {
        let ux = m.sx as f64 / n;
        let uy = m.sy as f64 / n;
        let vx = cov_norm * (m.sxx as f64 / n - ux * ux);
        let vy = cov_norm * (m.syy as f64 / n - uy * uy);
        let vxy = cov_norm * (m.sxy as f64 / n - ux * uy);

        let a1 = 2.0 * ux * uy + c1;
        let a2 = 2.0 * vxy + c2;
        let b1 = ux * ux + uy * uy + c1;
        let b2 = vx + vy + c2;
        (a1 * a2) / (b1 * b2)
    };

    // Each output row owns its own column sums, so rows are independent.
    // Row sums are collected in order and added sequentially to keep the
    // score bit-identical across runs.
    let row_sums: Vec<f64> = (0..out_rows)
        .into_par_iter()
        .map(|top| {
            let mut columns = vec![Moments::default(); w];
            for row in top..top + win_us {
                let offset = row * w;
                for (col, moments) in columns.iter_mut().enumerate() {
                    moments.add(ref_raw[offset + col], cand_raw[offset + col]);
                }
            }

            let mut window = Moments::default();
            for column in &columns[..win_us] {
                window.accumulate(column);
            }

            let mut row_sum = local_ssim(&window);
            for left in 1..out_cols {
                window.remove(&columns[left - 1]);
                window.accumulate(&columns[left + win_us - 1]);
                row_sum += local_ssim(&window);
            }
            row_sum
        })
        .collect();

    let total: f64 = row_sums.iter().sum();
    Some(total / (out_rows * out_cols) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn stripes(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            if (x + y) % 8 < 4 { Luma([255]) } else { Luma([0]) }
        })
    }

    #[test]
    fn test_identical_images_score_one() {
        let img = stripes(40, 30);
        let score = mean_ssim(&img, &img, &SsimParams::default()).unwrap();
        assert!((score - 1.0).abs() < 1e-9, "score was {}", score);
    }

    #[test]
    fn test_flat_identical_images_score_one() {
        let img = GrayImage::from_pixel(16, 16, Luma([90]));
        let score = mean_ssim(&img, &img, &SsimParams::default()).unwrap();
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_image_scores_negative() {
        let img = stripes(32, 32);
        let inverted = GrayImage::from_fn(32, 32, |x, y| Luma([255 - img.get_pixel(x, y)[0]]));
        let score = mean_ssim(&img, &inverted, &SsimParams::default()).unwrap();
        assert!(score < 0.0, "score was {}", score);
        assert!(score >= -1.0);
    }

    #[test]
    fn test_flat_replacement_of_texture_scores_near_zero() {
        let img = stripes(32, 32);
        let flat = GrayImage::from_pixel(32, 32, Luma([128]));
        let score = mean_ssim(&img, &flat, &SsimParams::default()).unwrap();
        assert!(score.abs() < 0.05, "score was {}", score);
    }

    #[test]
    fn test_small_perturbation_stays_high() {
        let img = stripes(48, 48);
        let mut noisy = img.clone();
        for (x, y, p) in noisy.enumerate_pixels_mut() {
            let delta = ((x * 31 + y * 17) % 7) as u8;
            p[0] = if p[0] > 128 { p[0] - delta } else { p[0] + delta };
        }
        let score = mean_ssim(&img, &noisy, &SsimParams::default()).unwrap();
        assert!(score > 0.95 && score < 1.0, "score was {}", score);
    }

    #[test]
    fn test_window_equal_to_image_gives_single_window() {
        let img = stripes(7, 7);
        let score = mean_ssim(&img, &img, &SsimParams::default()).unwrap();
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_mismatched_or_tiny_inputs() {
        let params = SsimParams::default();
        assert!(mean_ssim(&stripes(20, 20), &stripes(20, 21), &params).is_none());
        assert!(mean_ssim(&stripes(6, 20), &stripes(6, 20), &params).is_none());
    }

    #[test]
    fn test_symmetric() {
        let a = stripes(24, 24);
        let b = GrayImage::from_fn(24, 24, |x, y| Luma([((x * 9 + y * 5) % 256) as u8]));
        let params = SsimParams::default();
        let ab = mean_ssim(&a, &b, &params).unwrap();
        let ba = mean_ssim(&b, &a, &params).unwrap();
        assert!((ab - ba).abs() < 1e-12);
    }
}
