//! Per-pixel corner responses from the gradient covariance matrix.
//!
//! Gradients come from separable Sobel kernels with reflect-101 borders and
//! are summed over an unnormalized `block_size` box, so the maps agree with
//! the usual `cornerHarris` / `cornerMinEigenVal` definitions.

use camtrack_core::{ImageView, ResponseMap};
use rayon::prelude::*;

use crate::error::{check_aperture, check_image, DetectError, DetectResult};

/// Raw f32 response, row-major with the dimensions of the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f32>,
}

impl RawResponse {
    pub fn at(&self, r: usize, c: usize) -> f32 {
        self.data[r * self.cols + c]
    }

    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Gradient covariance sums over the block window.
struct Covariance {
    xx: Vec<f32>,
    xy: Vec<f32>,
    yy: Vec<f32>,
}

#[inline]
pub(crate) fn reflect101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

fn binomial_row(order: usize) -> Vec<f32> {
    let mut row = vec![1.0f32];
    for _ in 0..order {
        let mut next = vec![0.0f32; row.len() + 1];
        for (i, &v) in row.iter().enumerate() {
            next[i] += v;
            next[i + 1] += v;
        }
        row = next;
    }
    row
}

/// First-derivative and smoothing kernels for an odd Sobel aperture.
pub fn sobel_kernels(aperture_size: usize) -> (Vec<f32>, Vec<f32>) {
    let smooth = binomial_row(aperture_size - 1);
    let base = binomial_row(aperture_size - 2);
    let deriv = (0..aperture_size)
        .map(|i| {
            let prev = if i > 0 { base.get(i - 1).copied().unwrap_or(0.0) } else { 0.0 };
            let cur = base.get(i).copied().unwrap_or(0.0);
            prev - cur
        })
        .collect();
    (deriv, smooth)
}

/// Horizontal then vertical correlation, both with reflect-101 borders.
fn separable_filter(src: &[f32], width: usize, height: usize, kx: &[f32], ky: &[f32]) -> Vec<f32> {
    let rx = (kx.len() / 2) as isize;
    let ry = (ky.len() / 2) as isize;

    let mut tmp = vec![0.0f32; width * height];
    tmp.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let src_row = &src[y * width..(y + 1) * width];
        for (x, out) in row.iter_mut().enumerate() {
            *out = kx
                .iter()
                .enumerate()
                .map(|(k, &w)| w * src_row[reflect101(x as isize + k as isize - rx, width)])
                .sum();
        }
    });

    let mut dst = vec![0.0f32; width * height];
    dst.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            *out = ky
                .iter()
                .enumerate()
                .map(|(k, &w)| {
                    let yy = reflect101(y as isize + k as isize - ry, height);
                    w * tmp[yy * width + x]
                })
                .sum();
        }
    });
    dst
}

/// Unnormalized box sum. Even sizes are anchored so the window covers
/// offsets `-(size / 2) ..= size - 1 - size / 2`.
fn box_sum(src: &[f32], width: usize, height: usize, size: usize) -> Vec<f32> {
    let ones = vec![1.0f32; size];
    let lo = (size / 2) as isize;
    let hi = (size - 1 - size / 2) as isize;
    if size % 2 == 1 {
        return separable_filter(src, width, height, &ones, &ones);
    }

    let mut tmp = vec![0.0f32; width * height];
    tmp.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let src_row = &src[y * width..(y + 1) * width];
        for (x, out) in row.iter_mut().enumerate() {
            *out = (-lo..=hi)
                .map(|d| src_row[reflect101(x as isize + d, width)])
                .sum();
        }
    });
    let mut dst = vec![0.0f32; width * height];
    dst.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            *out = (-lo..=hi)
                .map(|d| tmp[reflect101(y as isize + d, height) * width + x])
                .sum();
        }
    });
    dst
}

fn covariance(view: &ImageView<'_>, block_size: usize, aperture_size: usize) -> DetectResult<Covariance> {
    check_image(view)?;
    check_aperture(aperture_size)?;
    if block_size == 0 {
        return Err(DetectError::InvalidBlockSize(block_size));
    }

    let (w, h) = (view.width(), view.height());
    let scale = 1.0 / ((1u32 << (aperture_size - 1)) as f32 * block_size as f32 * 255.0);
    let src: Vec<f32> = view.data().iter().map(|&p| p as f32).collect();
    let (deriv, smooth) = sobel_kernels(aperture_size);

    let mut dx = separable_filter(&src, w, h, &deriv, &smooth);
    let mut dy = separable_filter(&src, w, h, &smooth, &deriv);
    dx.par_iter_mut().for_each(|v| *v *= scale);
    dy.par_iter_mut().for_each(|v| *v *= scale);

    let xx: Vec<f32> = dx.par_iter().map(|g| g * g).collect();
    let xy: Vec<f32> = dx.par_iter().zip(dy.par_iter()).map(|(a, b)| a * b).collect();
    let yy: Vec<f32> = dy.par_iter().map(|g| g * g).collect();

    Ok(Covariance {
        xx: box_sum(&xx, w, h, block_size),
        xy: box_sum(&xy, w, h, block_size),
        yy: box_sum(&yy, w, h, block_size),
    })
}

/// Harris measure `det(M) - k * trace(M)^2` at every pixel.
pub fn harris_response(
    view: &ImageView<'_>,
    block_size: usize,
    aperture_size: usize,
    k: f64,
) -> DetectResult<RawResponse> {
    let cov = covariance(view, block_size, aperture_size)?;
    let k = k as f32;
    let data = cov
        .xx
        .par_iter()
        .zip(cov.xy.par_iter())
        .zip(cov.yy.par_iter())
        .map(|((&a, &b), &c)| a * c - b * b - k * (a + c) * (a + c))
        .collect();
    Ok(RawResponse {
        rows: view.height(),
        cols: view.width(),
        data,
    })
}

/// Smaller eigenvalue of the covariance matrix at every pixel.
pub fn min_eigen_response(
    view: &ImageView<'_>,
    block_size: usize,
    aperture_size: usize,
) -> DetectResult<RawResponse> {
    let cov = covariance(view, block_size, aperture_size)?;
    let data = cov
        .xx
        .par_iter()
        .zip(cov.xy.par_iter())
        .zip(cov.yy.par_iter())
        .map(|((&xx, &b), &yy)| {
            let a = xx * 0.5;
            let c = yy * 0.5;
            (a + c) - ((a - c) * (a - c) + b * b).sqrt()
        })
        .collect();
    Ok(RawResponse {
        rows: view.height(),
        cols: view.width(),
        data,
    })
}

/// Min-max rescale into `[0, 255]`, then saturating absolute conversion to 8 bit.
///
/// A constant map becomes all zeros.
pub fn normalize_to_u8(raw: &RawResponse) -> ResponseMap {
    let (min, max) = raw
        .data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    let scale = if range > 0.0 { 255.0 / range } else { 0.0 };

    let data = raw
        .data
        .par_iter()
        .map(|&v| ((v - min) * scale).abs().round_ties_even().min(255.0) as u8)
        .collect();
    ResponseMap::new(raw.rows, raw.cols, data).unwrap_or_else(|| ResponseMap::zeros(raw.rows, raw.cols))
}

/// Harris score of a single pixel over a `block_size` window with 3x3 Sobel
/// gradients, as used to rank ORB candidates. The window must lie inside the
/// image with a one-pixel margin; callers filter by border first.
pub fn harris_score_at(view: &ImageView<'_>, x: usize, y: usize, block_size: usize, k: f32) -> f32 {
    let r = (block_size / 2) as i64;
    let scale = 1.0 / (4.0 * block_size as f32 * 255.0);
    let (mut a, mut b, mut c) = (0.0f32, 0.0f32, 0.0f32);

    for dy in -r..block_size as i64 - r {
        for dx in -r..block_size as i64 - r {
            let (px, py) = (x as i64 + dx, y as i64 + dy);
            let p = |ox: i64, oy: i64| view.at_clamped(px + ox, py + oy) as f32;
            let ix = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
            let iy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
            let (ix, iy) = (ix * scale, iy * scale);
            a += ix * ix;
            b += ix * iy;
            c += iy * iy;
        }
    }
    a * c - b * b - k * (a + c) * (a + c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camtrack_core::GrayFrame;

    fn bright_square(size: usize, lo: usize, hi: usize) -> GrayFrame {
        let mut img = GrayFrame::filled(size, size, 20);
        for y in lo..hi {
            for x in lo..hi {
                img.set(x, y, 220);
            }
        }
        img
    }

    #[test]
    fn sobel_kernels_match_known_taps() {
        let (d3, s3) = sobel_kernels(3);
        assert_eq!(d3, vec![-1.0, 0.0, 1.0]);
        assert_eq!(s3, vec![1.0, 2.0, 1.0]);
        let (d5, s5) = sobel_kernels(5);
        assert_eq!(d5, vec![-1.0, -2.0, 0.0, 2.0, 1.0]);
        assert_eq!(s5, vec![1.0, 4.0, 6.0, 4.0, 1.0]);
    }

    #[test]
    fn reflect101_mirrors_without_edge() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(3, 1), 0);
    }

    #[test]
    fn harris_peaks_near_square_corner() {
        let img = bright_square(32, 10, 22);
        let resp = harris_response(&img.view(), 2, 3, 0.04).unwrap();

        let (mut best, mut at) = (f32::NEG_INFINITY, (0, 0));
        for r in 0..resp.rows {
            for c in 0..resp.cols {
                if resp.at(r, c) > best {
                    best = resp.at(r, c);
                    at = (r, c);
                }
            }
        }
        let corners = [(10, 10), (10, 21), (21, 10), (21, 21)];
        assert!(
            corners
                .iter()
                .any(|&(r, c)| (at.0 as i64 - r).abs() <= 2 && (at.1 as i64 - c).abs() <= 2),
            "peak at {:?}",
            at
        );
        // Straight edges score negative, flat areas zero.
        assert!(resp.at(16, 10) < 0.0);
        assert_eq!(resp.at(2, 2), 0.0);
    }

    #[test]
    fn min_eigen_is_non_negative_and_flat_is_zero() {
        let img = bright_square(24, 8, 16);
        let resp = min_eigen_response(&img.view(), 4, 3).unwrap();
        assert!(resp.data.iter().all(|&v| v >= -1e-5));
        assert_eq!(resp.at(1, 1), 0.0);
        assert!(resp.at(8, 8) > resp.at(12, 8));
    }

    #[test]
    fn normalization_spans_full_range() {
        let raw = RawResponse {
            rows: 2,
            cols: 2,
            data: vec![-3.0, 0.0, 1.0, 5.0],
        };
        let map = normalize_to_u8(&raw);
        assert_eq!(map.at(0, 0), 0);
        assert_eq!(map.at(1, 1), 255);
        assert_eq!(map.at(0, 1), 96);
    }

    #[test]
    fn normalization_rounds_halves_to_even() {
        // Scale 255 / 510 = 0.5, so the middle values land exactly on halves.
        let raw = RawResponse {
            rows: 1,
            cols: 5,
            data: vec![0.0, 1.0, 3.0, 5.0, 510.0],
        };
        let map = normalize_to_u8(&raw);
        assert_eq!(map.data(), &[0, 0, 2, 2, 255]);
    }

    #[test]
    fn constant_map_normalizes_to_zero() {
        let raw = RawResponse {
            rows: 1,
            cols: 3,
            data: vec![7.0; 3],
        };
        assert!(normalize_to_u8(&raw).data().iter().all(|&v| v == 0));
    }

    #[test]
    fn rejects_bad_arguments() {
        let img = GrayFrame::filled(8, 8, 0);
        assert_eq!(
            harris_response(&img.view(), 2, 4, 0.04).unwrap_err(),
            DetectError::InvalidAperture(4)
        );
        assert_eq!(
            min_eigen_response(&img.view(), 0, 3).unwrap_err(),
            DetectError::InvalidBlockSize(0)
        );
        let empty = GrayFrame::filled(0, 4, 0);
        assert!(matches!(
            harris_response(&empty.view(), 2, 3, 0.04),
            Err(DetectError::InvalidImageSize { .. })
        ));
    }

    #[test]
    fn harris_score_positive_on_corner() {
        let img = bright_square(40, 15, 25);
        let view = img.view();
        assert!(harris_score_at(&view, 15, 15, 7, 0.04) > 0.0);
        assert_eq!(harris_score_at(&view, 5, 5, 7, 0.04), 0.0);
    }
}
