use camtrack_core::{FastParams, ImageView, Keypoint};
use log::debug;
use rayon::prelude::*;

use crate::error::{check_image, DetectError, DetectResult};

/// Bresenham circle of radius 3, clockwise from 12 o'clock.
pub const FAST_OFFSETS: [(i32, i32); 16] = [
    (0, -3), (1, -3), (2, -2), (3, -1),
    (3, 0), (3, 1), (2, 2), (1, 3),
    (0, 3), (-1, 3), (-2, 2), (-3, 1),
    (-3, 0), (-3, -1), (-2, -2), (-1, -3),
];

const BORDER: usize = 3;
const KEYPOINT_SIZE: f32 = 7.0;

/// True when the 16-bit circular mask holds a run of at least `min_count` set bits.
pub fn has_consecutive_bits(mask: u16, min_count: usize) -> bool {
    if min_count == 0 || min_count > 16 {
        return false;
    }
    let mut run = mask;
    for i in 1..min_count {
        run &= mask.rotate_left(i as u32);
        if run == 0 {
            return false;
        }
    }
    run != 0
}

/// Largest threshold for which the pixel would still pass the segment test,
/// or a negative value when it never does.
fn corner_score(diffs: &[i32; 16], arc: usize) -> i32 {
    let mut best = i32::MIN;
    for start in 0..16 {
        let (mut bright, mut dark) = (i32::MAX, i32::MAX);
        for k in 0..arc {
            let d = diffs[(start + k) % 16];
            bright = bright.min(d);
            dark = dark.min(-d);
        }
        best = best.max(bright).max(dark);
    }
    best - 1
}

/// FAST segment-test corners.
#[derive(Debug, Clone)]
pub struct FastDetector {
    params: FastParams,
}

impl FastDetector {
    pub fn new(params: FastParams) -> DetectResult<Self> {
        if !(1..=16).contains(&params.arc_length) {
            return Err(DetectError::InvalidParameter {
                name: "arc_length",
                reason: format!("{} is outside 1..=16", params.arc_length),
            });
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &FastParams {
        &self.params
    }

    /// Corner score per pixel; zero for pixels that fail the test or lie in the border.
    pub fn score_map(&self, view: &ImageView<'_>) -> Vec<i32> {
        let (w, h) = (view.width(), view.height());
        let mut scores = vec![0i32; w * h];
        if w < 2 * BORDER + 1 || h < 2 * BORDER + 1 {
            return scores;
        }
        let t = self.params.threshold as i32;
        let arc = self.params.arc_length;

        scores
            .par_chunks_mut(w)
            .enumerate()
            .skip(BORDER)
            .take(h - 2 * BORDER)
            .for_each(|(y, row)| {
                for x in BORDER..w - BORDER {
                    let p = view.at(x, y) as i32;
                    let mut diffs = [0i32; 16];
                    let (mut bright, mut dark) = (0u16, 0u16);
                    for (i, &(dx, dy)) in FAST_OFFSETS.iter().enumerate() {
                        let q = view.at((x as i32 + dx) as usize, (y as i32 + dy) as usize) as i32;
                        diffs[i] = q - p;
                        if q > p + t {
                            bright |= 1 << i;
                        } else if q < p - t {
                            dark |= 1 << i;
                        }
                    }
                    if has_consecutive_bits(bright, arc) || has_consecutive_bits(dark, arc) {
                        row[x] = corner_score(&diffs, arc).max(1);
                    }
                }
            });
        scores
    }

    /// Keypoints in row-major order, response set to the corner score.
    ///
    /// With suppression on, a corner survives when no 8-neighbour scores
    /// higher; among equal neighbours the first in scan order wins.
    pub fn detect(&self, view: &ImageView<'_>) -> DetectResult<Vec<Keypoint>> {
        check_image(view)?;
        let (w, h) = (view.width(), view.height());
        let scores = self.score_map(view);
        let nonmax = self.params.nonmax_suppression;

        let keypoints: Vec<Keypoint> = (0..h)
            .into_par_iter()
            .flat_map_iter(|y| {
                let scores = &scores;
                (0..w).filter_map(move |x| {
                    let s = scores[y * w + x];
                    if s == 0 {
                        return None;
                    }
                    if nonmax {
                        let beaten = (y - 1..=y + 1).any(|yy| {
                            (x - 1..=x + 1).any(|xx| {
                                let n = scores[yy * w + xx];
                                n > s || (n == s && (yy, xx) < (y, x))
                            })
                        });
                        if beaten {
                            return None;
                        }
                    }
                    Some(Keypoint::new(x as f32, y as f32, KEYPOINT_SIZE).with_response(s as f32))
                })
            })
            .collect();

        debug!("fast: {} keypoints (threshold {})", keypoints.len(), self.params.threshold);
        Ok(keypoints)
    }
}
