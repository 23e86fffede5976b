use camtrack_core::{ImageView, Keypoint, ShiTomasiParams};
use log::debug;
use rayon::prelude::*;

use crate::error::{check_image, DetectError, DetectResult};
use crate::response::min_eigen_response;

const GRADIENT_APERTURE: usize = 3;

/// Good features to track: minimum-eigenvalue corners with a greedy
/// minimum-distance filter, strongest first.
#[derive(Debug, Clone)]
pub struct ShiTomasiDetector {
    params: ShiTomasiParams,
}

impl ShiTomasiDetector {
    pub fn new(params: ShiTomasiParams) -> DetectResult<Self> {
        if params.block_size == 0 {
            return Err(DetectError::InvalidBlockSize(params.block_size));
        }
        if !(params.quality_level > 0.0 && params.quality_level <= 1.0) {
            return Err(DetectError::InvalidParameter {
                name: "quality_level",
                reason: format!("{} is outside (0, 1]", params.quality_level),
            });
        }
        if !(0.0..=1.0).contains(&params.max_overlap) {
            return Err(DetectError::InvalidParameter {
                name: "max_overlap",
                reason: format!("{} is outside [0, 1]", params.max_overlap),
            });
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &ShiTomasiParams {
        &self.params
    }

    /// Keypoints ordered by decreasing response.
    pub fn detect(&self, view: &ImageView<'_>) -> DetectResult<Vec<Keypoint>> {
        check_image(view)?;
        let eig = min_eigen_response(view, self.params.block_size, GRADIENT_APERTURE)?;
        let (rows, cols) = (eig.rows, eig.cols);
        let max = eig.max();
        if rows < 3 || cols < 3 || max <= 0.0 {
            return Ok(Vec::new());
        }
        let threshold = max * self.params.quality_level as f32;

        // Local 3x3 maxima above threshold, as (response, row, col).
        let mut candidates: Vec<(f32, usize, usize)> = (1..rows - 1)
            .into_par_iter()
            .flat_map_iter(|y| {
                let eig = &eig;
                (1..cols - 1).filter_map(move |x| {
                    let v = eig.at(y, x);
                    if v <= threshold {
                        return None;
                    }
                    let is_max = (y - 1..=y + 1)
                        .all(|yy| (x - 1..=x + 1).all(|xx| eig.at(yy, xx) <= v));
                    is_max.then_some((v, y, x))
                })
            })
            .collect();

        // Equal responses: later pixels first.
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then((b.1, b.2).cmp(&(a.1, a.2))));

        let max_corners = self.params.max_corners(rows, cols);
        let min_distance = self.params.min_distance();
        let keypoints = if min_distance >= 1.0 {
            spread_out(&candidates, rows, cols, min_distance, max_corners)
        } else {
            candidates.iter().take(max_corners).copied().collect()
        };

        debug!(
            "shi-tomasi: {} of {} candidates kept (min distance {})",
            keypoints.len(),
            candidates.len(),
            min_distance
        );
        let size = self.params.block_size as f32;
        Ok(keypoints
            .into_iter()
            .map(|(v, y, x)| Keypoint::new(x as f32, y as f32, size).with_response(v))
            .collect())
    }
}

/// Greedy acceptance on a grid of `min_distance` cells: a candidate is kept
/// unless an accepted corner lies strictly closer than `min_distance`.
fn spread_out(
    candidates: &[(f32, usize, usize)],
    rows: usize,
    cols: usize,
    min_distance: f64,
    max_corners: usize,
) -> Vec<(f32, usize, usize)> {
    let cell = min_distance.round().max(1.0) as usize;
    let grid_w = cols.div_ceil(cell);
    let grid_h = rows.div_ceil(cell);
    let mut grid: Vec<Vec<(usize, usize)>> = vec![Vec::new(); grid_w * grid_h];
    let min_d2 = min_distance * min_distance;
    let mut kept = Vec::new();

    for &(v, y, x) in candidates {
        let (gx, gy) = (x / cell, y / cell);
        let close = (gy.saturating_sub(1)..=(gy + 1).min(grid_h - 1)).any(|yy| {
            (gx.saturating_sub(1)..=(gx + 1).min(grid_w - 1)).any(|xx| {
                grid[yy * grid_w + xx].iter().any(|&(py, px)| {
                    let dx = px as f64 - x as f64;
                    let dy = py as f64 - y as f64;
                    dx * dx + dy * dy < min_d2
                })
            })
        });
        if close {
            continue;
        }
        grid[gy * grid_w + gx].push((y, x));
        kept.push((v, y, x));
        if kept.len() == max_corners {
            break;
        }
    }
    kept
}
