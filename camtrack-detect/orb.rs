use camtrack_core::{retain_best, run_by_image_border, FastParams, ImageView, Keypoint, OrbParams};
use log::debug;
use rayon::prelude::*;

use crate::error::{check_image, DetectError, DetectResult};
use crate::fast::FastDetector;
use crate::orientation::CircularPatch;
use crate::pyramid::{build_pyramid, features_per_level, scale_levels};
use crate::response::harris_score_at;

const HARRIS_BLOCK: usize = 7;
const HARRIS_K: f32 = 0.04;

/// Multi-scale oriented FAST, ranked by Harris score.
#[derive(Debug, Clone)]
pub struct OrbDetector {
    params: OrbParams,
    fast: FastDetector,
    patch: CircularPatch,
}

impl OrbDetector {
    pub fn new(params: OrbParams) -> DetectResult<Self> {
        if !(params.scale_factor > 1.0) {
            return Err(DetectError::InvalidParameter {
                name: "scale_factor",
                reason: format!("{} must be greater than 1", params.scale_factor),
            });
        }
        if params.n_levels == 0 {
            return Err(DetectError::InvalidParameter {
                name: "n_levels",
                reason: "at least one pyramid level is required".to_string(),
            });
        }
        if params.patch_size < 2 {
            return Err(DetectError::InvalidParameter {
                name: "patch_size",
                reason: format!("{} is too small", params.patch_size),
            });
        }
        let fast = FastDetector::new(FastParams {
            threshold: params.fast_threshold,
            nonmax_suppression: true,
            arc_length: 9,
        })?;
        let patch = CircularPatch::new(params.patch_size / 2);
        Ok(Self { params, fast, patch })
    }

    pub fn params(&self) -> &OrbParams {
        &self.params
    }

    /// Keypoints in level-0 coordinates, grouped by pyramid level.
    pub fn detect(&self, view: &ImageView<'_>) -> DetectResult<Vec<Keypoint>> {
        check_image(view)?;
        let levels = scale_levels(view.width(), view.height(), &self.params);
        let quotas = features_per_level(&self.params);
        let pyramid = build_pyramid(view, &levels);

        let per_level: Vec<Vec<Keypoint>> = levels
            .par_iter()
            .zip(pyramid.par_iter())
            .map(|(lvl, frame)| -> DetectResult<Vec<Keypoint>> {
                let quota = quotas.get(lvl.level).copied().unwrap_or(0);
                let level_view = frame.view();
                let mut kps = self.fast.detect(&level_view)?;
                run_by_image_border(&mut kps, lvl.width, lvl.height, self.params.edge_threshold);

                if self.params.harris_score {
                    retain_best(&mut kps, 2 * quota);
                    for kp in kps.iter_mut() {
                        kp.response = harris_score_at(&level_view, kp.x as usize, kp.y as usize, HARRIS_BLOCK, HARRIS_K);
                    }
                }
                retain_best(&mut kps, quota);

                Ok(kps
                    .into_iter()
                    .map(|kp| {
                        let angle = self.patch.angle(&level_view, kp.x as usize, kp.y as usize);
                        Keypoint::new(
                            kp.x * lvl.scale,
                            kp.y * lvl.scale,
                            self.params.patch_size as f32 * lvl.scale,
                        )
                        .with_response(kp.response)
                        .with_angle(angle)
                        .with_octave(lvl.level as i32)
                    })
                    .collect())
            })
            .collect::<DetectResult<_>>()?;

        let keypoints: Vec<Keypoint> = per_level.into_iter().flatten().collect();
        debug!("orb: {} keypoints over {} levels", keypoints.len(), levels.len());
        Ok(keypoints)
    }
}
