use camtrack_core::{run_by_image_border, Descriptors, ImageView, Keypoint, OrbParams};
use camtrack_detect::CircularPatch;
use imageproc::filter::gaussian_blur_f32;
use log::debug;
use rayon::prelude::*;

use crate::error::{DescribeError, DescribeResult};
use crate::pattern::SamplingPattern;
use crate::{pack_tests, to_gray_frame, to_gray_image};

const DESCRIPTOR_BYTES: usize = 32;
const SMOOTHING_SIGMA: f32 = 2.0;

/// Rotation- and scale-aware BRIEF.
///
/// Test pairs are rotated by the keypoint angle and scaled by
/// `size / patch_size`. Keypoints without an angle get one from the
/// intensity centroid of their patch; the returned keypoints are otherwise
/// passed through unchanged.
#[derive(Debug, Clone)]
pub struct OrbExtractor {
    params: OrbParams,
    pattern: SamplingPattern,
    patch: CircularPatch,
}

impl OrbExtractor {
    pub fn new(params: OrbParams, seed: u64) -> DescribeResult<Self> {
        if params.wta_k != 2 {
            return Err(DescribeError::InvalidParameter {
                name: "wta_k",
                reason: format!("only pairwise tests are supported, got {}", params.wta_k),
            });
        }
        let pattern = SamplingPattern::gaussian(DESCRIPTOR_BYTES * 8, params.patch_size, seed)?;
        let patch = CircularPatch::new(params.patch_size / 2);
        Ok(Self {
            params,
            pattern,
            patch,
        })
    }

    pub fn compute(
        &self,
        view: &ImageView<'_>,
        mut keypoints: Vec<Keypoint>,
    ) -> DescribeResult<(Vec<Keypoint>, Descriptors)> {
        let before = keypoints.len();
        run_by_image_border(&mut keypoints, view.width(), view.height(), self.params.edge_threshold);

        let smoothed = to_gray_frame(gaussian_blur_f32(&to_gray_image(view)?, SMOOTHING_SIGMA));
        let smoothed = smoothed.view();
        let patch_size = self.params.patch_size as f32;

        let rows: Vec<Vec<u8>> = keypoints
            .par_iter()
            .map(|kp| {
                let angle = kp
                    .angle
                    .unwrap_or_else(|| self.patch.angle(view, kp.x.round() as usize, kp.y.round() as usize));
                let (sin, cos) = angle.to_radians().sin_cos();
                let scale = if kp.size > 0.0 { kp.size / patch_size } else { 1.0 };
                let pairs = self.pattern.pairs().iter().map(|t| t.transformed(sin, cos, scale));
                pack_tests(&smoothed, kp.x, kp.y, pairs, DESCRIPTOR_BYTES)
            })
            .collect();

        debug!("orb descriptors: {} of {} keypoints described", keypoints.len(), before);
        Ok((keypoints, Descriptors::binary(DESCRIPTOR_BYTES, rows)))
    }
}
