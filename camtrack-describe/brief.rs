use camtrack_core::{run_by_image_border, BriefParams, Descriptors, ImageView, Keypoint};
use imageproc::filter::box_filter;
use log::debug;
use rayon::prelude::*;

use crate::error::{DescribeError, DescribeResult};
use crate::pattern::SamplingPattern;
use crate::{pack_tests, to_gray_frame, to_gray_image};

const PATCH_SIZE: usize = 48;
const KERNEL_SIZE: usize = 9;

/// BRIEF over a box-smoothed image.
#[derive(Debug, Clone)]
pub struct BriefExtractor {
    params: BriefParams,
    pattern: SamplingPattern,
}

impl BriefExtractor {
    pub fn new(params: BriefParams, seed: u64) -> DescribeResult<Self> {
        if !matches!(params.bytes, 16 | 32 | 64) {
            return Err(DescribeError::InvalidParameter {
                name: "bytes",
                reason: format!("{} is not one of 16, 32, 64", params.bytes),
            });
        }
        let pattern = SamplingPattern::gaussian(params.bytes * 8, PATCH_SIZE, seed)?;
        Ok(Self { params, pattern })
    }

    /// Keypoints closer than this to any edge are dropped.
    pub fn border(&self) -> usize {
        PATCH_SIZE / 2 + KERNEL_SIZE / 2
    }

    /// Describes the keypoints that survive the border filter; the returned
    /// keypoints line up with the descriptor rows.
    pub fn compute(
        &self,
        view: &ImageView<'_>,
        mut keypoints: Vec<Keypoint>,
    ) -> DescribeResult<(Vec<Keypoint>, Descriptors)> {
        let before = keypoints.len();
        run_by_image_border(&mut keypoints, view.width(), view.height(), self.border());

        let smoothed = to_gray_frame(box_filter(&to_gray_image(view)?, (KERNEL_SIZE / 2) as u32, (KERNEL_SIZE / 2) as u32));
        let smoothed = smoothed.view();
        let bytes = self.params.bytes;

        let rows: Vec<Vec<u8>> = keypoints
            .par_iter()
            .map(|kp| {
                let (sin, cos) = match kp.angle {
                    Some(deg) if self.params.use_orientation => deg.to_radians().sin_cos(),
                    _ => (0.0, 1.0),
                };
                let pairs = self.pattern.pairs().iter().map(|t| t.transformed(sin, cos, 1.0));
                pack_tests(&smoothed, kp.x, kp.y, pairs, bytes)
            })
            .collect();

        debug!("brief: {} of {} keypoints described", keypoints.len(), before);
        Ok((keypoints, Descriptors::binary(bytes, rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camtrack_core::GrayFrame;

    fn textured(width: usize, height: usize, shift: usize) -> GrayFrame {
        let mut img = GrayFrame::filled(width, height, 0);
        for y in 0..height {
            for x in 0..width {
                let (u, v) = (x + 1000 - shift, y);
                img.set(x, y, ((u * 31 + v * 17 + (u * v) % 23) % 251) as u8);
            }
        }
        img
    }

    #[test]
    fn drops_border_keypoints() {
        let ex = BriefExtractor::new(BriefParams::default(), 3).unwrap();
        let img = textured(100, 100, 0);
        let kps = vec![
            Keypoint::new(10.0, 50.0, 7.0),
            Keypoint::new(50.0, 50.0, 7.0),
            Keypoint::new(72.0, 50.0, 7.0),
        ];
        let (kept, desc) = ex.compute(&img.view(), kps).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].x, 50.0);
        assert_eq!(desc.len(), 1);
        assert_eq!(desc.row_width(), 32);
    }

    #[test]
    fn deterministic_and_translation_invariant() {
        let ex = BriefExtractor::new(BriefParams::default(), 3).unwrap();
        let a = textured(120, 100, 0);
        let b = textured(120, 100, 10);
        let (_, da) = ex.compute(&a.view(), vec![Keypoint::new(50.0, 50.0, 7.0)]).unwrap();
        let (_, da2) = ex.compute(&a.view(), vec![Keypoint::new(50.0, 50.0, 7.0)]).unwrap();
        let (_, db) = ex.compute(&b.view(), vec![Keypoint::new(60.0, 50.0, 7.0)]).unwrap();
        assert_eq!(da, da2);
        assert_eq!(da, db);
    }

    #[test]
    fn different_patches_differ() {
        let ex = BriefExtractor::new(BriefParams::default(), 3).unwrap();
        let img = textured(120, 120, 0);
        let (_, d) = ex
            .compute(&img.view(), vec![Keypoint::new(40.0, 40.0, 7.0), Keypoint::new(80.0, 70.0, 7.0)])
            .unwrap();
        assert_ne!(d.binary_row(0), d.binary_row(1));
    }

    #[test]
    fn rejects_odd_length() {
        let params = BriefParams {
            bytes: 20,
            ..BriefParams::default()
        };
        assert!(BriefExtractor::new(params, 0).is_err());
    }
}
