use camtrack_core::{HarrisParams, ImageView, Keypoint, ResponseMap};
use log::debug;

use crate::error::{check_aperture, check_image, DetectError, DetectResult};
use crate::nms::try_suppress_non_maxima;
use crate::response::{harris_response, normalize_to_u8};

/// Harris corners: raw response, 8-bit min-max normalization, then NMS.
#[derive(Debug, Clone)]
pub struct HarrisDetector {
    params: HarrisParams,
}

impl HarrisDetector {
    pub fn new(params: HarrisParams) -> DetectResult<Self> {
        check_aperture(params.aperture_size)?;
        if params.block_size == 0 {
            return Err(DetectError::InvalidBlockSize(params.block_size));
        }
        if !(params.k.is_finite() && params.k > 0.0) {
            return Err(DetectError::InvalidParameter {
                name: "k",
                reason: format!("{} is not a positive number", params.k),
            });
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &HarrisParams {
        &self.params
    }

    /// Normalized response the keypoints are picked from.
    pub fn response_map(&self, view: &ImageView<'_>) -> DetectResult<ResponseMap> {
        check_image(view)?;
        let raw = harris_response(view, self.params.block_size, self.params.aperture_size, self.params.k)?;
        Ok(normalize_to_u8(&raw))
    }

    pub fn detect(&self, view: &ImageView<'_>) -> DetectResult<Vec<Keypoint>> {
        let map = self.response_map(view)?;
        let keypoints = try_suppress_non_maxima(&map, self.params.aperture_size, self.params.min_response)?;
        debug!(
            "harris: {} keypoints on {}x{} (radius {})",
            keypoints.len(),
            view.width(),
            view.height(),
            self.params.nms_radius()
        );
        Ok(keypoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camtrack_core::GrayFrame;

    fn squares() -> GrayFrame {
        let mut img = GrayFrame::filled(64, 48, 30);
        for y in 12..30 {
            for x in 20..44 {
                img.set(x, y, 200);
            }
        }
        img
    }

    #[test]
    fn strongest_keypoint_sits_on_a_corner() {
        let detector = HarrisDetector::new(HarrisParams::default()).unwrap();
        let img = squares();
        let kps = detector.detect(&img.view()).unwrap();
        assert!(!kps.is_empty());

        let best = kps.iter().max_by(|a, b| a.response.total_cmp(&b.response)).unwrap();
        assert_eq!(best.response, 255.0);
        let corners = [(20.0, 12.0), (43.0, 12.0), (20.0, 29.0), (43.0, 29.0)];
        assert!(corners
            .iter()
            .any(|&(cx, cy): &(f32, f32)| (best.x - cx).abs() <= 2.0 && (best.y - cy).abs() <= 2.0));
        assert!(kps.iter().all(|k| k.size == 6.0 && k.angle.is_none()));
    }

    #[test]
    fn flat_image_has_no_corners() {
        let detector = HarrisDetector::new(HarrisParams::default()).unwrap();
        let img = GrayFrame::filled(32, 32, 90);
        assert!(detector.detect(&img.view()).unwrap().is_empty());
    }

    #[test]
    fn rejects_even_aperture() {
        let params = HarrisParams {
            aperture_size: 2,
            ..HarrisParams::default()
        };
        assert_eq!(HarrisDetector::new(params).unwrap_err(), DetectError::InvalidAperture(2));
    }

    #[test]
    fn response_map_has_image_shape() {
        let detector = HarrisDetector::new(HarrisParams::default()).unwrap();
        let img = squares();
        let map = detector.response_map(&img.view()).unwrap();
        assert_eq!((map.rows(), map.cols()), (48, 64));
        assert_eq!(map.data().iter().max(), Some(&255));
    }
}
