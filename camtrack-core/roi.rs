//! Keypoint filters applied between detection and description.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{DetectorKind, Keypoint};

/// Axis-aligned rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region covering the preceding vehicle in the KITTI sequence.
    pub fn preceding_vehicle() -> Self {
        Self::new(535.0, 180.0, 180.0, 150.0)
    }

    /// Half-open containment: left/top edges inside, right/bottom outside.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::preceding_vehicle()
    }
}

/// Keeps only keypoints inside `roi`, preserving order.
pub fn retain_in_roi(keypoints: &mut Vec<Keypoint>, roi: &Rect) {
    keypoints.retain(|kp| roi.contains(kp.x, kp.y));
}

/// Truncates to the first `max` keypoints.
///
/// Only detectors that emit keypoints ordered by strength support limiting;
/// for the others the list is left untouched and `false` is returned.
pub fn limit_keypoints(keypoints: &mut Vec<Keypoint>, detector: DetectorKind, max: usize) -> bool {
    match detector {
        DetectorKind::ShiTomasi => {
            keypoints.truncate(max);
            true
        }
        _ => false,
    }
}
