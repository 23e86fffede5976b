#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Detected point of interest.
///
/// Coordinates are in level-0 pixels. `angle` is in degrees, `None` when the
/// detector does not estimate orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Diameter of the meaningful neighbourhood.
    pub size: f32,
    pub angle: Option<f32>,
    pub response: f32,
    /// Pyramid level the keypoint was found on.
    pub octave: i32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            x,
            y,
            size,
            angle: None,
            response: 0.0,
            octave: 0,
        }
    }

    pub fn with_response(mut self, response: f32) -> Self {
        self.response = response;
        self
    }

    pub fn with_angle(mut self, degrees: f32) -> Self {
        self.angle = Some(degrees);
        self
    }

    pub fn with_octave(mut self, octave: i32) -> Self {
        self.octave = octave;
        self
    }
}

/// Keeps the `n` strongest keypoints, stable with respect to input order on ties.
pub fn retain_best(keypoints: &mut Vec<Keypoint>, n: usize) {
    if keypoints.len() <= n {
        return;
    }
    keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));
    keypoints.truncate(n);
}

/// Drops keypoints closer than `border` pixels to any image edge.
pub fn run_by_image_border(keypoints: &mut Vec<Keypoint>, width: usize, height: usize, border: usize) {
    if border == 0 {
        return;
    }
    if width <= 2 * border || height <= 2 * border {
        keypoints.clear();
        return;
    }
    let (lo, hi_x, hi_y) = (border as f32, (width - border) as f32, (height - border) as f32);
    keypoints.retain(|kp| kp.x >= lo && kp.x < hi_x && kp.y >= lo && kp.y < hi_y);
}
