//! Keypoint detectors for camtrack.
//!
//! The centre of this crate is the Harris non-maximum suppression in
//! [`nms`]: an exact neighbourhood scan plus a separable variant that gives
//! identical output. Around it sit the corner responses and the natively
//! implemented detectors (Shi-Tomasi, Harris, FAST, ORB).

pub mod error;
pub mod fast;
pub mod harris;
pub mod nms;
pub mod orb;
pub mod orientation;
pub mod pyramid;
pub mod response;
pub mod shi_tomasi;

pub use error::{DetectError, DetectResult};
pub use fast::FastDetector;
pub use harris::HarrisDetector;
pub use nms::{suppress_non_maxima, suppress_non_maxima_fast, try_suppress_non_maxima};
pub use orb::OrbDetector;
pub use orientation::CircularPatch;
pub use response::{harris_response, min_eigen_response, normalize_to_u8, RawResponse};
pub use shi_tomasi::ShiTomasiDetector;

use camtrack_core::ImageView;

/// Wraps raw pixels, reporting size problems as [`DetectError`]s.
pub fn image_view(data: &[u8], width: usize, height: usize) -> DetectResult<ImageView<'_>> {
    if width == 0 || height == 0 {
        return Err(DetectError::InvalidImageSize { width, height });
    }
    ImageView::new(data, width, height).ok_or(DetectError::InvalidImageData {
        expected_len: width * height,
        actual_len: data.len(),
    })
}
