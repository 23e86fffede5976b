//! Binary descriptors for camtrack keypoints.
//!
//! Both extractors smooth the frame once, drop keypoints whose patch would
//! leave the image and pack one bit per intensity test, LSB first.

pub mod brief;
pub mod error;
pub mod orb;
pub mod pattern;

pub use brief::BriefExtractor;
pub use error::{DescribeError, DescribeResult};
pub use orb::OrbExtractor;
pub use pattern::{SamplingPattern, TestPair};

use camtrack_core::{GrayFrame, ImageView};
use image::GrayImage;

pub(crate) fn to_gray_image(view: &ImageView<'_>) -> DescribeResult<GrayImage> {
    GrayImage::from_raw(view.width() as u32, view.height() as u32, view.data().to_vec()).ok_or(
        DescribeError::InvalidImage {
            width: view.width(),
            height: view.height(),
            len: view.data().len(),
        },
    )
}

pub(crate) fn to_gray_frame(img: GrayImage) -> GrayFrame {
    let (w, h) = img.dimensions();
    GrayFrame {
        width: w as usize,
        height: h as usize,
        data: img.into_raw(),
    }
}

/// Runs every test of `pairs` around `(cx, cy)` and packs the results.
pub(crate) fn pack_tests(
    smoothed: &ImageView<'_>,
    cx: f32,
    cy: f32,
    pairs: impl Iterator<Item = TestPair>,
    bytes: usize,
) -> Vec<u8> {
    let mut d = vec![0u8; bytes];
    let sample = |dx: f32, dy: f32| smoothed.at_clamped((cx + dx).round() as i64, (cy + dy).round() as i64);
    for (i, t) in pairs.enumerate().take(bytes * 8) {
        let bit = (sample(t.x1, t.y1) < sample(t.x2, t.y2)) as u8;
        d[i / 8] |= bit << (i % 8);
    }
    d
}
