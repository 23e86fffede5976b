//! Keypoint and match images written next to a run.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use camtrack_core::{FeatureMatch, GrayFrame, Keypoint};
use image::{imageops, DynamicImage, GrayImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};

use crate::{PipelineError, PipelineResult};

const KEYPOINT_COLOUR: Rgba<u8> = Rgba([255, 0, 0, 255]);

const MATCH_PALETTE: [Rgba<u8>; 6] = [
    Rgba([0, 255, 0, 255]),
    Rgba([255, 255, 0, 255]),
    Rgba([0, 200, 255, 255]),
    Rgba([255, 0, 255, 255]),
    Rgba([255, 128, 0, 255]),
    Rgba([128, 128, 255, 255]),
];

fn to_rgba(frame: &GrayFrame) -> PipelineResult<RgbaImage> {
    let gray = GrayImage::from_raw(frame.width as u32, frame.height as u32, frame.data.clone())
        .ok_or_else(|| PipelineError::Config(format!("frame buffer does not hold {}x{} pixels", frame.width, frame.height)))?;
    Ok(DynamicImage::ImageLuma8(gray).into_rgba8())
}

/// Circle of the keypoint's size plus a radius showing its orientation.
fn draw_keypoint(canvas: &mut RgbaImage, kp: &Keypoint, dx: f32, colour: Rgba<u8>) {
    let (x, y) = (kp.x + dx, kp.y);
    let radius = (kp.size / 2.0).round().max(3.0);
    draw_hollow_circle_mut(canvas, (x as i32, y as i32), radius as i32, colour);
    if let Some(angle) = kp.angle {
        let (sin, cos) = angle.to_radians().sin_cos();
        draw_line_segment_mut(canvas, (x, y), (x + radius * cos, y + radius * sin), colour);
    }
}

/// The frame in colour with every keypoint circled in red.
pub fn draw_keypoints(frame: &GrayFrame, keypoints: &[Keypoint]) -> PipelineResult<RgbaImage> {
    let mut output = to_rgba(frame)?;
    for kp in keypoints {
        draw_keypoint(&mut output, kp, 0.0, KEYPOINT_COLOUR);
    }
    Ok(output)
}

/// Previous frame on the left, current on the right, one line per match.
pub fn draw_matches(
    previous: (&GrayFrame, &[Keypoint]),
    current: (&GrayFrame, &[Keypoint]),
    matches: &[FeatureMatch],
) -> PipelineResult<RgbaImage> {
    let (left, right) = (to_rgba(previous.0)?, to_rgba(current.0)?);
    let offset = left.width();
    let mut canvas = RgbaImage::new(offset + right.width(), left.height().max(right.height()));
    imageops::replace(&mut canvas, &left, 0, 0);
    imageops::replace(&mut canvas, &right, offset as i64, 0);

    let dx = offset as f32;
    for (n, m) in matches.iter().enumerate() {
        let (Some(a), Some(b)) = (previous.1.get(m.query_idx), current.1.get(m.train_idx)) else {
            continue;
        };
        let colour = MATCH_PALETTE[n % MATCH_PALETTE.len()];
        draw_keypoint(&mut canvas, a, 0.0, colour);
        draw_keypoint(&mut canvas, b, dx, colour);
        draw_line_segment_mut(&mut canvas, (a.x, a.y), (b.x + dx, b.y), colour);
    }
    Ok(canvas)
}

pub fn keypoints_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("keypoints_{index:04}.png"))
}

pub fn matches_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("matches_{index:04}.png"))
}

pub fn save(image: &RgbaImage, path: &Path) -> PipelineResult<()> {
    image.save(path).map_err(|source| PipelineError::Image {
        path: path.display().to_string(),
        source,
    })
}

/// Blocks until the user presses Enter.
pub fn wait_for_enter() -> PipelineResult<()> {
    print!("Press Enter to continue to next image");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}
