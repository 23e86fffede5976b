use camtrack_core::{GrayFrame, ImageView, OrbParams};

/// One level of the scale pyramid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLevel {
    pub level: usize,
    /// Level-0 pixels per level pixel.
    pub scale: f32,
    pub width: usize,
    pub height: usize,
}

/// Levels `0..n_levels`, stopping early once a level has no room left
/// inside the edge border.
pub fn scale_levels(width: usize, height: usize, params: &OrbParams) -> Vec<ScaleLevel> {
    let min_side = 2 * params.edge_threshold + 1;
    let mut levels = Vec::with_capacity(params.n_levels);
    let mut scale = 1.0f32;

    for level in 0..params.n_levels {
        let w = (width as f32 / scale).round() as usize;
        let h = (height as f32 / scale).round() as usize;
        if w < min_side || h < min_side {
            break;
        }
        levels.push(ScaleLevel {
            level,
            scale,
            width: w,
            height: h,
        });
        scale *= params.scale_factor;
    }
    levels
}

/// Per-level feature quotas, a geometric series summing to `n_features`.
pub fn features_per_level(params: &OrbParams) -> Vec<usize> {
    let n_levels = params.n_levels.max(1);
    let factor = 1.0 / params.scale_factor as f64;
    let mut desired = params.n_features as f64 * (1.0 - factor) / (1.0 - factor.powi(n_levels as i32));
    let mut quotas = Vec::with_capacity(n_levels);
    let mut sum = 0usize;

    for _ in 0..n_levels - 1 {
        let n = desired.round() as usize;
        quotas.push(n);
        sum += n;
        desired *= factor;
    }
    quotas.push(params.n_features.saturating_sub(sum));
    quotas
}

/// Builds every level by bilinear resampling of level 0.
pub fn build_pyramid(view: &ImageView<'_>, levels: &[ScaleLevel]) -> Vec<GrayFrame> {
    levels
        .iter()
        .map(|lvl| {
            if lvl.level == 0 {
                GrayFrame {
                    width: view.width(),
                    height: view.height(),
                    data: view.data().to_vec(),
                }
            } else {
                downsample(view, lvl.width, lvl.height)
            }
        })
        .collect()
}

fn downsample(view: &ImageView<'_>, target_width: usize, target_height: usize) -> GrayFrame {
    let x_ratio = view.width() as f32 / target_width as f32;
    let y_ratio = view.height() as f32 / target_height as f32;
    let mut data = Vec::with_capacity(target_width * target_height);

    for y in 0..target_height {
        for x in 0..target_width {
            data.push(bilinear_sample(view, x as f32 * x_ratio, y as f32 * y_ratio).round() as u8);
        }
    }
    GrayFrame {
        width: target_width,
        height: target_height,
        data,
    }
}

fn bilinear_sample(view: &ImageView<'_>, x: f32, y: f32) -> f32 {
    let x1 = (x.floor() as usize).min(view.width() - 1);
    let y1 = (y.floor() as usize).min(view.height() - 1);
    let x2 = (x1 + 1).min(view.width() - 1);
    let y2 = (y1 + 1).min(view.height() - 1);

    let fx = x - x1 as f32;
    let fy = y - y1 as f32;

    let top = view.at(x1, y1) as f32 * (1.0 - fx) + view.at(x2, y1) as f32 * fx;
    let bottom = view.at(x1, y2) as f32 * (1.0 - fx) + view.at(x2, y2) as f32 * fx;
    top * (1.0 - fy) + bottom * fy
}
