//! Shared data model for the camtrack workspace.
//!
//! Everything that crosses a crate boundary lives here: grayscale frames and
//! response maps, keypoints, descriptor matrices, matches, the closed set of
//! detector / descriptor / matcher kinds, their parameter bundles and the
//! ring buffer that holds the most recent frames.

pub mod buffer;
pub mod descriptor;
pub mod keypoint;
pub mod kinds;
pub mod params;
pub mod roi;

pub use buffer::{DataFrame, FrameBuffer};
pub use descriptor::{Descriptors, DistanceNorm, FeatureMatch};
pub use keypoint::{retain_best, run_by_image_border, Keypoint};
pub use kinds::{
    DescriptorKind, DetectorKind, KindSelection, MatcherKind, ParseKindError, SelectorKind,
};
pub use params::{
    AkazeParams, BriefParams, BriskParams, DescriptorParams, DetectorParams, FastParams,
    FreakParams, HarrisParams, MatchParams, OrbParams, ShiTomasiParams, SiftParams,
};
pub use roi::{limit_keypoints, retain_in_roi, Rect};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Borrowed row-major 8-bit grayscale image
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
}

impl<'a> ImageView<'a> {
    /// Wraps `data`, returning `None` when its length is not `width * height`.
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel at column `x`, row `y`.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Pixel with coordinates clamped into the image.
    #[inline]
    pub fn at_clamped(&self, x: i64, y: i64) -> u8 {
        let xx = x.clamp(0, self.width as i64 - 1) as usize;
        let yy = y.clamp(0, self.height as i64 - 1) as usize;
        self.at(xx, yy)
    }

    pub fn row(&self, y: usize) -> &'a [u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }
}

/// Owned grayscale frame as loaded from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayFrame {
    /// Returns `None` when `data` does not hold exactly `width * height` pixels.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == width * height).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
        }
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }
}

/// Normalized 8-bit corner response, one value per source pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResponseMap {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl ResponseMap {
    /// Returns `None` when `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<u8>) -> Option<Self> {
        (data.len() == rows * cols).then_some(Self { rows, cols, data })
    }

    /// Builds a map from nested rows. Ragged input yields `None`.
    pub fn from_rows(rows: &[Vec<u8>]) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let data = rows.iter().flatten().copied().collect();
        Some(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Value at row `r`, column `c`.
    #[inline]
    pub fn at(&self, r: usize, c: usize) -> u8 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, value: u8) {
        self.data[r * self.cols + c] = value;
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    let n_threads = n_threads.max(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()?;
    log::debug!("rayon pool started with {n_threads} threads");
    Ok(())
}

/// Default worker count: one per logical CPU.
pub fn default_threads() -> usize {
    num_cpus::get().max(1)
}
