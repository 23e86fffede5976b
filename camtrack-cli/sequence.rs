//! Frame file naming and loading.

use std::path::{Path, PathBuf};

use camtrack_core::GrayFrame;
use image::ImageReader;

use crate::config::PipelineConfig;
use crate::{PipelineError, PipelineResult};

/// `{data_dir}/{prefix}{index padded to fill_width}{extension}`
pub fn frame_path(config: &PipelineConfig, index: usize) -> PathBuf {
    let name = format!(
        "{}{:0width$}{}",
        config.prefix,
        index,
        config.extension,
        width = config.fill_width
    );
    config.data_dir.join(name)
}

/// Decodes any format `image` supports and converts it to 8-bit luma.
pub fn load_gray(path: &Path) -> PipelineResult<GrayFrame> {
    let image_err = |source| PipelineError::Image {
        path: path.display().to_string(),
        source,
    };
    let gray = ImageReader::open(path)
        .map_err(|e| image_err(image::ImageError::IoError(e)))?
        .decode()
        .map_err(image_err)?
        .to_luma8();
    let (w, h) = gray.dimensions();
    GrayFrame::new(w as usize, h as usize, gray.into_raw())
        .ok_or_else(|| PipelineError::Config(format!("{} decoded to an inconsistent buffer", path.display())))
}

/// Frame indices and file names of a configured run, in order
#[derive(Debug, Clone)]
pub struct ImageSequence {
    config: PipelineConfig,
    next: usize,
}

impl ImageSequence {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            config: config.clone(),
            next: config.start,
        }
    }
}

impl Iterator for ImageSequence {
    type Item = (usize, PathBuf);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.config.end {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some((index, frame_path(&self.config, index)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.config.end + 1).saturating_sub(self.next);
        (left, Some(left))
    }
}
