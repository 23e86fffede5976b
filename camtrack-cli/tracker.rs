//! Frame loop: load, detect, describe, match against the previous frame.

use std::path::Path;
use std::time::Instant;

use camtrack_core::{limit_keypoints, retain_in_roi, DataFrame, FrameBuffer, GrayFrame};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::backend::{backend_for, FeatureBackend};
use crate::config::PipelineConfig;
use crate::sequence::{load_gray, ImageSequence};
use crate::visualize;
use crate::{PipelineError, PipelineResult};

/// What happened to one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub index: usize,
    pub keypoints_detected: usize,
    /// Keypoints left after the vehicle ROI and the optional limit.
    pub keypoints_kept: usize,
    pub descriptors: usize,
    /// `None` for the first frame, which has nothing to match against.
    pub matches: Option<usize>,
    pub detect_ms: f64,
    pub describe_ms: f64,
    pub match_ms: Option<f64>,
}

/// Totals over a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub frames: usize,
    pub keypoints: usize,
    pub matches: usize,
    pub mean_detect_ms: f64,
    pub mean_describe_ms: f64,
    pub mean_match_ms: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

impl RunSummary {
    pub fn from_reports(reports: &[FrameReport]) -> Self {
        Self {
            frames: reports.len(),
            keypoints: reports.iter().map(|r| r.keypoints_kept).sum(),
            matches: reports.iter().filter_map(|r| r.matches).sum(),
            mean_detect_ms: mean(reports.iter().map(|r| r.detect_ms)),
            mean_describe_ms: mean(reports.iter().map(|r| r.describe_ms)),
            mean_match_ms: mean(reports.iter().filter_map(|r| r.match_ms)),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} frames, {} keypoints, {} matches; mean detect {:.2} ms, describe {:.2} ms, match {:.2} ms",
            self.frames,
            self.keypoints,
            self.matches,
            self.mean_detect_ms,
            self.mean_describe_ms,
            self.mean_match_ms
        )
    }
}

fn elapsed_ms(t0: Instant) -> f64 {
    t0.elapsed().as_secs_f64() * 1000.0
}

/// Drives one configured run over an image sequence
pub struct Tracker {
    config: PipelineConfig,
    backend: Box<dyn FeatureBackend>,
    buffer: FrameBuffer<DataFrame>,
    reports: Vec<FrameReport>,
}

impl Tracker {
    /// Validates `config` and picks a backend able to run its kinds.
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        let backend = backend_for(&config.kinds);
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: PipelineConfig, backend: Box<dyn FeatureBackend>) -> PipelineResult<Self> {
        config.validate()?;
        backend.check_support(&config.kinds)?;
        info!("using the {} backend", backend.name());
        Ok(Self {
            buffer: FrameBuffer::new(config.buffer_size),
            config,
            backend,
            reports: Vec::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn buffer(&self) -> &FrameBuffer<DataFrame> {
        &self.buffer
    }

    pub fn reports(&self) -> &[FrameReport] {
        &self.reports
    }

    /// Loads and processes every frame of the configured sequence.
    pub fn run(&mut self) -> PipelineResult<RunSummary> {
        if self.config.visualize {
            std::fs::create_dir_all(&self.config.output_dir)?;
        }
        for (index, path) in ImageSequence::new(&self.config) {
            info!("Processing {}", path.display());
            let image = load_gray(&path)?;
            self.process_frame(index, image)?;
        }

        let summary = RunSummary::from_reports(&self.reports);
        if let Some(path) = self.config.report.clone() {
            self.write_report(&path)?;
            info!("wrote {} frame reports to {}", self.reports.len(), path.display());
        }
        Ok(summary)
    }

    /// Pushes `image` into the ring buffer and runs every stage on it.
    pub fn process_frame(&mut self, index: usize, image: GrayFrame) -> PipelineResult<FrameReport> {
        let kinds = self.config.kinds;
        self.buffer.push(DataFrame::new(image));
        info!("#1 : LOAD IMAGE INTO BUFFER done");

        let Some(current) = self.buffer.latest_mut() else {
            return Err(PipelineError::Config("frame buffer holds no frames".to_string()));
        };

        let t0 = Instant::now();
        let mut keypoints = self
            .backend
            .detect(&current.image.view(), kinds.detector, &self.config.detector)?;
        let detect_ms = elapsed_ms(t0);
        let keypoints_detected = keypoints.len();
        info!("{} detection with n={} keypoints in {:.2} ms", kinds.detector, keypoints_detected, detect_ms);

        if self.config.focus_on_vehicle {
            retain_in_roi(&mut keypoints, &self.config.roi);
            debug!("{} of {} keypoints inside the vehicle ROI", keypoints.len(), keypoints_detected);
        }
        if self.config.limit_keypoints {
            if limit_keypoints(&mut keypoints, kinds.detector, self.config.max_keypoints) {
                info!("keypoints limited to {}", keypoints.len());
            } else {
                warn!("Not support keypoints limiting for the {} detector", kinds.detector);
            }
        }
        let keypoints_kept = keypoints.len();
        info!("#2 : DETECT KEYPOINTS done");

        let t0 = Instant::now();
        let (keypoints, descriptors) = self.backend.describe(
            &current.image.view(),
            keypoints,
            kinds.descriptor,
            &self.config.descriptor,
        )?;
        let describe_ms = elapsed_ms(t0);
        info!("{} descriptor extraction in {:.2} ms", kinds.descriptor, describe_ms);
        let descriptor_count = descriptors.len();
        current.keypoints = keypoints;
        current.descriptors = Some(descriptors);
        info!("#3 : EXTRACT DESCRIPTORS done");

        let mut matched = None;
        if let Some((previous, current)) = self.buffer.last_pair() {
            if let (Some(query), Some(train)) = (&previous.descriptors, &current.descriptors) {
                let t0 = Instant::now();
                let matches = self.backend.match_descriptors(
                    query,
                    train,
                    kinds.matcher,
                    kinds.selector,
                    &self.config.matching,
                )?;
                let match_ms = elapsed_ms(t0);
                info!("{} {} with n={} matches in {:.2} ms", kinds.matcher, kinds.selector, matches.len(), match_ms);
                matched = Some((matches, match_ms));
            }
        }
        if let Some((matches, _)) = &matched {
            if let Some(current) = self.buffer.latest_mut() {
                current.matches = matches.clone();
            }
            info!("#4 : MATCH KEYPOINT DESCRIPTORS done");
        }

        if self.config.visualize {
            self.visualize(index)?;
        }

        let report = FrameReport {
            index,
            keypoints_detected,
            keypoints_kept,
            descriptors: descriptor_count,
            matches: matched.as_ref().map(|(m, _)| m.len()),
            detect_ms,
            describe_ms,
            match_ms: matched.map(|(_, ms)| ms),
        };
        self.reports.push(report.clone());
        Ok(report)
    }

    fn visualize(&self, index: usize) -> PipelineResult<()> {
        let dir = &self.config.output_dir;
        if let Some(current) = self.buffer.latest() {
            let img = visualize::draw_keypoints(&current.image, &current.keypoints)?;
            visualize::save(&img, &visualize::keypoints_path(dir, index))?;
        }
        if let Some((previous, current)) = self.buffer.last_pair() {
            let img = visualize::draw_matches(
                (&previous.image, &previous.keypoints),
                (&current.image, &current.keypoints),
                &current.matches,
            )?;
            let path = visualize::matches_path(dir, index);
            visualize::save(&img, &path)?;
            debug!("saved {}", path.display());
            if self.config.interactive {
                visualize::wait_for_enter()?;
            }
        }
        Ok(())
    }

    pub fn write_report(&self, path: &Path) -> PipelineResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(&self.reports)?)?;
        Ok(())
    }
}
