//! Run configuration with TOML / JSON persistence.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use camtrack_core::{DescriptorParams, DetectorParams, KindSelection, MatchParams, Rect};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::{PipelineError, PipelineResult};

/// Everything one tracking run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory the frame names are resolved against.
    pub data_dir: PathBuf,
    /// File name prefix in front of the zero-padded frame index.
    pub prefix: String,
    pub extension: String,
    /// First frame index, inclusive.
    pub start: usize,
    /// Last frame index, inclusive.
    pub end: usize,
    /// Digits the frame index is padded to.
    pub fill_width: usize,
    pub output_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
    pub visualize: bool,
    /// Wait for Enter after every visualized frame.
    pub interactive: bool,
    pub limit_keypoints: bool,
    pub max_keypoints: usize,
    pub focus_on_vehicle: bool,
    /// Frames kept for matching; two is enough for previous / current.
    pub buffer_size: usize,
    pub threads: usize,
    pub log_level: String,
    pub kinds: KindSelection,
    pub roi: Rect,
    pub detector: DetectorParams,
    pub descriptor: DescriptorParams,
    pub matching: MatchParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("../images/"),
            prefix: "KITTI/2011_09_26/image_00/data/000000".to_string(),
            extension: ".png".to_string(),
            start: 0,
            end: 9,
            fill_width: 4,
            output_dir: PathBuf::from("output"),
            report: None,
            visualize: true,
            interactive: false,
            limit_keypoints: false,
            max_keypoints: 50,
            focus_on_vehicle: true,
            buffer_size: 2,
            threads: camtrack_core::default_threads(),
            log_level: "info".to_string(),
            kinds: KindSelection::default(),
            roi: Rect::preceding_vehicle(),
            detector: DetectorParams::default(),
            descriptor: DescriptorParams::default(),
            matching: MatchParams::default(),
        }
    }
}

impl PipelineConfig {
    pub fn frame_count(&self) -> usize {
        (self.end + 1).saturating_sub(self.start)
    }

    /// Parsed `log_level`, falling back to `Info` on unknown names.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "PipelineConfig: {} {} {} {}, frames {}..={} from {}, features=[visualize:{}, limit:{}, focus:{}], threads={}",
            self.kinds.detector,
            self.kinds.descriptor,
            self.kinds.matcher,
            self.kinds.selector,
            self.start,
            self.end,
            self.data_dir.display(),
            self.visualize,
            self.limit_keypoints,
            self.focus_on_vehicle,
            self.threads
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> PipelineResult<()> {
        let invalid = |msg: String| Err(PipelineError::Config(msg));

        if self.end < self.start {
            return invalid(format!("end frame {} precedes start frame {}", self.end, self.start));
        }
        if self.fill_width == 0 {
            return invalid("fill_width must be > 0".to_string());
        }
        if self.buffer_size < 2 {
            return invalid(format!(
                "buffer_size {} cannot hold a previous and a current frame",
                self.buffer_size
            ));
        }
        if self.threads == 0 {
            return invalid("threads must be > 0".to_string());
        }
        if self.limit_keypoints && self.max_keypoints == 0 {
            return invalid("max_keypoints must be > 0 when limiting".to_string());
        }
        if self.roi.width <= 0.0 || self.roi.height <= 0.0 {
            return invalid(format!("roi {}x{} is empty", self.roi.width, self.roi.height));
        }
        let ratio = self.matching.knn_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return invalid(format!("knn_ratio {ratio} must lie in (0, 1]"));
        }
        if LevelFilter::from_str(&self.log_level).is_err() {
            return invalid(format!("unknown log_level '{}'", self.log_level));
        }
        Ok(())
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from TOML string
    pub fn from_toml(toml_str: &str) -> PipelineResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> PipelineResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Save configuration to TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> PipelineResult<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn load_toml<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Loads JSON when the extension is `.json`, TOML otherwise.
    pub fn load<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        if is_json(path.as_ref()) {
            Self::load_json(path)
        } else {
            Self::load_toml(path)
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> PipelineResult<()> {
        if is_json(path.as_ref()) {
            self.save_json(path)
        } else {
            self.save_toml(path)
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
