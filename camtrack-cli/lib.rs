//! High-level tracking pipeline behind the `camtrack` binary.
//!
//! Loads an image sequence frame by frame, detects keypoints, extracts
//! descriptors and matches every frame against its predecessor through a
//! two-slot ring buffer. Algorithms are picked per run through
//! [`camtrack_core::KindSelection`] and executed by a [`FeatureBackend`].

pub mod args;
pub mod backend;
pub mod config;
pub mod sequence;
pub mod tracker;
pub mod visualize;

pub use args::{resolve_positionals, Cli, Resolved};
pub use backend::{backend_for, FeatureBackend, NativeBackend};
pub use config::PipelineConfig;
pub use sequence::{frame_path, load_gray, ImageSequence};
pub use tracker::{FrameReport, RunSummary, Tracker};

use camtrack_describe::DescribeError;
use camtrack_detect::DetectError;
use camtrack_match::MatchError;
use thiserror::Error;

/// Everything that can stop a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error(transparent)]
    Describe(#[from] DescribeError),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error("failed to load image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("{what} is not supported by the {backend} backend (rebuild with `--features opencv`)")]
    Unsupported { what: String, backend: &'static str },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[cfg(feature = "opencv")]
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
