//! Seam between the pipeline driver and the algorithm implementations.
//!
//! The native backend covers the detectors, descriptors and matchers this
//! workspace implements itself. With the `opencv` feature enabled the OpenCV
//! backend provides the full set.

mod native;
#[cfg(feature = "opencv")]
mod opencv_backend;

pub use native::NativeBackend;
#[cfg(feature = "opencv")]
pub use opencv_backend::OpenCvBackend;

use camtrack_core::{
    DescriptorKind, DescriptorParams, Descriptors, DetectorKind, DetectorParams, FeatureMatch,
    ImageView, Keypoint, KindSelection, MatchParams, MatcherKind, SelectorKind,
};

use crate::{PipelineError, PipelineResult};

/// Detection, description and matching for one selection of algorithms
pub trait FeatureBackend {
    fn name(&self) -> &'static str;

    fn supports_detector(&self, kind: DetectorKind) -> bool;
    fn supports_descriptor(&self, kind: DescriptorKind) -> bool;
    fn supports_matcher(&self, kind: MatcherKind) -> bool;

    fn detect(
        &self,
        image: &ImageView<'_>,
        kind: DetectorKind,
        params: &DetectorParams,
    ) -> PipelineResult<Vec<Keypoint>>;

    /// Returns the keypoints that were actually described, aligned with the
    /// descriptor rows. Extractors may drop keypoints near the border.
    fn describe(
        &self,
        image: &ImageView<'_>,
        keypoints: Vec<Keypoint>,
        kind: DescriptorKind,
        params: &DescriptorParams,
    ) -> PipelineResult<(Vec<Keypoint>, Descriptors)>;

    /// Matches the previous frame's descriptors (`query`) into the current
    /// frame's (`train`).
    fn match_descriptors(
        &self,
        query: &Descriptors,
        train: &Descriptors,
        matcher: MatcherKind,
        selector: SelectorKind,
        params: &MatchParams,
    ) -> PipelineResult<Vec<FeatureMatch>>;

    /// Fails on the first kind of `kinds` this backend cannot run.
    fn check_support(&self, kinds: &KindSelection) -> PipelineResult<()> {
        let missing = if !self.supports_detector(kinds.detector) {
            Some(format!("{} detector", kinds.detector))
        } else if !self.supports_descriptor(kinds.descriptor) {
            Some(format!("{} descriptor", kinds.descriptor))
        } else if !self.supports_matcher(kinds.matcher) {
            Some(format!("{} matcher", kinds.matcher))
        } else {
            None
        };
        match missing {
            Some(what) => Err(PipelineError::Unsupported {
                what,
                backend: self.name(),
            }),
            None => Ok(()),
        }
    }
}

/// Picks the native backend whenever it can run `kinds`, OpenCV otherwise
/// (when compiled in).
pub fn backend_for(kinds: &KindSelection) -> Box<dyn FeatureBackend> {
    let native = NativeBackend;
    if native.check_support(kinds).is_ok() {
        return Box::new(native);
    }
    #[cfg(feature = "opencv")]
    {
        Box::new(OpenCvBackend)
    }
    #[cfg(not(feature = "opencv"))]
    {
        Box::new(native)
    }
}
