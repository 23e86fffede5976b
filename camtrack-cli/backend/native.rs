use camtrack_core::{
    DescriptorKind, DescriptorParams, Descriptors, DetectorKind, DetectorParams, FeatureMatch,
    ImageView, Keypoint, MatchParams, MatcherKind, SelectorKind,
};
use camtrack_describe::{BriefExtractor, OrbExtractor};
use camtrack_detect::{FastDetector, HarrisDetector, OrbDetector, ShiTomasiDetector};
use log::debug;

use super::FeatureBackend;
use crate::{PipelineError, PipelineResult};

const NAME: &str = "native";

/// Pure-Rust implementations from the camtrack crates
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

fn unsupported(what: String) -> PipelineError {
    PipelineError::Unsupported { what, backend: NAME }
}

impl FeatureBackend for NativeBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn supports_detector(&self, kind: DetectorKind) -> bool {
        matches!(
            kind,
            DetectorKind::ShiTomasi | DetectorKind::Harris | DetectorKind::Fast | DetectorKind::Orb
        )
    }

    fn supports_descriptor(&self, kind: DescriptorKind) -> bool {
        matches!(kind, DescriptorKind::Brief | DescriptorKind::Orb)
    }

    fn supports_matcher(&self, kind: MatcherKind) -> bool {
        kind == MatcherKind::BruteForce
    }

    fn detect(
        &self,
        image: &ImageView<'_>,
        kind: DetectorKind,
        params: &DetectorParams,
    ) -> PipelineResult<Vec<Keypoint>> {
        let keypoints = match kind {
            DetectorKind::ShiTomasi => ShiTomasiDetector::new(params.shi_tomasi.clone())?.detect(image)?,
            DetectorKind::Harris => HarrisDetector::new(params.harris.clone())?.detect(image)?,
            DetectorKind::Fast => FastDetector::new(params.fast.clone())?.detect(image)?,
            DetectorKind::Orb => OrbDetector::new(params.orb.clone())?.detect(image)?,
            DetectorKind::Brisk | DetectorKind::Akaze | DetectorKind::Sift => {
                return Err(unsupported(format!("{kind} detector")));
            }
        };
        debug!("{kind}: {} keypoints on {}x{}", keypoints.len(), image.width(), image.height());
        Ok(keypoints)
    }

    fn describe(
        &self,
        image: &ImageView<'_>,
        keypoints: Vec<Keypoint>,
        kind: DescriptorKind,
        params: &DescriptorParams,
    ) -> PipelineResult<(Vec<Keypoint>, Descriptors)> {
        let described = match kind {
            DescriptorKind::Brief => {
                BriefExtractor::new(params.brief.clone(), params.pattern_seed)?.compute(image, keypoints)?
            }
            DescriptorKind::Orb => {
                OrbExtractor::new(params.orb.clone(), params.pattern_seed)?.compute(image, keypoints)?
            }
            DescriptorKind::Brisk | DescriptorKind::Freak | DescriptorKind::Akaze | DescriptorKind::Sift => {
                return Err(unsupported(format!("{kind} descriptor")));
            }
        };
        Ok(described)
    }

    fn match_descriptors(
        &self,
        query: &Descriptors,
        train: &Descriptors,
        matcher: MatcherKind,
        selector: SelectorKind,
        params: &MatchParams,
    ) -> PipelineResult<Vec<FeatureMatch>> {
        if !self.supports_matcher(matcher) {
            return Err(unsupported(format!("{matcher} matcher")));
        }
        Ok(camtrack_match::match_descriptors(query, train, matcher, selector, params)?)
    }
}
