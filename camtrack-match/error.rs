use camtrack_core::{DistanceNorm, MatcherKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("cannot match {query:?} descriptors against {train:?} descriptors")]
    IncompatibleDescriptors { query: DistanceNorm, train: DistanceNorm },
    #[error("descriptor width mismatch: query rows have {query}, train rows have {train}")]
    WidthMismatch { query: usize, train: usize },
    #[error("ratio {0} must lie in (0, 1]")]
    InvalidRatio(f32),
    #[error("matcher {0} is not available natively")]
    UnsupportedMatcher(MatcherKind),
}

pub type MatchResult<T> = Result<T, MatchError>;
