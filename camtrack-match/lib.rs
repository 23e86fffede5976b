//! Descriptor matching between consecutive frames.
//!
//! Query rows come from the previous frame, train rows from the current one.

pub mod brute_force;
pub mod distance;
pub mod error;
pub mod ratio;

pub use brute_force::BruteForceMatcher;
pub use distance::{hamming, l2};
pub use error::{MatchError, MatchResult};
pub use ratio::ratio_test;

use camtrack_core::{Descriptors, FeatureMatch, MatchParams, MatcherKind, SelectorKind};
use log::debug;

/// Neighbours fetched per query row for the ratio test.
pub const KNN_NEIGHBOURS: usize = 2;

/// Applies `selector` to brute-force neighbours. FLANN has no native
/// implementation and is reported as unsupported.
pub fn match_descriptors(
    query: &Descriptors,
    train: &Descriptors,
    matcher: MatcherKind,
    selector: SelectorKind,
    params: &MatchParams,
) -> MatchResult<Vec<FeatureMatch>> {
    let bf = match matcher {
        MatcherKind::BruteForce => BruteForceMatcher::new(params.cross_check),
        MatcherKind::Flann => return Err(MatchError::UnsupportedMatcher(matcher)),
    };
    select(&bf, query, train, selector, params)
}

fn select(
    bf: &BruteForceMatcher,
    query: &Descriptors,
    train: &Descriptors,
    selector: SelectorKind,
    params: &MatchParams,
) -> MatchResult<Vec<FeatureMatch>> {
    match selector {
        SelectorKind::NearestNeighbor => bf.match_nn(query, train),
        SelectorKind::KNearest => {
            if !(params.knn_ratio > 0.0 && params.knn_ratio <= 1.0) {
                return Err(MatchError::InvalidRatio(params.knn_ratio));
            }
            let knn = bf.knn_match(query, train, KNN_NEIGHBOURS)?;
            let kept = ratio_test(&knn, params.knn_ratio);
            debug!("ratio test kept {} of {} candidates", kept.len(), knn.len());
            Ok(kept)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[[u8; 2]]) -> Descriptors {
        Descriptors::binary(2, data.iter().map(|r| r.to_vec()).collect())
    }

    #[test]
    fn knn_selector_filters_ambiguous_rows() {
        let query = rows(&[[0b0000_0000, 0], [0b1111_0000, 0]]);
        // Query 0 has a unique exact match, query 1 sits between two equal candidates.
        let train = rows(&[[0, 0], [0b1111_1100, 0], [0b1111_0011, 0]]);
        let params = MatchParams::default();

        let nn = match_descriptors(&query, &train, MatcherKind::BruteForce, SelectorKind::NearestNeighbor, &params)
            .unwrap();
        assert_eq!(nn.len(), 2);

        let knn = match_descriptors(&query, &train, MatcherKind::BruteForce, SelectorKind::KNearest, &params)
            .unwrap();
        assert_eq!(knn, vec![FeatureMatch::new(0, 0, 0.0)]);
    }

    #[test]
    fn flann_is_not_native() {
        let d = rows(&[[0, 0]]);
        assert_eq!(
            match_descriptors(&d, &d, MatcherKind::Flann, SelectorKind::NearestNeighbor, &MatchParams::default())
                .unwrap_err(),
            MatchError::UnsupportedMatcher(MatcherKind::Flann)
        );
    }

    #[test]
    fn bad_ratio_rejected() {
        let d = rows(&[[0, 0]]);
        let params = MatchParams {
            knn_ratio: 1.5,
            ..MatchParams::default()
        };
        assert!(matches!(
            match_descriptors(&d, &d, MatcherKind::BruteForce, SelectorKind::KNearest, &params),
            Err(MatchError::InvalidRatio(_))
        ));
    }
}
