use camtrack_core::{Descriptors, FeatureMatch};
use rayon::prelude::*;

use crate::distance::{hamming, l2};
use crate::error::{MatchError, MatchResult};

/// Exhaustive matcher comparing every query row with every train row.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceMatcher {
    /// Keep a nearest-neighbour match only when it is mutual.
    pub cross_check: bool,
}

/// Row-distance closure over a compatible descriptor pair.
enum Rows<'a> {
    Binary { q: &'a [u8], t: &'a [u8], w: usize },
    Float { q: &'a [f32], t: &'a [f32], w: usize },
}

impl<'a> Rows<'a> {
    fn new(query: &'a Descriptors, train: &'a Descriptors) -> MatchResult<Self> {
        match (query, train) {
            (
                Descriptors::Binary { row_bytes: wq, data: q },
                Descriptors::Binary { row_bytes: wt, data: t },
            ) => {
                if wq != wt {
                    return Err(MatchError::WidthMismatch { query: *wq, train: *wt });
                }
                Ok(Rows::Binary { q, t, w: *wq })
            }
            (Descriptors::Float { dims: wq, data: q }, Descriptors::Float { dims: wt, data: t }) => {
                if wq != wt {
                    return Err(MatchError::WidthMismatch { query: *wq, train: *wt });
                }
                Ok(Rows::Float { q, t, w: *wq })
            }
            _ => Err(MatchError::IncompatibleDescriptors {
                query: query.norm(),
                train: train.norm(),
            }),
        }
    }

    #[inline]
    fn distance(&self, qi: usize, ti: usize) -> f32 {
        match self {
            Rows::Binary { q, t, w } => hamming(&q[qi * w..(qi + 1) * w], &t[ti * w..(ti + 1) * w]) as f32,
            Rows::Float { q, t, w } => l2(&q[qi * w..(qi + 1) * w], &t[ti * w..(ti + 1) * w]),
        }
    }
}

impl BruteForceMatcher {
    pub fn new(cross_check: bool) -> Self {
        Self { cross_check }
    }

    /// Best train row for every query row; ties go to the lower train index.
    pub fn match_nn(&self, query: &Descriptors, train: &Descriptors) -> MatchResult<Vec<FeatureMatch>> {
        let rows = Rows::new(query, train)?;
        if query.is_empty() || train.is_empty() {
            return Ok(Vec::new());
        }
        let best_for = |qi: usize| -> FeatureMatch {
            let mut best = FeatureMatch::new(qi, 0, f32::INFINITY);
            for ti in 0..train.len() {
                let d = rows.distance(qi, ti);
                if d < best.distance {
                    best = FeatureMatch::new(qi, ti, d);
                }
            }
            best
        };
        let forward: Vec<FeatureMatch> = (0..query.len()).into_par_iter().map(best_for).collect();
        if !self.cross_check {
            return Ok(forward);
        }

        let backward: Vec<usize> = (0..train.len())
            .into_par_iter()
            .map(|ti| {
                let mut best = (0usize, f32::INFINITY);
                for qi in 0..query.len() {
                    let d = rows.distance(qi, ti);
                    if d < best.1 {
                        best = (qi, d);
                    }
                }
                best.0
            })
            .collect();
        Ok(forward
            .into_iter()
            .filter(|m| backward[m.train_idx] == m.query_idx)
            .collect())
    }

    /// Up to `k` nearest train rows per query row, closest first.
    pub fn knn_match(&self, query: &Descriptors, train: &Descriptors, k: usize) -> MatchResult<Vec<Vec<FeatureMatch>>> {
        let rows = Rows::new(query, train)?;
        if train.is_empty() || k == 0 {
            return Ok(vec![Vec::new(); query.len()]);
        }
        Ok((0..query.len())
            .into_par_iter()
            .map(|qi| {
                let mut nearest: Vec<FeatureMatch> = Vec::with_capacity(k + 1);
                for ti in 0..train.len() {
                    let d = rows.distance(qi, ti);
                    if nearest.len() == k && d >= nearest[k - 1].distance {
                        continue;
                    }
                    let pos = nearest.partition_point(|m| m.distance <= d);
                    nearest.insert(pos, FeatureMatch::new(qi, ti, d));
                    nearest.truncate(k);
                }
                nearest
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(rows: &[[u8; 4]]) -> Descriptors {
        Descriptors::binary(4, rows.iter().map(|r| r.to_vec()).collect())
    }

    #[test]
    fn identical_rows_match_at_zero() {
        let q = binary(&[[1, 2, 3, 4], [9, 9, 9, 9]]);
        let t = binary(&[[0, 0, 0, 0], [9, 9, 9, 9], [1, 2, 3, 4]]);
        let m = BruteForceMatcher::default().match_nn(&q, &t).unwrap();
        assert_eq!(m, vec![FeatureMatch::new(0, 2, 0.0), FeatureMatch::new(1, 1, 0.0)]);
    }

    #[test]
    fn ties_prefer_lower_train_index() {
        let q = binary(&[[0, 0, 0, 0]]);
        let t = binary(&[[1, 0, 0, 0], [0, 1, 0, 0]]);
        let m = BruteForceMatcher::default().match_nn(&q, &t).unwrap();
        assert_eq!(m[0].train_idx, 0);
        assert_eq!(m[0].distance, 1.0);
    }

    #[test]
    fn cross_check_drops_one_sided_matches() {
        let q = binary(&[[0, 0, 0, 0], [0, 0, 0, 1]]);
        let t = binary(&[[0, 0, 0, 0]]);
        let plain = BruteForceMatcher::new(false).match_nn(&q, &t).unwrap();
        assert_eq!(plain.len(), 2);
        let checked = BruteForceMatcher::new(true).match_nn(&q, &t).unwrap();
        assert_eq!(checked, vec![FeatureMatch::new(0, 0, 0.0)]);
    }

    #[test]
    fn knn_sorted_and_bounded() {
        let q = binary(&[[0, 0, 0, 0]]);
        let t = binary(&[[0xff, 0, 0, 0], [1, 0, 0, 0], [0, 0, 0, 0], [3, 0, 0, 0]]);
        let knn = BruteForceMatcher::default().knn_match(&q, &t, 2).unwrap();
        assert_eq!(knn.len(), 1);
        let idx: Vec<usize> = knn[0].iter().map(|m| m.train_idx).collect();
        assert_eq!(idx, vec![2, 1]);
    }

    #[test]
    fn float_rows_use_l2() {
        let q = Descriptors::Float { dims: 2, data: vec![0.0, 0.0] };
        let t = Descriptors::Float { dims: 2, data: vec![3.0, 4.0, 1.0, 1.0] };
        let m = BruteForceMatcher::default().match_nn(&q, &t).unwrap();
        assert_eq!(m[0].train_idx, 1);
        assert!((m[0].distance - 2f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn mixed_types_rejected() {
        let q = binary(&[[0; 4]]);
        let t = Descriptors::Float { dims: 4, data: vec![0.0; 4] };
        assert!(matches!(
            BruteForceMatcher::default().match_nn(&q, &t),
            Err(MatchError::IncompatibleDescriptors { .. })
        ));
        let narrow = Descriptors::binary(2, vec![vec![0, 0]]);
        assert_eq!(
            BruteForceMatcher::default().knn_match(&q, &narrow, 2).unwrap_err(),
            MatchError::WidthMismatch { query: 4, train: 2 }
        );
    }

    #[test]
    fn empty_sets_give_no_matches() {
        let q = Descriptors::empty_binary(4);
        let t = binary(&[[0; 4]]);
        assert!(BruteForceMatcher::default().match_nn(&q, &t).unwrap().is_empty());
        assert!(BruteForceMatcher::default().match_nn(&t, &q).unwrap().is_empty());
        assert_eq!(BruteForceMatcher::default().knn_match(&t, &q, 2).unwrap(), vec![Vec::new()]);
    }
}
