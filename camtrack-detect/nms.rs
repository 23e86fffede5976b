//! Non-maximum suppression over an 8-bit Harris response map.
//!
//! A pixel becomes a keypoint when it is the first position, in scan order,
//! that holds the largest value strictly above `min_response` inside the
//! square window of radius `2 * aperture_size + 1` centred on it. Offsets
//! that fall outside the map are skipped, never zero-filled. Output is in
//! row-major discovery order.

use std::collections::VecDeque;

use camtrack_core::{HarrisParams, Keypoint, ResponseMap};
use rayon::prelude::*;

use crate::error::{check_aperture, DetectError, DetectResult};

#[inline]
fn harris_keypoint(row: usize, col: usize, aperture_size: usize, response: u8) -> Keypoint {
    Keypoint::new(col as f32, row as f32, HarrisParams::keypoint_size_for(aperture_size))
        .with_response(response as f32)
}

/// Literal neighbourhood scan, O(rows * cols * (2r + 1)^2).
///
/// Never fails: an empty map yields no keypoints.
pub fn suppress_non_maxima(map: &ResponseMap, aperture_size: usize, min_response: u8) -> Vec<Keypoint> {
    let r = HarrisParams::nms_radius_for(aperture_size) as isize;
    let (rows, cols) = (map.rows() as isize, map.cols() as isize);
    let mut keypoints = Vec::new();

    for i in 0..rows {
        for j in 0..cols {
            let mut max_val = min_response;
            let mut centre: Option<(isize, isize)> = None;

            for x in -r..=r {
                for y in -r..=r {
                    let (ni, nj) = (i + x, j + y);
                    if ni < 0 || ni >= rows || nj < 0 || nj >= cols {
                        continue;
                    }
                    let val = map.at(ni as usize, nj as usize);
                    if val > max_val {
                        max_val = val;
                        centre = Some((ni, nj));
                    }
                }
            }

            if centre == Some((i, j)) {
                keypoints.push(harris_keypoint(i as usize, j as usize, aperture_size, max_val));
            }
        }
    }
    keypoints
}

/// Same result as [`suppress_non_maxima`], but rejects degenerate input.
pub fn try_suppress_non_maxima(
    map: &ResponseMap,
    aperture_size: usize,
    min_response: u8,
) -> DetectResult<Vec<Keypoint>> {
    if map.is_empty() {
        return Err(DetectError::EmptyResponseMap);
    }
    check_aperture(aperture_size)?;
    Ok(suppress_non_maxima_fast(map, aperture_size, min_response))
}

/// Max over `[c - r, c + r]` clipped to the slice, for every `c`.
fn sliding_max(src: &[u8], r: usize, out: &mut [u8]) {
    let n = src.len();
    let mut window: VecDeque<usize> = VecDeque::new();
    let mut next = 0;

    for (c, slot) in out.iter_mut().enumerate() {
        let hi = (c + r).min(n - 1);
        while next <= hi {
            while window.back().is_some_and(|&b| src[b] <= src[next]) {
                window.pop_back();
            }
            window.push_back(next);
            next += 1;
        }
        while window.front().is_some_and(|&f| f + r < c) {
            window.pop_front();
        }
        *slot = window.front().map_or(0, |&f| src[f]);
    }
}

/// Separable sliding-window maximum followed by a tie check at candidates.
///
/// Horizontal maxima take O(cols) per row; the vertical pass and the
/// candidate checks run row-parallel. Output matches [`suppress_non_maxima`]
/// exactly, including tie-breaking.
pub fn suppress_non_maxima_fast(map: &ResponseMap, aperture_size: usize, min_response: u8) -> Vec<Keypoint> {
    if map.is_empty() {
        return Vec::new();
    }
    let r = HarrisParams::nms_radius_for(aperture_size);
    let (rows, cols) = (map.rows(), map.cols());
    let data = map.data();

    let mut row_max = vec![0u8; rows * cols];
    row_max
        .par_chunks_mut(cols)
        .zip(data.par_chunks(cols))
        .for_each(|(out, src)| sliding_max(src, r, out));

    let row_max = &row_max;
    (0..rows)
        .into_par_iter()
        .flat_map_iter(|i| {
            let top = i.saturating_sub(r);
            let bottom = (i + r).min(rows - 1);
            let mut found = Vec::new();

            for j in 0..cols {
                let val = data[i * cols + j];
                if val <= min_response {
                    continue;
                }
                let window_max = (top..=bottom)
                    .map(|ii| row_max[ii * cols + j])
                    .max()
                    .unwrap_or(0);
                if val < window_max {
                    continue;
                }

                let left = j.saturating_sub(r);
                let right = (j + r).min(cols - 1);
                let tied_above = (top..i).any(|ii| data[ii * cols + left..=ii * cols + right].contains(&val));
                let tied_left = data[i * cols + left..i * cols + j].contains(&val);
                if !tied_above && !tied_left {
                    found.push(harris_keypoint(i, j, aperture_size, val));
                }
            }
            found
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const APERTURE: usize = 3;
    const MIN: u8 = 100;

    fn map_with(rows: usize, cols: usize, peaks: &[(usize, usize, u8)]) -> ResponseMap {
        let mut map = ResponseMap::zeros(rows, cols);
        for &(r, c, v) in peaks {
            map.set(r, c, v);
        }
        map
    }

    /// Runs both variants and checks they agree.
    fn nms(map: &ResponseMap) -> Vec<Keypoint> {
        let literal = suppress_non_maxima(map, APERTURE, MIN);
        assert_eq!(literal, suppress_non_maxima_fast(map, APERTURE, MIN));
        literal
    }

    fn coords(kps: &[Keypoint]) -> Vec<(f32, f32)> {
        kps.iter().map(|k| (k.x, k.y)).collect()
    }

    #[test]
    fn constant_map_below_threshold_is_empty() {
        let map = ResponseMap::new(20, 20, vec![99; 400]).unwrap();
        assert!(nms(&map).is_empty());
    }

    #[test]
    fn value_equal_to_threshold_is_not_a_corner() {
        let map = map_with(20, 20, &[(10, 10, MIN)]);
        assert!(nms(&map).is_empty());
    }

    #[test]
    fn single_peak() {
        let map = map_with(30, 30, &[(12, 17, 255)]);
        let kps = nms(&map);
        assert_eq!(kps.len(), 1);
        let kp = kps[0];
        assert_eq!((kp.x, kp.y), (17.0, 12.0));
        assert_eq!(kp.response, 255.0);
        assert_eq!(kp.size, 6.0);
        assert_eq!(kp.angle, None);
    }

    #[test]
    fn distant_equal_peaks_both_kept() {
        let map = map_with(40, 40, &[(5, 5, 200), (5, 25, 200)]);
        assert_eq!(coords(&nms(&map)), vec![(5.0, 5.0), (25.0, 5.0)]);
    }

    #[test]
    fn smaller_neighbour_is_suppressed() {
        let map = map_with(30, 30, &[(10, 12, 150), (10, 10, 200)]);
        assert_eq!(coords(&nms(&map)), vec![(10.0, 10.0)]);
    }

    #[test]
    fn tie_keeps_first_in_scan_order() {
        let map = map_with(30, 30, &[(10, 10, 200), (10, 12, 200), (13, 8, 200)]);
        assert_eq!(coords(&nms(&map)), vec![(10.0, 10.0)]);
    }

    #[test]
    fn radius_is_wider_than_aperture() {
        // Seven pixels apart is still inside the radius-7 window.
        let map = map_with(30, 30, &[(10, 3, 180), (10, 10, 200)]);
        assert_eq!(coords(&nms(&map)), vec![(10.0, 10.0)]);
        let map = map_with(30, 30, &[(10, 2, 180), (10, 10, 200)]);
        assert_eq!(coords(&nms(&map)), vec![(2.0, 10.0), (10.0, 10.0)]);
    }

    #[test]
    fn peaks_on_opposite_corners() {
        let map = map_with(25, 25, &[(0, 0, 210), (24, 24, 230)]);
        assert_eq!(coords(&nms(&map)), vec![(0.0, 0.0), (24.0, 24.0)]);
    }

    #[test]
    fn output_is_row_major() {
        let map = map_with(60, 60, &[(40, 5, 200), (5, 40, 200), (40, 40, 200), (5, 5, 200)]);
        assert_eq!(
            coords(&nms(&map)),
            vec![(5.0, 5.0), (40.0, 5.0), (5.0, 40.0), (40.0, 40.0)]
        );
    }

    #[test]
    fn repeated_runs_agree() {
        let map = map_with(30, 30, &[(3, 4, 140), (20, 20, 250), (21, 20, 250)]);
        assert_eq!(nms(&map), nms(&map));
    }

    #[test]
    fn empty_map_is_lenient() {
        let map = ResponseMap::zeros(0, 0);
        assert!(suppress_non_maxima(&map, APERTURE, MIN).is_empty());
        assert!(suppress_non_maxima_fast(&map, APERTURE, MIN).is_empty());
    }

    #[test]
    fn strict_variant_rejects_degenerate_input() {
        let empty = ResponseMap::zeros(0, 5);
        assert_eq!(
            try_suppress_non_maxima(&empty, APERTURE, MIN).unwrap_err(),
            DetectError::EmptyResponseMap
        );
        let map = map_with(10, 10, &[(5, 5, 200)]);
        assert_eq!(
            try_suppress_non_maxima(&map, 4, MIN).unwrap_err(),
            DetectError::InvalidAperture(4)
        );
        assert_eq!(
            try_suppress_non_maxima(&map, 1, MIN).unwrap_err(),
            DetectError::InvalidAperture(1)
        );
        assert_eq!(try_suppress_non_maxima(&map, APERTURE, MIN).unwrap().len(), 1);
    }

    #[test]
    fn sliding_max_clips_at_edges() {
        let src = [1u8, 5, 2, 0, 0, 3];
        let mut out = [0u8; 6];
        sliding_max(&src, 1, &mut out);
        assert_eq!(out, [5, 5, 5, 2, 3, 3]);
        sliding_max(&src, 10, &mut out);
        assert_eq!(out, [5; 6]);
    }

    fn arb_map() -> impl Strategy<Value = ResponseMap> {
        (1usize..18, 1usize..18).prop_flat_map(|(rows, cols)| {
            let value = prop_oneof![
                Just(0u8),
                Just(100u8),
                Just(150u8),
                Just(200u8),
                Just(255u8),
                any::<u8>(),
            ];
            prop::collection::vec(value, rows * cols)
                .prop_map(move |data| ResponseMap::new(rows, cols, data).unwrap_or_else(|| ResponseMap::zeros(rows, cols)))
        })
    }

    proptest! {
        #[test]
        fn fast_equals_literal(map in arb_map(), aperture in prop_oneof![Just(0usize), Just(1), Just(3)], min in any::<u8>()) {
            prop_assert_eq!(
                suppress_non_maxima(&map, aperture, min),
                suppress_non_maxima_fast(&map, aperture, min)
            );
        }

        #[test]
        fn never_emits_duplicates_or_weak_points(map in arb_map(), min in any::<u8>()) {
            let kps = suppress_non_maxima_fast(&map, 1, min);
            for (n, kp) in kps.iter().enumerate() {
                prop_assert!(kp.response > min as f32);
                prop_assert!(kps[n + 1..].iter().all(|o| (o.x, o.y) != (kp.x, kp.y)));
            }
        }
    }
}
