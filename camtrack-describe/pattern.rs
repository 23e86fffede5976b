use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{DescribeError, DescribeResult};

/// One binary test: compare the pixel at `(x1, y1)` with the one at `(x2, y2)`,
/// both relative to the keypoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestPair {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl TestPair {
    /// Pair rotated by `(sin, cos)` and scaled by `scale`.
    #[inline]
    pub fn transformed(&self, sin: f32, cos: f32, scale: f32) -> TestPair {
        TestPair {
            x1: scale * (self.x1 * cos - self.y1 * sin),
            y1: scale * (self.x1 * sin + self.y1 * cos),
            x2: scale * (self.x2 * cos - self.y2 * sin),
            y2: scale * (self.x2 * sin + self.y2 * cos),
        }
    }
}

/// Reproducible set of test pairs drawn from an isotropic Gaussian
/// (sigma = patch / 5) and clipped to the patch.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingPattern {
    pairs: Vec<TestPair>,
    patch_size: usize,
}

impl SamplingPattern {
    pub fn gaussian(n_tests: usize, patch_size: usize, seed: u64) -> DescribeResult<Self> {
        if patch_size < 2 {
            return Err(DescribeError::InvalidParameter {
                name: "patch_size",
                reason: format!("{patch_size} leaves no room for tests"),
            });
        }
        let normal = Normal::new(0.0f32, patch_size as f32 / 5.0).map_err(|e| DescribeError::InvalidParameter {
            name: "patch_size",
            reason: e.to_string(),
        })?;
        let half = (patch_size / 2) as f32;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut sample = || normal.sample(&mut rng).round().clamp(-half, half);

        let pairs = (0..n_tests)
            .map(|_| TestPair {
                x1: sample(),
                y1: sample(),
                x2: sample(),
                y2: sample(),
            })
            .collect();
        Ok(Self { pairs, patch_size })
    }

    pub fn pairs(&self) -> &[TestPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn patch_size(&self) -> usize {
        self.patch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_pattern() {
        let a = SamplingPattern::gaussian(256, 31, 7).unwrap();
        let b = SamplingPattern::gaussian(256, 31, 7).unwrap();
        let c = SamplingPattern::gaussian(256, 31, 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 256);
    }

    #[test]
    fn pairs_stay_in_patch() {
        let p = SamplingPattern::gaussian(512, 48, 1).unwrap();
        for t in p.pairs() {
            for v in [t.x1, t.y1, t.x2, t.y2] {
                assert!(v.abs() <= 24.0);
                assert_eq!(v, v.round());
            }
        }
    }

    #[test]
    fn rotation_by_quarter_turn() {
        let t = TestPair {
            x1: 1.0,
            y1: 0.0,
            x2: 0.0,
            y2: 2.0,
        };
        let r = t.transformed(1.0, 0.0, 2.0);
        assert_eq!((r.x1, r.y1), (0.0, 2.0));
        assert_eq!((r.x2, r.y2), (-4.0, 0.0));
    }

    #[test]
    fn tiny_patch_rejected() {
        assert!(SamplingPattern::gaussian(8, 1, 0).is_err());
    }
}
