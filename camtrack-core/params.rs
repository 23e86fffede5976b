//! Immutable parameter bundles, one per algorithm.
//!
//! Defaults are the values the tracking pipeline has always used. Every
//! operation receives its bundle explicitly; nothing reads global state.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Harris corner detection with NMS on the 8-bit normalized response
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct HarrisParams {
    /// Side of the window the gradient covariance is summed over.
    pub block_size: usize,
    /// Sobel aperture, odd.
    pub aperture_size: usize,
    /// Minimum value for a corner in the 8-bit scaled response map.
    pub min_response: u8,
    /// Harris sensitivity constant.
    pub k: f64,
}

impl Default for HarrisParams {
    fn default() -> Self {
        Self {
            block_size: 2,
            aperture_size: 3,
            min_response: 100,
            k: 0.04,
        }
    }
}

impl HarrisParams {
    /// Offset radius scanned around every pixel during NMS.
    ///
    /// This is `2 * aperture_size + 1` used as a radius, so the effective
    /// window side is `2 * nms_radius() + 1`.
    pub fn nms_radius(&self) -> usize {
        Self::nms_radius_for(self.aperture_size)
    }

    pub fn nms_radius_for(aperture_size: usize) -> usize {
        2 * aperture_size + 1
    }

    /// Diameter assigned to every Harris keypoint.
    pub fn keypoint_size(&self) -> f32 {
        Self::keypoint_size_for(self.aperture_size)
    }

    pub fn keypoint_size_for(aperture_size: usize) -> f32 {
        (2 * aperture_size) as f32
    }
}

/// Good-features-to-track (minimum eigenvalue) detection
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ShiTomasiParams {
    pub block_size: usize,
    /// Max permissible overlap between two features, in [0, 1].
    pub max_overlap: f64,
    /// Corners weaker than `quality_level * strongest` are rejected.
    pub quality_level: f64,
    pub k: f64,
}

impl Default for ShiTomasiParams {
    fn default() -> Self {
        Self {
            block_size: 4,
            max_overlap: 0.0,
            quality_level: 0.01,
            k: 0.04,
        }
    }
}

impl ShiTomasiParams {
    pub fn min_distance(&self) -> f64 {
        (1.0 - self.max_overlap) * self.block_size as f64
    }

    /// Corner budget for an image of `rows * cols` pixels.
    pub fn max_corners(&self, rows: usize, cols: usize) -> usize {
        ((rows * cols) as f64 / self.min_distance().max(1.0)) as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct FastParams {
    pub threshold: u8,
    pub nonmax_suppression: bool,
    /// Contiguous arc length on the 16-pixel circle (9 for TYPE_9_16).
    pub arc_length: usize,
}

impl Default for FastParams {
    fn default() -> Self {
        Self {
            threshold: 10,
            nonmax_suppression: true,
            arc_length: 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct OrbParams {
    pub n_features: usize,
    pub scale_factor: f32,
    pub n_levels: usize,
    pub edge_threshold: usize,
    pub first_level: usize,
    pub wta_k: usize,
    /// Rank by Harris score (true) or by FAST score.
    pub harris_score: bool,
    pub patch_size: usize,
    pub fast_threshold: u8,
}

impl Default for OrbParams {
    fn default() -> Self {
        Self {
            n_features: 500,
            scale_factor: 1.2,
            n_levels: 8,
            edge_threshold: 31,
            first_level: 0,
            wta_k: 2,
            harris_score: true,
            patch_size: 31,
            fast_threshold: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct BriskParams {
    pub threshold: i32,
    pub octaves: i32,
    pub pattern_scale: f32,
}

impl Default for BriskParams {
    fn default() -> Self {
        Self {
            threshold: 30,
            octaves: 3,
            pattern_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct AkazeParams {
    pub descriptor_size: i32,
    pub descriptor_channels: i32,
    pub threshold: f32,
    pub octaves: i32,
    pub octave_layers: i32,
}

impl Default for AkazeParams {
    fn default() -> Self {
        Self {
            descriptor_size: 0,
            descriptor_channels: 3,
            threshold: 0.001,
            octaves: 4,
            octave_layers: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SiftParams {
    /// 0 keeps every feature.
    pub n_features: i32,
    pub octave_layers: i32,
    pub contrast_threshold: f64,
    pub edge_threshold: f64,
    pub sigma: f64,
}

impl Default for SiftParams {
    fn default() -> Self {
        Self {
            n_features: 0,
            octave_layers: 3,
            contrast_threshold: 0.04,
            edge_threshold: 10.0,
            sigma: 1.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct BriefParams {
    /// Descriptor length in bytes: 16, 32 or 64.
    pub bytes: usize,
    pub use_orientation: bool,
}

impl Default for BriefParams {
    fn default() -> Self {
        Self {
            bytes: 32,
            use_orientation: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct FreakParams {
    pub orientation_normalized: bool,
    pub scale_normalized: bool,
    pub pattern_scale: f32,
    pub octaves: i32,
}

impl Default for FreakParams {
    fn default() -> Self {
        Self {
            orientation_normalized: true,
            scale_normalized: true,
            pattern_scale: 22.0,
            octaves: 4,
        }
    }
}

/// Everything a detector dispatch may need
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct DetectorParams {
    pub shi_tomasi: ShiTomasiParams,
    pub harris: HarrisParams,
    pub fast: FastParams,
    pub brisk: BriskParams,
    pub orb: OrbParams,
    pub akaze: AkazeParams,
    pub sift: SiftParams,
}

/// Everything a descriptor dispatch may need
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct DescriptorParams {
    pub brisk: BriskParams,
    pub brief: BriefParams,
    pub orb: OrbParams,
    pub freak: FreakParams,
    pub akaze: AkazeParams,
    pub sift: SiftParams,
    /// Seed of the binary test pattern shared by BRIEF and ORB.
    pub pattern_seed: u64,
}

impl Default for DescriptorParams {
    fn default() -> Self {
        Self {
            brisk: BriskParams::default(),
            brief: BriefParams::default(),
            orb: OrbParams::default(),
            freak: FreakParams::default(),
            akaze: AkazeParams::default(),
            sift: SiftParams::default(),
            pattern_seed: 0x5eed_b41e_f00d,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct MatchParams {
    pub cross_check: bool,
    /// Best/second-best distance ratio a k-NN match must stay below.
    pub knn_ratio: f32,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            cross_check: false,
            knn_ratio: 0.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harris_radius_is_wider_than_aperture() {
        let p = HarrisParams::default();
        assert_eq!(p.nms_radius(), 7);
        assert_eq!(p.keypoint_size(), 6.0);
        assert_eq!(HarrisParams::nms_radius_for(5), 11);
        assert_eq!(HarrisParams::keypoint_size_for(5), 10.0);
    }

    #[test]
    fn shi_tomasi_budget() {
        let p = ShiTomasiParams::default();
        assert_eq!(p.min_distance(), 4.0);
        assert_eq!(p.max_corners(100, 40), 1000);

        let wide = ShiTomasiParams {
            max_overlap: 1.0,
            ..ShiTomasiParams::default()
        };
        assert_eq!(wide.max_corners(10, 10), 100);
    }
}
