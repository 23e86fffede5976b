use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::descriptor::DistanceNorm;

/// Unknown token for one of the kind enums
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {family} '{value}', expected one of: {expected}")]
pub struct ParseKindError {
    pub family: &'static str,
    pub value: String,
    pub expected: String,
}

macro_rules! kind_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $family:literal {
            $($variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub enum $name {
            $(
                #[cfg_attr(feature = "serde", serde(rename = $token))]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Token used on the command line and in config files.
            pub fn token(self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.token())
            }
        }

        impl FromStr for $name {
            type Err = ParseKindError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|k| k.token().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| ParseKindError {
                        family: $family,
                        value: s.to_string(),
                        expected: $name::ALL
                            .iter()
                            .map(|k| k.token())
                            .collect::<Vec<_>>()
                            .join("|"),
                    })
            }
        }
    };
}

kind_enum! {
    /// Keypoint detector algorithm
    DetectorKind, "detector" {
        ShiTomasi => "SHITOMASI",
        Harris => "HARRIS",
        Fast => "FAST",
        Brisk => "BRISK",
        Orb => "ORB",
        Akaze => "AKAZE",
        Sift => "SIFT",
    }
}

kind_enum! {
    /// Descriptor extraction algorithm
    DescriptorKind, "descriptor" {
        Brisk => "BRISK",
        Brief => "BRIEF",
        Orb => "ORB",
        Freak => "FREAK",
        Akaze => "AKAZE",
        Sift => "SIFT",
    }
}

kind_enum! {
    /// Descriptor matching strategy
    MatcherKind, "matcher" {
        BruteForce => "MAT_BF",
        Flann => "MAT_FLANN",
    }
}

kind_enum! {
    /// How candidate matches are selected
    SelectorKind, "selector" {
        NearestNeighbor => "SEL_NN",
        KNearest => "SEL_KNN",
    }
}

impl DetectorKind {
    /// Detectors that only work together with their own descriptor.
    pub fn is_self_contained(self) -> bool {
        matches!(self, DetectorKind::Akaze)
    }
}

impl DescriptorKind {
    pub fn is_self_contained(self) -> bool {
        matches!(self, DescriptorKind::Akaze)
    }

    /// SIFT produces float histograms; every other extractor is binary.
    pub fn norm(self) -> DistanceNorm {
        match self {
            DescriptorKind::Sift => DistanceNorm::L2,
            _ => DistanceNorm::Hamming,
        }
    }

    /// The descriptor that shares an algorithm with `detector`, if any.
    pub fn paired_with(detector: DetectorKind) -> Option<DescriptorKind> {
        match detector {
            DetectorKind::Brisk => Some(DescriptorKind::Brisk),
            DetectorKind::Orb => Some(DescriptorKind::Orb),
            DetectorKind::Akaze => Some(DescriptorKind::Akaze),
            DetectorKind::Sift => Some(DescriptorKind::Sift),
            DetectorKind::ShiTomasi | DetectorKind::Harris | DetectorKind::Fast => None,
        }
    }
}

/// The four algorithm choices for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KindSelection {
    pub detector: DetectorKind,
    pub descriptor: DescriptorKind,
    pub matcher: MatcherKind,
    pub selector: SelectorKind,
}

impl Default for KindSelection {
    fn default() -> Self {
        Self {
            detector: DetectorKind::ShiTomasi,
            descriptor: DescriptorKind::Brisk,
            matcher: MatcherKind::BruteForce,
            selector: SelectorKind::NearestNeighbor,
        }
    }
}

impl KindSelection {
    /// Forces self-contained detector/descriptor pairs to agree.
    ///
    /// Returns the notices that explain each coercion; an empty list means the
    /// selection was already valid.
    pub fn coerce(&mut self) -> Vec<String> {
        let mut notices = Vec::new();
        let detector_alone = self.detector.is_self_contained()
            && DescriptorKind::paired_with(self.detector) != Some(self.descriptor);
        let descriptor_alone = self.descriptor.is_self_contained()
            && DescriptorKind::paired_with(self.detector) != Some(self.descriptor);

        if detector_alone {
            notices.push(format!(
                "{} detector only supports {} descriptor. Use {} as detector and descriptor type",
                self.detector, self.detector, self.detector
            ));
            if let Some(d) = DescriptorKind::paired_with(self.detector) {
                self.descriptor = d;
            }
        } else if descriptor_alone {
            notices.push(format!(
                "{} descriptor only supports {} detector. Use {} as detector and descriptor type",
                self.descriptor, self.descriptor, self.descriptor
            ));
            self.detector = match self.descriptor {
                DescriptorKind::Akaze => DetectorKind::Akaze,
                _ => self.detector,
            };
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip() {
        for &k in DetectorKind::ALL {
            assert_eq!(k.to_string().parse::<DetectorKind>().unwrap(), k);
        }
        for &k in DescriptorKind::ALL {
            assert_eq!(k.to_string().parse::<DescriptorKind>().unwrap(), k);
        }
        for &k in MatcherKind::ALL {
            assert_eq!(k.to_string().parse::<MatcherKind>().unwrap(), k);
        }
        for &k in SelectorKind::ALL {
            assert_eq!(k.to_string().parse::<SelectorKind>().unwrap(), k);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("shitomasi".parse::<DetectorKind>().unwrap(), DetectorKind::ShiTomasi);
        assert_eq!("sel_knn".parse::<SelectorKind>().unwrap(), SelectorKind::KNearest);
    }

    #[test]
    fn unknown_token_lists_expected() {
        let err = "SURF".parse::<DetectorKind>().unwrap_err();
        assert_eq!(err.family, "detector");
        assert!(err.expected.contains("SHITOMASI"));
        assert!(err.to_string().contains("SURF"));
    }

    #[test]
    fn akaze_detector_forces_descriptor() {
        let mut sel = KindSelection {
            detector: DetectorKind::Akaze,
            descriptor: DescriptorKind::Brief,
            ..KindSelection::default()
        };
        let notices = sel.coerce();
        assert_eq!(notices.len(), 1);
        assert_eq!(sel.detector, DetectorKind::Akaze);
        assert_eq!(sel.descriptor, DescriptorKind::Akaze);
    }

    #[test]
    fn akaze_descriptor_forces_detector() {
        let mut sel = KindSelection {
            detector: DetectorKind::Fast,
            descriptor: DescriptorKind::Akaze,
            ..KindSelection::default()
        };
        let notices = sel.coerce();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].starts_with("AKAZE descriptor"));
        assert_eq!(sel.detector, DetectorKind::Akaze);
    }

    #[test]
    fn valid_selection_untouched() {
        let mut sel = KindSelection::default();
        assert!(sel.coerce().is_empty());
        assert_eq!(sel, KindSelection::default());

        let mut akaze = KindSelection {
            detector: DetectorKind::Akaze,
            descriptor: DescriptorKind::Akaze,
            ..KindSelection::default()
        };
        assert!(akaze.coerce().is_empty());
    }

    #[test]
    fn sift_uses_l2() {
        assert_eq!(DescriptorKind::Sift.norm(), DistanceNorm::L2);
        assert_eq!(DescriptorKind::Orb.norm(), DistanceNorm::Hamming);
    }
}
