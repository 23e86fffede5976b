#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Distance used to compare two descriptor rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DistanceNorm {
    Hamming,
    L2,
}

/// Descriptor matrix, one row per keypoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptors {
    /// Packed bit strings compared with Hamming distance.
    Binary { row_bytes: usize, data: Vec<u8> },
    /// Real-valued vectors compared with Euclidean distance.
    Float { dims: usize, data: Vec<f32> },
}

impl Descriptors {
    pub fn binary(row_bytes: usize, rows: Vec<Vec<u8>>) -> Self {
        let data = rows.into_iter().flatten().collect();
        Descriptors::Binary { row_bytes, data }
    }

    pub fn empty_binary(row_bytes: usize) -> Self {
        Descriptors::Binary {
            row_bytes,
            data: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            Descriptors::Binary { row_bytes, data } if *row_bytes > 0 => data.len() / row_bytes,
            Descriptors::Float { dims, data } if *dims > 0 => data.len() / dims,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn norm(&self) -> DistanceNorm {
        match self {
            Descriptors::Binary { .. } => DistanceNorm::Hamming,
            Descriptors::Float { .. } => DistanceNorm::L2,
        }
    }

    /// Width of one row in its element type (bytes or floats).
    pub fn row_width(&self) -> usize {
        match self {
            Descriptors::Binary { row_bytes, .. } => *row_bytes,
            Descriptors::Float { dims, .. } => *dims,
        }
    }

    pub fn binary_row(&self, i: usize) -> Option<&[u8]> {
        match self {
            Descriptors::Binary { row_bytes, data } => data.get(i * row_bytes..(i + 1) * row_bytes),
            Descriptors::Float { .. } => None,
        }
    }

    pub fn float_row(&self, i: usize) -> Option<&[f32]> {
        match self {
            Descriptors::Float { dims, data } => data.get(i * dims..(i + 1) * dims),
            Descriptors::Binary { .. } => None,
        }
    }

    /// Converts binary rows to one float per byte, the layout FLANN's KD-trees expect.
    pub fn to_float(&self) -> Descriptors {
        match self {
            Descriptors::Binary { row_bytes, data } => Descriptors::Float {
                dims: *row_bytes,
                data: data.iter().map(|&b| b as f32).collect(),
            },
            Descriptors::Float { .. } => self.clone(),
        }
    }
}

/// Correspondence between a query row (previous frame) and a train row (current frame).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureMatch {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

impl FeatureMatch {
    pub fn new(query_idx: usize, train_idx: usize, distance: f32) -> Self {
        Self {
            query_idx,
            train_idx,
            distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_rows() {
        let d = Descriptors::binary(2, vec![vec![1, 2], vec![3, 4]]);
        assert_eq!(d.len(), 2);
        assert_eq!(d.binary_row(1), Some(&[3u8, 4][..]));
        assert_eq!(d.binary_row(2), None);
        assert_eq!(d.norm(), DistanceNorm::Hamming);
        assert!(d.float_row(0).is_none());
    }

    #[test]
    fn float_conversion() {
        let d = Descriptors::binary(2, vec![vec![255, 0]]).to_float();
        assert_eq!(d.norm(), DistanceNorm::L2);
        assert_eq!(d.float_row(0), Some(&[255.0f32, 0.0][..]));
    }

    #[test]
    fn zero_width_is_empty() {
        assert!(Descriptors::empty_binary(0).is_empty());
        assert!(Descriptors::Float { dims: 0, data: vec![1.0] }.is_empty());
    }
}
