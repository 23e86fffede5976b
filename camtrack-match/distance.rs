/// Number of differing bits.
#[inline]
pub fn hamming(a: &[u8], b: &[u8]) -> u32 {
    let mut dist = 0u32;
    let mut chunks_a = a.chunks_exact(8);
    let mut chunks_b = b.chunks_exact(8);
    for (ca, cb) in chunks_a.by_ref().zip(chunks_b.by_ref()) {
        let wa = u64::from_le_bytes([ca[0], ca[1], ca[2], ca[3], ca[4], ca[5], ca[6], ca[7]]);
        let wb = u64::from_le_bytes([cb[0], cb[1], cb[2], cb[3], cb[4], cb[5], cb[6], cb[7]]);
        dist += (wa ^ wb).count_ones();
    }
    for (x, y) in chunks_a.remainder().iter().zip(chunks_b.remainder()) {
        dist += (x ^ y).count_ones();
    }
    dist
}

/// Euclidean distance.
#[inline]
pub fn l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hamming_counts_bits() {
        assert_eq!(hamming(&[0b1010_1010], &[0b0101_0101]), 8);
        assert_eq!(hamming(&[0xff; 32], &[0xff; 32]), 0);
        let mut b = [0u8; 11];
        b[10] = 0b11;
        b[3] = 0b1;
        assert_eq!(hamming(&[0u8; 11], &b), 3);
    }

    #[test]
    fn l2_is_euclidean() {
        assert_eq!(l2(&[0.0, 3.0], &[4.0, 0.0]), 5.0);
        assert_eq!(l2(&[1.0; 4], &[1.0; 4]), 0.0);
    }

    proptest! {
        #[test]
        fn hamming_matches_bytewise(a in prop::collection::vec(any::<u8>(), 0..70), seed in any::<u8>()) {
            let b: Vec<u8> = a.iter().map(|x| x.wrapping_mul(seed) ^ seed).collect();
            let bytewise: u32 = a.iter().zip(&b).map(|(x, y)| (x ^ y).count_ones()).sum();
            prop_assert_eq!(hamming(&a, &b), bytewise);
            prop_assert_eq!(hamming(&a, &b), hamming(&b, &a));
        }
    }
}
