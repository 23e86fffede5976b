use camtrack_core::FeatureMatch;

/// Keeps the best candidate of each k-NN list when it is clearly better
/// than the runner-up: `best / second < ratio`.
///
/// Lists with fewer than two candidates carry no evidence and are dropped.
pub fn ratio_test(knn: &[Vec<FeatureMatch>], ratio: f32) -> Vec<FeatureMatch> {
    knn.iter()
        .filter_map(|candidates| match candidates.as_slice() {
            [best, second, ..] if best.distance < ratio * second.distance => Some(*best),
            _ => None,
        })
        .collect()
}
