//! Vector helpers shared by the cache index and its callers.
//!
//! All comparisons run on unit vectors: squared Euclidean distance between two
//! unit vectors lies in `[0, 4]`, and similarity is reported as `1 - d/4`.

/// Scale a vector to unit length. A zero vector is returned unchanged.
pub fn l2_normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm == 0.0 || !norm.is_finite() {
        return vector.to_vec();
    }

    vector.iter().map(|x| x / norm).collect()
}

/// Squared Euclidean distance. Vectors of unequal length are never close.
pub fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::MAX;
    }

    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Map a squared distance between unit vectors onto `[0, 1]`
pub fn similarity_from_distance(distance: f32) -> f32 {
    (1.0 - distance / 4.0).clamp(0.0, 1.0)
}
