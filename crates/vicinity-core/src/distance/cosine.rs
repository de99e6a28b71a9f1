use super::DistanceMetric;

pub struct CosineDistance;

impl DistanceMetric for CosineDistance {
    /// Returns `1 - cos(a, b)`, in `[0, 2]`.
    ///
    /// A zero-norm input is defined as having similarity 0 with everything,
    /// so the distance is 1.0. Inserts reject empty vectors up front; this
    /// guard covers all-zero vectors of valid dimension.
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;
        for (x, y) in a.iter().zip(b.iter()) {
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom == 0.0 {
            return 1.0;
        }
        1.0 - (dot / denom)
    }
}
