use super::DistanceMetric;

/// Raw inner product, for callers that pre-normalize their vectors.
pub struct DotProductDistance;

impl DistanceMetric for DotProductDistance {
    /// Returns the negated dot product so that lower = more similar.
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        -a.iter().zip(b.iter()).map(|(x, y)| x * y).sum::<f32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn test_identical_unit_vectors() {
        let d = DotProductDistance;
        assert!((d.distance(&[1.0, 0.0], &[1.0, 0.0]) - (-1.0)).abs() < EPS);
    }

    #[test]
    fn test_orthogonal() {
        let d = DotProductDistance;
        assert!((d.distance(&[1.0, 0.0], &[0.0, 1.0])).abs() < EPS);
    }

    #[test]
    fn test_opposite() {
        let d = DotProductDistance;
        assert!((d.distance(&[1.0, 0.0], &[-1.0, 0.0]) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_known_value() {
        let d = DotProductDistance;
        // dot([1,2,3],[4,5,6]) = 32
        assert!((d.distance(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]) - (-32.0)).abs() < EPS);
    }

    #[test]
    fn test_higher_similarity_is_lower_distance() {
        let d = DotProductDistance;
        let aligned = d.distance(&[1.0, 0.0], &[1.0, 0.0]);
        let orthogonal = d.distance(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(aligned < orthogonal);
    }

    #[test]
    fn test_commutativity() {
        let d = DotProductDistance;
        let d1 = d.distance(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        let d2 = d.distance(&[4.0, 5.0, 6.0], &[1.0, 2.0, 3.0]);
        assert!((d1 - d2).abs() < EPS);
    }
}
