use super::DistanceMetric;

pub struct EuclideanDistance;

impl DistanceMetric for EuclideanDistance {
    fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| {
                let diff = x - y;
                diff * diff
            })
            .sum::<f32>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn test_identical_vectors() {
        let d = EuclideanDistance;
        assert!((d.distance(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0])).abs() < EPS);
    }

    #[test]
    fn test_unit_distance() {
        let d = EuclideanDistance;
        assert!((d.distance(&[0.0], &[1.0]) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_3_4_5_triangle() {
        let d = EuclideanDistance;
        assert!((d.distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_known_3d() {
        let d = EuclideanDistance;
        // sqrt(9 + 9 + 9)
        let expected = 27.0f32.sqrt();
        assert!((d.distance(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]) - expected).abs() < EPS);
    }

    #[test]
    fn test_symmetry() {
        let d = EuclideanDistance;
        let d1 = d.distance(&[1.0, 2.0], &[3.0, 4.0]);
        let d2 = d.distance(&[3.0, 4.0], &[1.0, 2.0]);
        assert!((d1 - d2).abs() < EPS);
    }

    #[test]
    fn test_triangle_inequality() {
        let d = EuclideanDistance;
        let a = &[0.0, 0.0];
        let b = &[1.0, 0.0];
        let c = &[0.0, 1.0];
        assert!(d.distance(a, c) <= d.distance(a, b) + d.distance(b, c) + EPS);
    }
}
