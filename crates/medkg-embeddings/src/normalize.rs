//! Vector scoring utilities.

/// L2 normalize a vector (unit length).
pub fn normalize_l2(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Cosine similarity in `[-1.0, 1.0]`.
///
/// Returns `0.0` when either vector is empty, the lengths differ, either
/// norm is zero, or the inputs are not finite. Never panics.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // sqrt of the product keeps similarity(v, v) at exactly 1.0
    let similarity = dot / (norm_a * norm_b).sqrt();
    if !similarity.is_finite() {
        return 0.0;
    }
    similarity.clamp(-1.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize_l2(&mut v);
        assert!((v[0] - 0.6).abs() < 0.001);
        assert!((v[1] - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0];
        let c = vec![0.0, 1.0];
        let d = vec![-1.0, 0.0];

        assert!(cosine_similarity(&a, &c).abs() < 0.001); // Orthogonal
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001); // Opposite
    }

    #[test]
    fn self_similarity_is_exactly_one() {
        let vectors = [
            vec![1.0, 0.0],
            vec![0.1, 0.2, 0.3],
            vec![-3.5, 7.25, 0.001, 42.0],
            vec![1e-3; 1536],
        ];
        for v in &vectors {
            assert_eq!(cosine_similarity(v, v), 1.0);
        }
    }

    #[test]
    fn empty_or_degenerate_vectors_score_zero() {
        let v = vec![0.3, 0.4];
        assert_eq!(cosine_similarity(&[], &v), 0.0);
        assert_eq!(cosine_similarity(&v, &[]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &v), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0, 3.0], &v), 0.0);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &v), 0.0);
    }
}
