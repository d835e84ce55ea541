//! Vector normalization for inner-product search

/// Scale a vector to unit L2 length
///
/// Zero vectors are returned unchanged. Inner product of two normalized
/// vectors equals their cosine similarity.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let magnitude: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / magnitude).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_unit_length() {
        let v = normalize(&[3.0, 4.0]);
        assert_relative_eq!(v[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(v[1], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_normalized_dot_is_cosine() {
        let a = [0.3, -1.2, 2.5];
        let b = [1.0, 0.4, 0.9];
        let (na, nb) = (normalize(&a), normalize(&b));
        let dot: f32 = na.iter().zip(nb.iter()).map(|(x, y)| x * y).sum();
        let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();
        let cosine = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum::<f32>() / (norm(&a) * norm(&b));
        assert_relative_eq!(dot, cosine, epsilon = 1e-6);
    }
}
