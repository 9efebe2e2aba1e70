//! Dense-vector similarity primitives.
//!
//! Index vectors are L2-normalized once at build time so the matcher's hot
//! path is a single dot product per candidate. The full cosine (with norm
//! division) exists for callers holding unnormalized vectors and for tests.
//!
//! The catalog is on the order of hundreds of entries, so the exhaustive
//! scalar scan is the hot path; no approximate-nearest-neighbor structure
//! is used.

use thiserror::Error;

/// Errors from dense-vector arithmetic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimilarityError {
    /// Vectors of different lengths were combined.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Length of the first vector
        expected: usize,
        /// Length of the second vector
        actual: usize,
    },

    /// An empty vector was provided.
    #[error("Empty vector provided")]
    EmptyVector,

    /// A zero-magnitude vector makes cosine undefined.
    #[error("Zero magnitude vector - cosine undefined")]
    ZeroMagnitude,
}

/// L2 norm (Euclidean length) of a vector.
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Normalize a vector to unit length in-place.
///
/// A zero-magnitude vector is left untouched.
#[inline]
pub fn normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[inline]
fn validated(a: &[f32], b: &[f32]) -> Result<(), SimilarityError> {
    if a.is_empty() || b.is_empty() {
        return Err(SimilarityError::EmptyVector);
    }
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Dot product of two equal-length vectors.
///
/// For unit vectors this IS the cosine similarity; the matcher relies on
/// that to avoid re-normalizing per candidate.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    validated(a, b)?;
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Cosine similarity of two dense vectors, clamped to `[-1.0, 1.0]`.
///
/// # Errors
///
/// - [`SimilarityError::EmptyVector`] if either vector is empty
/// - [`SimilarityError::DimensionMismatch`] on length mismatch
/// - [`SimilarityError::ZeroMagnitude`] if either norm is zero
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    validated(a, b)?;
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return Err(SimilarityError::ZeroMagnitude);
    }
    // Clamp to absorb floating-point drift past the valid range.
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-6, "sim(u,u) should be 1.0, got {sim}");
    }

    #[test]
    fn cosine_is_symmetric() {
        let a = vec![0.3, -1.2, 4.0, 0.07];
        let b = vec![2.2, 0.9, -0.4, 1.5];
        let ab = cosine_similarity(&a, &b).unwrap();
        let ba = cosine_similarity(&b, &a).unwrap();
        assert!((ab - ba).abs() < 1e-7);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn cosine_opposite_vectors() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_dimension_mismatch() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert!(matches!(
            cosine_similarity(&a, &b),
            Err(SimilarityError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn cosine_empty_vector() {
        let a: Vec<f32> = vec![];
        let b = vec![1.0, 2.0];
        assert!(matches!(
            cosine_similarity(&a, &b),
            Err(SimilarityError::EmptyVector)
        ));
    }

    #[test]
    fn cosine_zero_magnitude() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert!(matches!(
            cosine_similarity(&a, &b),
            Err(SimilarityError::ZeroMagnitude)
        ));
    }

    #[test]
    fn dot_product_matches_manual() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];
        let dot = dot_product(&a, &b).unwrap();
        assert!((dot - 32.0).abs() < 1e-6);
    }

    #[test]
    fn dot_of_unit_vectors_equals_cosine() {
        let mut a = vec![3.0, -1.0, 2.0, 0.5];
        let mut b = vec![0.2, 4.0, -2.5, 1.0];
        let cos = cosine_similarity(&a, &b).unwrap();
        normalize(&mut a);
        normalize(&mut b);
        let dot = dot_product(&a, &b).unwrap();
        assert!((cos - dot).abs() < 1e-6, "cos={cos} dot={dot}");
    }

    #[test]
    fn l2_norm_basics() {
        assert!((l2_norm(&[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert!(l2_norm(&[0.0, 0.0, 0.0]).abs() < 1e-6);
    }

    #[test]
    fn normalize_produces_unit_norm() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn high_dimensional_stays_in_range() {
        let a: Vec<f32> = (0..384).map(|i| (i as f32) * 0.003).collect();
        let b: Vec<f32> = (0..384).map(|i| ((i as f32) * 0.003).sin()).collect();
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((-1.0..=1.0).contains(&sim));
        assert!(!sim.is_nan());
    }
}
