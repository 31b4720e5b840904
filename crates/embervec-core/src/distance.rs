//! Similarity primitives shared by every index and store.
//!
//! All kernels use explicit SIMD through the `wide` crate (8 f32 lanes with
//! fused multiply-add), falling back to scalar code for the remainder.
//!
//! Cosine similarity is the only scoring function exposed to callers. The
//! flat accelerated index ranks by squared L2 over unit-normalized rows, which
//! is monotonic with cosine; [`score_from_squared_l2`] converts back.

use crate::error::{Error, Result};
use wide::f32x8;

/// Validates that a caller-supplied vector has the collection dimension.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] naming expected and actual lengths.
#[inline]
pub fn validate_dimension(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, actual })
    }
}

/// Computes cosine similarity with a single fused pass over both vectors.
///
/// Returns a value in `[-1, 1]`. If either vector has zero magnitude the
/// result is `0.0`.
///
/// # Panics
///
/// Panics if vectors have different lengths. Callers validate dimensions
/// with [`validate_dimension`] first.
///
/// # Example
///
/// ```
/// use embervec_core::distance::cosine_similarity;
///
/// let a = [1.0, 0.0, 0.0];
/// assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
/// assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
/// ```
#[inline]
#[must_use]
#[allow(clippy::similar_names)]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let len = a.len();
    let simd_len = len / 8;
    let remainder = len % 8;

    let mut dot_sum = f32x8::ZERO;
    let mut norm_a_sum = f32x8::ZERO;
    let mut norm_b_sum = f32x8::ZERO;

    for i in 0..simd_len {
        let offset = i * 8;
        let va = f32x8::from(&a[offset..offset + 8]);
        let vb = f32x8::from(&b[offset..offset + 8]);

        dot_sum = va.mul_add(vb, dot_sum);
        norm_a_sum = va.mul_add(va, norm_a_sum);
        norm_b_sum = vb.mul_add(vb, norm_b_sum);
    }

    let mut dot = dot_sum.reduce_add();
    let mut norm_a_sq = norm_a_sum.reduce_add();
    let mut norm_b_sq = norm_b_sum.reduce_add();

    let base = simd_len * 8;
    for i in 0..remainder {
        let ai = a[base + i];
        let bi = b[base + i];
        dot += ai * bi;
        norm_a_sq += ai * ai;
        norm_b_sq += bi * bi;
    }

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Computes the L2 norm (magnitude) of a vector.
#[inline]
#[must_use]
pub fn norm(v: &[f32]) -> f32 {
    let len = v.len();
    let simd_len = len / 8;
    let remainder = len % 8;

    let mut sum = f32x8::ZERO;

    for i in 0..simd_len {
        let offset = i * 8;
        let vv = f32x8::from(&v[offset..offset + 8]);
        sum = vv.mul_add(vv, sum);
    }

    let mut result = sum.reduce_add();

    let base = simd_len * 8;
    for i in 0..remainder {
        result += v[base + i] * v[base + i];
    }

    result.sqrt()
}

/// Returns a unit-length copy of `v`. A zero vector stays zero.
#[must_use]
pub fn normalized(v: &[f32]) -> Vec<f32> {
    let n = norm(v);
    if n == 0.0 {
        return vec![0.0; v.len()];
    }
    v.iter().map(|x| x / n).collect()
}

/// Computes squared L2 distance.
///
/// # Panics
///
/// Panics if vectors have different lengths.
#[inline]
#[must_use]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let len = a.len();
    let simd_len = len / 8;
    let remainder = len % 8;

    let mut sum = f32x8::ZERO;

    for i in 0..simd_len {
        let offset = i * 8;
        let va = f32x8::from(&a[offset..offset + 8]);
        let vb = f32x8::from(&b[offset..offset + 8]);
        let diff = va - vb;
        sum = diff.mul_add(diff, sum);
    }

    let mut result = sum.reduce_add();

    let base = simd_len * 8;
    for i in 0..remainder {
        let diff = a[base + i] - b[base + i];
        result += diff * diff;
    }

    result
}

/// Converts a squared L2 distance between unit vectors into cosine similarity.
///
/// For unit vectors `|a - b|² = 2 - 2·cos(a, b)`.
#[inline]
#[must_use]
pub fn score_from_squared_l2(distance: f32) -> f32 {
    (1.0 - distance / 2.0).clamp(-1.0, 1.0)
}

/// Sorts `(id, score)` pairs by descending score under IEEE total order, so
/// NaN scores never break the sort.
pub fn sort_by_score_desc(results: &mut [(u64, f32)]) {
    results.sort_by(|a, b| b.1.total_cmp(&a.1));
}
