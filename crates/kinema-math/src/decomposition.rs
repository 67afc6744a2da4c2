//! Matrix decompositions for shape analysis.
//!
//! Provides the closed-form eigen decomposition of a symmetric 2×2 matrix,
//! used to orient bounding boxes along the principal axes of a point cloud.

use glam::Vec2;
use kinema_types::constants::EPSILON;
use kinema_types::{KinemaError, KinemaResult};

/// Eigenvalues and unit eigenvectors of a symmetric 2×2 matrix.
///
/// `values[0] >= values[1]`, and `vectors` form a right-handed orthonormal basis.
#[derive(Debug, Clone, Copy)]
pub struct SymmetricEigen2 {
    pub values: [f32; 2],
    pub vectors: [Vec2; 2],
}

/// Decompose the symmetric matrix `[[a, b], [b, d]]`.
///
/// Eigenvalues: λ = (a+d)/2 ± sqrt(((a-d)/2)² + b²). The discriminant is
/// non-negative for every finite input; a negative or NaN discriminant means
/// the input was corrupt and is reported as an invariant violation.
pub fn symmetric_eigen_2x2(a: f32, b: f32, d: f32) -> KinemaResult<SymmetricEigen2> {
    let half_trace = 0.5 * (a + d);
    let half_diff = 0.5 * (a - d);
    let disc = half_diff * half_diff + b * b;

    if disc.is_nan() || disc < 0.0 {
        return Err(KinemaError::InvariantViolation(format!(
            "degenerate covariance matrix [[{a}, {b}], [{b}, {d}]] (discriminant {disc})"
        )));
    }

    let root = disc.sqrt();
    let lambda0 = half_trace + root;
    let lambda1 = half_trace - root;

    let v0 = if b.abs() > EPSILON {
        Vec2::new(lambda0 - d, b).normalize()
    } else if a >= d {
        Vec2::X
    } else {
        Vec2::Y
    };

    Ok(SymmetricEigen2 {
        values: [lambda0, lambda1],
        vectors: [v0, v0.perp()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_matrix() {
        let e = symmetric_eigen_2x2(1.0, 0.0, 4.0).unwrap();
        assert!((e.values[0] - 4.0).abs() < 1e-6);
        assert!((e.values[1] - 1.0).abs() < 1e-6);
        assert!((e.vectors[0].dot(Vec2::Y)).abs() > 0.999);
    }
}
