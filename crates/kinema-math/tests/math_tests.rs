//! Integration tests for kinema-math.

use kinema_math::decomposition::symmetric_eigen_2x2;
use kinema_math::sparse::{CsrMatrix, LinearSolver};
use kinema_math::{ProjectedGaussSeidel, Vec2};

// ─── Eigen Decomposition Tests ────────────────────────────────

#[test]
fn eigen_reconstructs_matrix() {
    let (a, b, d) = (3.0, 1.2, 2.0);
    let e = symmetric_eigen_2x2(a, b, d).unwrap();
    for (lambda, v) in e.values.iter().zip(e.vectors.iter()) {
        let av = Vec2::new(a * v.x + b * v.y, b * v.x + d * v.y);
        assert!((av - *v * *lambda).length() < 1e-4);
    }
}

#[test]
fn eigen_vectors_are_orthonormal() {
    let e = symmetric_eigen_2x2(1.0, -0.7, 5.0).unwrap();
    assert!((e.vectors[0].length() - 1.0).abs() < 1e-5);
    assert!((e.vectors[1].length() - 1.0).abs() < 1e-5);
    assert!(e.vectors[0].dot(e.vectors[1]).abs() < 1e-5);
    assert!(e.values[0] >= e.values[1]);
}

#[test]
fn eigen_rejects_nan() {
    let err = symmetric_eigen_2x2(f32::NAN, 0.0, 1.0);
    assert!(err.is_err());
}

// ─── Sparse Matrix Tests ──────────────────────────────────────

#[test]
fn csr_from_triplets() {
    let m = CsrMatrix::from_triplets(2, 2, &[(1, 1, 4.0), (0, 0, 2.0), (0, 1, 1.0)]);
    assert_eq!(m.nnz(), 3);
    assert_eq!(m.get(0, 1), 1.0);
    assert_eq!(m.get(1, 0), 0.0);
    assert_eq!(m.get(1, 1), 4.0);
}

#[test]
fn csr_sums_duplicates() {
    let m = CsrMatrix::from_triplets(1, 1, &[(0, 0, 1.5), (0, 0, 2.5)]);
    assert_eq!(m.nnz(), 1);
    assert_eq!(m.get(0, 0), 4.0);
}

#[test]
fn csr_mul_vec() {
    let m = CsrMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)]);
    let y = m.mul_vec(&[1.0, 2.0]);
    assert_eq!(y, vec![4.0, 7.0]);
}

#[test]
fn csr_serialization() {
    let m = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 1, 1.0)]);
    let json = serde_json::to_string(&m).unwrap();
    let recovered: CsrMatrix = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered.nnz(), 2);
}

// ─── Gauss-Seidel Tests ───────────────────────────────────────

#[test]
fn pgs_solves_unconstrained_system() {
    let a = CsrMatrix::from_triplets(2, 2, &[(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)]);
    let b = [1.0, 2.0];
    let mut x = [0.0; 2];
    let inf = f32::INFINITY;
    ProjectedGaussSeidel::new(50).solve(&mut x, &a, &b, &[-inf, -inf], &[inf, inf]);
    // Exact: x = (1/11, 7/11)
    assert!((x[0] - 1.0 / 11.0).abs() < 1e-4);
    assert!((x[1] - 7.0 / 11.0).abs() < 1e-4);
}

#[test]
fn pgs_respects_bounds() {
    let a = CsrMatrix::from_triplets(3, 3, &[
        (0, 0, 2.0), (0, 1, -1.0),
        (1, 0, -1.0), (1, 1, 2.0), (1, 2, -1.0),
        (2, 1, -1.0), (2, 2, 2.0),
    ]);
    let b = [-5.0, 10.0, 3.0];
    let min = [0.0, -1.0, -0.5];
    let max = [f32::INFINITY, 1.0, 0.5];
    for sweeps in 0..8 {
        let mut x = [7.0, -9.0, 0.25];
        ProjectedGaussSeidel::new(sweeps).solve(&mut x, &a, &b, &min, &max);
        for i in 0..3 {
            assert!(x[i] >= min[i] && x[i] <= max[i], "row {i} out of bounds after {sweeps} sweeps");
        }
    }
}

#[test]
fn pgs_zero_diagonal_row_is_clamped_zero() {
    let a = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0)]);
    let mut x = [0.0, 3.0];
    ProjectedGaussSeidel::new(4).solve(&mut x, &a, &[2.0, 5.0], &[0.0, 1.0], &[10.0, 10.0]);
    assert!((x[0] - 2.0).abs() < 1e-6);
    assert_eq!(x[1], 1.0);
}

#[test]
fn pgs_name() {
    assert_eq!(ProjectedGaussSeidel::default().name(), "projected_gauss_seidel");
}
