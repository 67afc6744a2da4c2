//! # kinema-math
//!
//! Linear algebra primitives for the Kinema simulation engine.
//!
//! Provides:
//! - Re-exports of `glam` types (`Vec2`, `Mat2`, `Affine2`)
//! - Planar helpers (scalar cross products, pose transforms)
//! - Closed-form eigen decomposition of symmetric 2×2 matrices
//! - Sparse matrix representation (CSR) and the bounded linear solver interface

pub mod decomposition;
pub mod gauss_seidel;
pub mod planar;
pub mod sparse;

pub use decomposition::{symmetric_eigen_2x2, SymmetricEigen2};
pub use gauss_seidel::ProjectedGaussSeidel;
pub use planar::{cross, cross_sv, pose};
pub use sparse::{CsrMatrix, LinearSolver};

// Re-export glam types as the canonical math types for Kinema.
pub use glam::{Affine2, Mat2, Vec2};
