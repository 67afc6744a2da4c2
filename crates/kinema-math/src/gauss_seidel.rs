//! Projected Gauss-Seidel solver for box-constrained systems.

use tracing::trace;

use crate::sparse::{CsrMatrix, LinearSolver};

/// Fixed-sweep projected Gauss-Seidel.
///
/// Each sweep updates every row toward satisfying its equation using the
/// latest values of the other rows, then projects the row back into
/// `[min, max]`. Rows with a vanishing diagonal are pinned to the clamped
/// zero since they cannot be solved for.
#[derive(Debug, Clone)]
pub struct ProjectedGaussSeidel {
    /// Number of sweeps per solve.
    pub iterations: u32,
}

impl ProjectedGaussSeidel {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }
}

impl Default for ProjectedGaussSeidel {
    fn default() -> Self {
        Self::new(kinema_types::constants::DEFAULT_SOLVER_ITERATIONS)
    }
}

impl LinearSolver for ProjectedGaussSeidel {
    fn solve(&self, out: &mut [f32], a: &CsrMatrix, b: &[f32], min: &[f32], max: &[f32]) {
        let n = a.rows.min(out.len()).min(b.len());

        for i in 0..n {
            out[i] = clamp(out[i], min[i], max[i]);
        }

        for _ in 0..self.iterations {
            for i in 0..n {
                let mut diag = 0.0;
                let mut off = 0.0;
                for (c, v) in a.row(i) {
                    if c == i {
                        diag = v;
                    } else {
                        off += v * out[c];
                    }
                }

                let x = if diag.abs() > f32::EPSILON {
                    (b[i] - off) / diag
                } else {
                    0.0
                };
                out[i] = clamp(x, min[i], max[i]);
            }
        }

        trace!(rows = n, sweeps = self.iterations, "pgs solve");
    }

    fn name(&self) -> &str {
        "projected_gauss_seidel"
    }
}

/// Clamp that tolerates infinite bounds and maps NaN to the nearest bound.
#[inline]
fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    if x.is_nan() {
        return 0.0f32.max(lo).min(hi);
    }
    x.max(lo).min(hi)
}
