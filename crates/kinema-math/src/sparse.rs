//! Sparse matrix representation and solver interface.
//!
//! Provides a CSR (Compressed Sparse Row) matrix and the trait for
//! bounded linear solvers consumed by the constraint solver.

use serde::{Deserialize, Serialize};

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores a sparse matrix in row-major order with column indices sorted
/// within each row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrMatrix {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Row pointer array (length = rows + 1).
    /// `row_ptr[i]..row_ptr[i+1]` are the indices into `col_idx` and `values`
    /// for non-zeros in row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices of non-zero entries.
    pub col_idx: Vec<usize>,
    /// Non-zero values.
    pub values: Vec<f32>,
}

impl CsrMatrix {
    /// Creates an empty CSR matrix with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Returns the number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Creates a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries are summed.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f32)]) -> Self {
        let mut sorted: Vec<(usize, usize, f32)> = triplets
            .iter()
            .copied()
            .filter(|&(r, c, _)| r < rows && c < cols)
            .collect();
        sorted.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(sorted.len());
        let mut values: Vec<f32> = Vec::with_capacity(sorted.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, v) in sorted {
            if last == Some((r, c)) {
                if let Some(tail) = values.last_mut() {
                    *tail += v;
                }
                continue;
            }
            col_idx.push(c);
            values.push(v);
            row_ptr[r + 1] += 1;
            last = Some((r, c));
        }

        for i in 0..rows {
            row_ptr[i + 1] += row_ptr[i];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Iterates the `(col, value)` entries of one row.
    pub fn row(&self, r: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let range = self.row_ptr[r]..self.row_ptr[r + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Returns the entry at `(r, c)`, or zero when it is not stored.
    pub fn get(&self, r: usize, c: usize) -> f32 {
        let range = self.row_ptr[r]..self.row_ptr[r + 1];
        match self.col_idx[range.clone()].binary_search(&c) {
            Ok(pos) => self.values[range.start + pos],
            Err(_) => 0.0,
        }
    }

    /// Computes `y = A x`.
    pub fn mul_vec(&self, x: &[f32]) -> Vec<f32> {
        (0..self.rows)
            .map(|r| self.row(r).map(|(c, v)| v * x[c]).sum())
            .collect()
    }
}

/// Trait for bounded (box-constrained) linear solvers.
///
/// Solves `A x = b` subject to `min[i] <= x[i] <= max[i]`. `out` carries the
/// initial guess on entry (warm start) and the solution on exit. Every entry
/// of `out` must lie within its bounds on return, whatever the quality of
/// the solution.
pub trait LinearSolver: Send + Sync {
    fn solve(&self, out: &mut [f32], a: &CsrMatrix, b: &[f32], min: &[f32], max: &[f32]);

    /// Returns the solver's name.
    fn name(&self) -> &str;
}
