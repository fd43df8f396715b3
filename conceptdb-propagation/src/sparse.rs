//! Compressed sparse rows and a conjugate-gradient solver.
//!
//! Row products run on rayon; each output entry is computed by one task in a
//! fixed column order, so results do not depend on the thread count. Dot
//! products stay sequential for the same reason.

use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Build from `(row, col, value)` triplets. Duplicates are summed;
    /// out-of-range entries are dropped.
    pub fn from_triplets<I>(rows: usize, cols: usize, triplets: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut entries: Vec<(usize, usize, f64)> = triplets
            .into_iter()
            .filter(|&(r, c, _)| r < rows && c < cols)
            .collect();
        // Stable sort keeps the summation order of duplicates fixed.
        entries.sort_by_key(|&(r, c, _)| (r, c));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(entries.len());
        let mut values: Vec<f64> = Vec::with_capacity(entries.len());
        let mut last: Option<(usize, usize)> = None;
        for (r, c, v) in entries {
            if last == Some((r, c)) {
                if let Some(slot) = values.last_mut() {
                    *slot += v;
                }
                continue;
            }
            col_idx.push(c);
            values.push(v);
            row_ptr[r + 1] += 1;
            last = Some((r, c));
        }
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// `(col, value)` pairs of one row.
    pub fn row(&self, r: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let span = self.row_ptr[r]..self.row_ptr[r + 1];
        self.col_idx[span.clone()]
            .iter()
            .copied()
            .zip(self.values[span].iter().copied())
    }

    /// `y = self · x`.
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.cols);
        (0..self.rows)
            .into_par_iter()
            .map(|r| self.row(r).map(|(c, v)| v * x[c]).sum::<f64>())
            .collect()
    }

    pub fn transpose(&self) -> CsrMatrix {
        let triplets = (0..self.rows).flat_map(|r| self.row(r).map(move |(c, v)| (c, r, v)));
        CsrMatrix::from_triplets(self.cols, self.rows, triplets)
    }

    /// Diagonal of `selfᵀ · diag(weights) · self`.
    pub fn gram_diagonal(&self, weights: &[f64]) -> Vec<f64> {
        let mut diag = vec![0.0; self.cols];
        for (r, &w) in weights.iter().enumerate().take(self.rows) {
            for (c, v) in self.row(r) {
                diag[c] += w * v * v;
            }
        }
        diag
    }
}

/// A symmetric operator the solver only needs to apply.
pub trait LinearOperator {
    fn dim(&self) -> usize;
    fn apply(&self, x: &[f64]) -> Vec<f64>;
}

impl LinearOperator for CsrMatrix {
    fn dim(&self) -> usize {
        self.rows
    }

    fn apply(&self, x: &[f64]) -> Vec<f64> {
        self.mul_vec(x)
    }
}

/// `Aᵀ · diag(g) · A` restricted to the unpinned coordinates. Never formed
/// explicitly.
pub struct WeightedNormal<'a> {
    a: &'a CsrMatrix,
    at: &'a CsrMatrix,
    g: &'a [f64],
    pinned: &'a [bool],
}

impl<'a> WeightedNormal<'a> {
    /// `at` must be `a.transpose()`; `pinned` has one flag per column of `a`.
    pub fn new(a: &'a CsrMatrix, at: &'a CsrMatrix, g: &'a [f64], pinned: &'a [bool]) -> Self {
        Self { a, at, g, pinned }
    }
}

impl LinearOperator for WeightedNormal<'_> {
    fn dim(&self) -> usize {
        self.a.cols()
    }

    fn apply(&self, x: &[f64]) -> Vec<f64> {
        let free: Vec<f64> = x
            .iter()
            .zip(self.pinned)
            .map(|(&v, &p)| if p { 0.0 } else { v })
            .collect();
        let currents: Vec<f64> = self
            .a
            .mul_vec(&free)
            .into_iter()
            .zip(self.g)
            .map(|(v, g)| v * g)
            .collect();
        let mut y = self.at.mul_vec(&currents);
        for (v, &p) in y.iter_mut().zip(self.pinned) {
            if p {
                *v = 0.0;
            }
        }
        y
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub x: Vec<f64>,
    pub iterations: usize,
    /// Final residual norm relative to `‖b‖`.
    pub relative_residual: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    #[error("search direction has non-positive curvature at step {iteration}")]
    Breakdown { iteration: usize },
    #[error("no convergence after {iterations} steps (relative residual {relative_residual:e})")]
    NotConverged {
        iterations: usize,
        relative_residual: f64,
    },
}

/// Solve `op · x = b` for a symmetric positive (semi-)definite operator,
/// starting from zero. Stops once `‖r‖ ≤ tolerance · ‖b‖`.
pub fn conjugate_gradient(
    op: &dyn LinearOperator,
    b: &[f64],
    tolerance: f64,
    max_iterations: usize,
) -> Result<Solution, SolveError> {
    let n = op.dim();
    let mut x = vec![0.0; n];
    let b_norm = norm(b);
    if b_norm == 0.0 {
        return Ok(Solution {
            x,
            iterations: 0,
            relative_residual: 0.0,
        });
    }

    let mut r = b.to_vec();
    let mut p = r.clone();
    let mut rr = dot(&r, &r);

    for iteration in 1..=max_iterations {
        let ap = op.apply(&p);
        let pap = dot(&p, &ap);
        if !pap.is_finite() || pap <= 0.0 {
            return Err(SolveError::Breakdown { iteration });
        }
        let alpha = rr / pap;
        for ((xi, ri), (pi, api)) in x.iter_mut().zip(r.iter_mut()).zip(p.iter().zip(&ap)) {
            *xi += alpha * pi;
            *ri -= alpha * api;
        }
        let rr_next = dot(&r, &r);
        let relative_residual = rr_next.sqrt() / b_norm;
        if relative_residual <= tolerance {
            return Ok(Solution {
                x,
                iterations: iteration,
                relative_residual,
            });
        }
        let beta = rr_next / rr;
        for (pi, ri) in p.iter_mut().zip(&r) {
            *pi = ri + beta * *pi;
        }
        rr = rr_next;
    }

    Err(SolveError::NotConverged {
        iterations: max_iterations,
        relative_residual: rr.sqrt() / b_norm,
    })
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// `‖a − b‖₂`.
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
