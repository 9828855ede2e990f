//! LatticeBasis — the lattice L = { Bᵀ·k : k ∈ Zⁿ }
//!
//! Rows of `B` are the basis vectors. Lattice coordinates of a point `x`
//! are the solution `u` of `Bᵀ·u = x`. The inverse of `Bᵀ` is computed once
//! at construction and only read afterwards, so a basis can be shared across
//! threads without locking.

use crate::error::{FuzzyKeyError, Result};
use nalgebra::{DMatrix, DVector};

/// Largest accepted ratio between the extreme singular values of the basis
const MAX_CONDITION_NUMBER: f64 = 1e12;

#[derive(Debug, Clone)]
pub struct LatticeBasis {
    /// Basis vectors as rows (n × n)
    rows: DMatrix<f64>,
    /// Bᵀ — basis vectors as columns
    transpose: DMatrix<f64>,
    /// (Bᵀ)⁻¹
    transpose_inv: DMatrix<f64>,
    condition_number: f64,
}

impl LatticeBasis {
    /// Validate and precompute a basis from its row matrix
    pub fn new(rows: DMatrix<f64>) -> Result<Self> {
        if rows.nrows() == 0 {
            return Err(FuzzyKeyError::InvalidParameter("basis must not be empty".into()));
        }
        if !rows.is_square() {
            return Err(FuzzyKeyError::DimensionMismatch {
                expected: rows.nrows(),
                actual: rows.ncols(),
            });
        }
        if rows.iter().any(|x| !x.is_finite()) {
            return Err(FuzzyKeyError::Numerical("basis contains non-finite entries".into()));
        }

        let transpose = rows.transpose();
        let singular = transpose.clone().svd(false, false).singular_values;
        let condition_number = singular.max() / singular.min();
        // NaN (all-zero basis) fails this comparison too
        if !(condition_number <= MAX_CONDITION_NUMBER) {
            return Err(FuzzyKeyError::Numerical(format!(
                "basis is singular or ill-conditioned (condition number {:.3e})",
                condition_number
            )));
        }

        let transpose_inv = transpose
            .clone()
            .try_inverse()
            .ok_or_else(|| FuzzyKeyError::Numerical("basis is not invertible".into()))?;

        Ok(Self {
            rows,
            transpose,
            transpose_inv,
            condition_number,
        })
    }

    /// Build from nested rows, e.g. `[[1, 0], [0.5, 0.866]]`
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n) {
            return Err(FuzzyKeyError::DimensionMismatch {
                expected: n,
                actual: bad.len(),
            });
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(DMatrix::from_row_slice(n, n, &flat))
    }

    /// Dimension n of the ambient space
    pub fn dim(&self) -> usize {
        self.rows.nrows()
    }

    pub fn rows(&self) -> &DMatrix<f64> {
        &self.rows
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows
            .row_iter()
            .map(|r| r.iter().copied().collect())
            .collect()
    }

    pub fn condition_number(&self) -> f64 {
        self.condition_number
    }

    /// Lattice coordinates `u` with `Bᵀ·u = x`
    pub fn coordinates(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.check_dim(x)?;
        Ok(&self.transpose_inv * x)
    }

    /// The point `Bᵀ·u` for (usually integral) coordinates `u`
    pub fn point(&self, coords: &DVector<f64>) -> Result<DVector<f64>> {
        self.check_dim(coords)?;
        Ok(&self.transpose * coords)
    }

    /// Length of the shortest basis vector, an upper bound on the minimum
    /// distance of the lattice
    pub fn shortest_basis_vector(&self) -> f64 {
        self.rows
            .row_iter()
            .map(|r| r.norm())
            .fold(f64::INFINITY, f64::min)
    }

    fn check_dim(&self, x: &DVector<f64>) -> Result<()> {
        if x.len() != self.dim() {
            return Err(FuzzyKeyError::DimensionMismatch {
                expected: self.dim(),
                actual: x.len(),
            });
        }
        Ok(())
    }
}
