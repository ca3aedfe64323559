//! Symmetric matrix storage
//!
//! Two shapes appear in the calibration state:
//!
//! - The scale/cross-coupling correction, a symmetric 3×3 matrix stored as
//!   its six upper-triangle entries inside the error state.
//! - The 9×9 state covariance, stored densely but kept symmetric by every
//!   write that goes through [`Covariance`].
//!
//! ## Packed Layout
//!
//! ```text
//! ┌             ┐      ┌             ┐
//! │ xx  xy  xz  │      │  0   1   2  │
//! │ xy  yy  yz  │  ->  │  1   3   4  │
//! │ xz  yz  zz  │      │  2   4   5  │
//! └             ┘      └             ┘
//! ```
//!
//! In the error state the packed block starts at [`STATE_SLOT_OFFSET`], so
//! entry (0,0) lives at state index 3 and entry (2,2) at state index 8.

use crate::constants::{STATE_DIM, SYMMETRIC3_LEN};
use crate::matrix::{add_assign, make_symmetric, multiply_scaled, SquareMatrix, Vector};

/// Index of packed slot 0 inside the error state
pub const STATE_SLOT_OFFSET: usize = STATE_DIM - SYMMETRIC3_LEN;

/// Symmetric 3×3 matrix stored as six packed values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Symmetric3 {
    packed: [f32; SYMMETRIC3_LEN],
}

impl Symmetric3 {
    /// Build from packed upper-triangle values
    pub const fn from_packed(packed: [f32; SYMMETRIC3_LEN]) -> Self {
        Self { packed }
    }

    /// Read the packed block out of a 9-entry error state
    pub fn from_state(state: &Vector<STATE_DIM>) -> Self {
        let mut packed = [0.0; SYMMETRIC3_LEN];
        packed.copy_from_slice(&state[STATE_SLOT_OFFSET..]);
        Self { packed }
    }

    /// Packed slot holding entry `(row, col)`
    ///
    /// `slot(r, c) == slot(c, r)` for all `r, c < 3`.
    #[inline]
    pub const fn slot(row: usize, col: usize) -> usize {
        let (r, c) = if row <= col { (row, col) } else { (col, row) };
        r * (5 - r) / 2 + c
    }

    /// Error-state index holding entry `(row, col)`
    #[inline]
    pub const fn state_index(row: usize, col: usize) -> usize {
        STATE_SLOT_OFFSET + Self::slot(row, col)
    }

    /// Entry `(row, col)`
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        debug_assert!(row < 3 && col < 3);
        self.packed[Self::slot(row, col)]
    }

    /// Write entry `(row, col)`, which is also entry `(col, row)`
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        debug_assert!(row < 3 && col < 3);
        self.packed[Self::slot(row, col)] = value;
    }

    /// The packed values
    pub fn packed(&self) -> [f32; SYMMETRIC3_LEN] {
        self.packed
    }

    /// Expand to a full row-major 3×3 matrix
    pub fn to_matrix(&self) -> SquareMatrix<3> {
        let mut m = [[0.0; 3]; 3];
        for (r, row) in m.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.get(r, c);
            }
        }
        m
    }

    /// y = S·x
    pub fn mul_vec(&self, x: &Vector<3>) -> Vector<3> {
        let mut y = [0.0; 3];
        for (r, out) in y.iter_mut().enumerate() {
            *out = self.get(r, 0) * x[0] + self.get(r, 1) * x[1] + self.get(r, 2) * x[2];
        }
        y
    }
}

/// Symmetric N×N covariance
///
/// Stored densely so it can be handed straight to the matrix kernel, but
/// only mutated through operations that keep `P[i][j] == P[j][i]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Covariance<const N: usize> {
    matrix: SquareMatrix<N>,
}

impl<const N: usize> Covariance<N> {
    /// All-zero covariance
    pub const fn zeroed() -> Self {
        Self { matrix: [[0.0; N]; N] }
    }

    /// Diagonal covariance with the given variances
    pub fn from_diagonal(variances: &Vector<N>) -> Self {
        let mut cov = Self::zeroed();
        for (i, &v) in variances.iter().enumerate() {
            cov.matrix[i][i] = v;
        }
        cov
    }

    /// Entry `(row, col)`
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.matrix[row][col]
    }

    /// Write `(row, col)` and its mirror `(col, row)`
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.matrix[row][col] = value;
        self.matrix[col][row] = value;
    }

    /// Variance of state entry `i`
    #[inline]
    pub fn diagonal(&self, i: usize) -> f32 {
        self.matrix[i][i]
    }

    /// All diagonal variances
    pub fn diagonal_vector(&self) -> Vector<N> {
        let mut d = [0.0; N];
        for (i, v) in d.iter_mut().enumerate() {
            *v = self.matrix[i][i];
        }
        d
    }

    /// Largest diagonal variance
    pub fn max_diagonal(&self) -> f32 {
        self.diagonal_vector()
            .iter()
            .fold(0.0f32, |max, &v| max.max(v))
    }

    /// Multiply every entry by `factor`
    pub fn scale_by(&mut self, factor: f32) {
        for row in self.matrix.iter_mut() {
            for v in row.iter_mut() {
                *v *= factor;
            }
        }
    }

    /// Add `variance` to every diagonal entry
    pub fn add_diagonal(&mut self, variance: f32) {
        for i in 0..N {
            self.matrix[i][i] += variance;
        }
    }

    /// Rank-1 downdate: P ← P − weight·g·gᵀ
    ///
    /// The outer product is formed with the kernel's scaled multiply and the
    /// result is symmetrized so rounding cannot split the two triangles.
    pub fn subtract_outer(&mut self, gain: &Vector<N>, weight: f32) {
        let mut column = [[0.0; 1]; N];
        for (dst, &g) in column.iter_mut().zip(gain.iter()) {
            dst[0] = g;
        }
        let row = [*gain];

        let mut outer = [[0.0; N]; N];
        multiply_scaled(&column, &row, -weight, &mut outer);

        add_assign(&mut self.matrix, &outer);
        make_symmetric(&mut self.matrix);
    }

    /// Dense row-major view
    pub fn as_matrix(&self) -> &SquareMatrix<N> {
        &self.matrix
    }

    /// True when every mirrored pair agrees within `tolerance`
    pub fn is_symmetric(&self, tolerance: f32) -> bool {
        for i in 0..N {
            for j in (i + 1)..N {
                if (self.matrix[i][j] - self.matrix[j][i]).abs() > tolerance {
                    return false;
                }
            }
        }
        true
    }
}
