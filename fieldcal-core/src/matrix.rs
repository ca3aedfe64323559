//! Fixed-size matrix kernel
//!
//! Provides the linear algebra the filter needs without heap allocation.
//! All operations work on row-major fixed-size arrays whose dimensions are
//! checked by const generics, so a dimension mismatch is a compile error
//! rather than a runtime precondition.
//!
//! ## Memory Model
//!
//! ```text
//! SquareMatrix<9>: 81 × 4 bytes = 324 bytes
//! Vector<9>:        9 × 4 bytes =  36 bytes
//! ```
//!
//! Output buffers are taken by `&mut` and inputs by `&`, so the borrow
//! checker rules out an output aliasing an input.

use crate::numeric::{ActivePrimitives, NumericPrimitives};

/// Matrix type using const generics
pub type Matrix<const R: usize, const C: usize> = [[f32; C]; R];

/// Square matrix type
pub type SquareMatrix<const N: usize> = Matrix<N, N>;

/// Vector type
pub type Vector<const N: usize> = [f32; N];

/// Scaled matrix multiplication: C = k·(A × B)
///
/// Dimensions: A[R×K] × B[K×C] = C[R×C]
pub fn multiply_scaled<const R: usize, const K: usize, const C: usize>(
    a: &Matrix<R, K>,
    b: &Matrix<K, C>,
    scale: f32,
    result: &mut Matrix<R, C>,
) {
    for i in 0..R {
        for j in 0..C {
            let mut sum = 0.0;
            for k in 0..K {
                sum += a[i][k] * b[k][j];
            }
            result[i][j] = scale * sum;
        }
    }
}

/// Matrix multiplication: C = A × B
pub fn multiply<const R: usize, const K: usize, const C: usize>(
    a: &Matrix<R, K>,
    b: &Matrix<K, C>,
    result: &mut Matrix<R, C>,
) {
    multiply_scaled(a, b, 1.0, result);
}

/// Matrix transpose: B = Aᵀ
pub fn transpose<const R: usize, const C: usize>(
    a: &Matrix<R, C>,
    result: &mut Matrix<C, R>,
) {
    for i in 0..R {
        for j in 0..C {
            result[j][i] = a[i][j];
        }
    }
}

/// In-place addition: A += B
pub fn add_assign<const R: usize, const C: usize>(
    a: &mut Matrix<R, C>,
    b: &Matrix<R, C>,
) {
    for i in 0..R {
        for j in 0..C {
            a[i][j] += b[i][j];
        }
    }
}

/// Make matrix symmetric: A = (A + Aᵀ) / 2
pub fn make_symmetric<const N: usize>(matrix: &mut SquareMatrix<N>) {
    for i in 0..N {
        for j in i + 1..N {
            let avg = (matrix[i][j] + matrix[j][i]) * 0.5;
            matrix[i][j] = avg;
            matrix[j][i] = avg;
        }
    }
}

/// Copy column `j` of a matrix into a vector
pub fn column<const R: usize, const C: usize>(matrix: &Matrix<R, C>, j: usize) -> Vector<R> {
    let mut col = [0.0; R];
    for (i, row) in matrix.iter().enumerate() {
        col[i] = row[j];
    }
    col
}

/// Scaled Cholesky decomposition: k·A = L × Lᵀ
///
/// Decomposes `scale` times a symmetric positive semi-definite matrix into
/// lower triangular form. Only the lower triangle of `a` is read, and the
/// strict upper triangle of `l` is zeroed.
///
/// ## Algorithm
///
/// Column by column:
/// - Diagonal: L[j,j] = sqrt(k·A[j,j] - Σ(L[j,p]²))
/// - Below diagonal: L[i,j] = (k·A[i,j] - Σ(L[i,p]×L[j,p])) / L[j,j]
///
/// A column whose pivot is not strictly positive carries no variance, so it
/// is written as zeros instead of propagating NaN into the sigma points.
/// Returns the number of such collapsed pivots; zero for a positive definite
/// input.
pub fn cholesky_scaled<const N: usize>(
    a: &SquareMatrix<N>,
    scale: f32,
    l: &mut SquareMatrix<N>,
) -> usize {
    let mut collapsed = 0;

    for row in l.iter_mut() {
        *row = [0.0; N];
    }

    for j in 0..N {
        let mut sum = 0.0;
        for p in 0..j {
            sum += l[j][p] * l[j][p];
        }

        let pivot = scale * a[j][j] - sum;
        if !(pivot > 0.0) {
            collapsed += 1;
            continue;
        }

        let diag = ActivePrimitives::sqrt(pivot);
        let inv_diag = ActivePrimitives::recip(diag);
        l[j][j] = diag;

        for i in (j + 1)..N {
            let mut sum = 0.0;
            for p in 0..j {
                sum += l[i][p] * l[j][p];
            }
            l[i][j] = (scale * a[i][j] - sum) * inv_diag;
        }
    }

    collapsed
}
