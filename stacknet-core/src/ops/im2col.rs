//! Image-to-column transform.

use rayon::prelude::*;

use crate::error::StackNetError;
use crate::matrix::Matrix;

/// Rewrites sliding windows of `matrix` into rows of a new matrix.
///
/// The result has `out_rows * out_cols` rows of `kernel_rows * kernel_cols`
/// columns, where `out_rows = (rows - kernel_rows) / stride + 1` (columns
/// analogous); row `i` holds the row-major flattening of the `i`-th window of
/// a row-major scan. With this layout a convolution collapses to
/// `flatten(kernel) · im2col(input)ᵀ`.
///
/// Window rows are filled in parallel; each worker owns a disjoint chunk of
/// the output buffer and all workers are joined before the matrix is built.
pub fn im2col(
    matrix: &Matrix,
    kernel_rows: usize,
    kernel_cols: usize,
    stride: usize,
) -> Result<Matrix, StackNetError> {
    debug_assert!(stride >= 1);
    if kernel_rows > matrix.rows() || kernel_cols > matrix.cols() {
        return Err(StackNetError::ShapeMismatch {
            expected: vec![matrix.rows(), matrix.cols()],
            actual: vec![kernel_rows, kernel_cols],
            operation: "im2col".to_string(),
        });
    }
    let col_size = kernel_rows * kernel_cols;
    let out_rows = (matrix.rows() - kernel_rows) / stride + 1;
    let out_cols = (matrix.cols() - kernel_cols) / stride + 1;

    let mut data = vec![0.0; col_size * out_rows * out_cols];
    data.par_chunks_mut(col_size * out_cols)
        .enumerate()
        .for_each(|(y, chunk)| {
            let start_y = y * stride;
            let mut idx = 0;
            for x in 0..out_cols {
                let start_x = x * stride;
                for i in 0..kernel_rows {
                    for j in 0..kernel_cols {
                        chunk[idx] = matrix.get(start_y + i, start_x + j);
                        idx += 1;
                    }
                }
            }
        });

    Matrix::from_vec(out_rows * out_cols, col_size, data)
}

#[cfg(test)]
#[path = "im2col_test.rs"]
mod tests;
