//! 90-degree block rotations.
//!
//! The backward convolution pass correlates a loss gradient against a
//! 180-degree rotated kernel, which is equivalent to convolving the gradient
//! with the original kernel in the transposed direction needed for the
//! input gradient.

use crate::matrix::Matrix;

/// Rotates a block clockwise by 90 degrees.
pub fn rotate_90(matrix: &Matrix) -> Matrix {
    let rows = matrix.rows();
    let cols = matrix.cols();
    let mut out = Matrix::zeros(cols, rows);
    for y in 0..rows {
        for x in 0..cols {
            out.set(x, rows - y - 1, matrix.get(y, x));
        }
    }
    out
}

/// Rotates a block by 180 degrees.
pub fn rotate_180(matrix: &Matrix) -> Matrix {
    rotate_90(&rotate_90(matrix))
}

/// Rotates a block clockwise by 270 degrees.
pub fn rotate_270(matrix: &Matrix) -> Matrix {
    rotate_90(&rotate_180(matrix))
}

#[cfg(test)]
#[path = "rotate_test.rs"]
mod tests;
