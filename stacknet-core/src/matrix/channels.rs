//! Channel-block utilities for channel-stacked matrices.

use crate::error::StackNetError;
use crate::matrix::Matrix;

/// Copies channel `c` out of a channel-stacked matrix.
///
/// The matrix rows must divide evenly into `channels` blocks; the result is
/// the row block `[c * rows/channels, (c+1) * rows/channels)`.
pub fn extract_channel(
    matrix: &Matrix,
    channels: usize,
    c: usize,
) -> Result<Matrix, StackNetError> {
    if channels == 0 || matrix.rows() % channels != 0 {
        return Err(StackNetError::ChannelMismatch {
            rows: matrix.rows(),
            channels,
        });
    }
    if c >= channels {
        return Err(StackNetError::ShapeMismatch {
            expected: vec![channels],
            actual: vec![c],
            operation: "extract_channel".to_string(),
        });
    }
    let block_rows = matrix.rows() / channels;
    let cols = matrix.cols();
    let start = c * block_rows * cols;
    let end = start + block_rows * cols;
    Matrix::from_vec(block_rows, cols, matrix.data()[start..end].to_vec())
}

/// Vertically concatenates two matrices with equal column counts.
pub fn stack_channels(top: &Matrix, bottom: &Matrix) -> Result<Matrix, StackNetError> {
    if top.cols() != bottom.cols() {
        return Err(StackNetError::ShapeMismatch {
            expected: vec![top.cols()],
            actual: vec![bottom.cols()],
            operation: "stack_channels".to_string(),
        });
    }
    let mut data = Vec::with_capacity(top.data().len() + bottom.data().len());
    data.extend_from_slice(top.data());
    data.extend_from_slice(bottom.data());
    Matrix::from_vec(top.rows() + bottom.rows(), top.cols(), data)
}

/// Relabels a matrix's row-major buffer with new dimensions.
///
/// The products of the source and target dimensions must agree.
pub fn reshape(matrix: &Matrix, rows: usize, cols: usize) -> Result<Matrix, StackNetError> {
    if rows * cols != matrix.rows() * matrix.cols() {
        return Err(StackNetError::DimensionMismatch {
            expected: matrix.rows() * matrix.cols(),
            actual: rows * cols,
        });
    }
    Matrix::from_vec(rows, cols, matrix.data().to_vec())
}

#[cfg(test)]
#[path = "channels_test.rs"]
mod tests;
