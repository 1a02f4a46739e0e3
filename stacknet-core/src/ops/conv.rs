//! Multi-channel 2D convolution built on the im2col transform.

use crate::error::StackNetError;
use crate::matrix::{extract_channel, reshape, Matrix};
use crate::ops::im2col::im2col;

/// Convolves a channel-stacked matrix with a channel-stacked kernel.
///
/// Both arguments hold `channels` vertically stacked blocks. Each channel is
/// convolved on its own and the per-channel results are summed element-wise,
/// so the output shape is `((H-kH)/stride+1) × ((W-kW)/stride+1)` regardless
/// of the channel count. Stacking multiple filters into a multi-channel
/// output happens one level up, in the convolutional layer.
pub fn convolve_2d(
    matrix: &Matrix,
    kernel: &Matrix,
    channels: usize,
    stride: usize,
) -> Result<Matrix, StackNetError> {
    let mut out: Option<Matrix> = None;
    for c in 0..channels {
        let partial_matrix = extract_channel(matrix, channels, c)?;
        let partial_kernel = extract_channel(kernel, channels, c)?;
        let partial = convolve_single(&partial_matrix, &partial_kernel, stride)?;
        match out {
            None => out = Some(partial),
            Some(ref mut sum) => sum.add_assign(&partial)?,
        }
    }
    out.ok_or(StackNetError::ChannelMismatch {
        rows: matrix.rows(),
        channels,
    })
}

/// Single-channel convolution: one im2col unroll, one matrix product and a
/// reshape back to the output grid.
fn convolve_single(
    matrix: &Matrix,
    kernel: &Matrix,
    stride: usize,
) -> Result<Matrix, StackNetError> {
    let windows = im2col(matrix, kernel.rows(), kernel.cols(), stride)?;
    let out_rows = (matrix.rows() - kernel.rows()) / stride + 1;
    let out_cols = (matrix.cols() - kernel.cols()) / stride + 1;
    let kernel_vector = kernel.flatten_row();
    let product = kernel_vector.matmul(&windows.transpose())?;
    reshape(&product, out_rows, out_cols)
}

#[cfg(test)]
#[path = "conv_test.rs"]
mod tests;
