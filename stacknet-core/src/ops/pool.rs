//! Pooling over strided windows, with the argmax bookkeeping the backward
//! pass needs to route gradients to the winning input cell.

use std::fmt;

use rayon::prelude::*;

use crate::error::StackNetError;
use crate::matrix::Matrix;

/// Supported pooling flavours.
///
/// Only [`PoolKind::Max`] is implemented; requesting `Min` or `Avg` yields a
/// checked [`StackNetError::UnsupportedPooling`] instead of aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Max,
    Min,
    Avg,
}

impl PoolKind {
    /// Lowercase tag used by the persisted network format.
    pub fn tag(&self) -> &'static str {
        match self {
            PoolKind::Max => "max",
            PoolKind::Min => "min",
            PoolKind::Avg => "avg",
        }
    }

    /// Parses a persisted-format tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "max" => Some(PoolKind::Max),
            "min" => Some(PoolKind::Min),
            "avg" => Some(PoolKind::Avg),
            _ => None,
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Pools a channel-stacked matrix with a square `window` at `stride`.
///
/// The output stacks `channels` blocks of `out_rows × out_cols`. When
/// `with_masks` is set the function also records, for every output cell in
/// channel-major row-major order, the absolute `(row, col)` coordinates of
/// the winning input cell; the winner is the first maximum encountered in a
/// row-major window scan under strict `>` comparison, so duplicated maxima
/// never produce two winners.
///
/// Output rows are computed in parallel over disjoint chunks, joined before
/// the result is returned.
pub fn pool_2d(
    matrix: &Matrix,
    out_rows: usize,
    out_cols: usize,
    channels: usize,
    window: usize,
    stride: usize,
    kind: PoolKind,
    with_masks: bool,
) -> Result<(Matrix, Option<Vec<(usize, usize)>>), StackNetError> {
    debug_assert!(stride >= 1);
    if kind != PoolKind::Max {
        return Err(StackNetError::UnsupportedPooling { kind });
    }
    if channels == 0 || matrix.rows() % channels != 0 {
        return Err(StackNetError::ChannelMismatch {
            rows: matrix.rows(),
            channels,
        });
    }
    let rows_per_channel = matrix.rows() / channels;
    let span_rows = out_rows.saturating_sub(1) * stride + window;
    let span_cols = out_cols.saturating_sub(1) * stride + window;
    if (out_rows > 0 && span_rows > rows_per_channel)
        || (out_cols > 0 && span_cols > matrix.cols())
    {
        return Err(StackNetError::ShapeMismatch {
            expected: vec![rows_per_channel, matrix.cols()],
            actual: vec![span_rows, span_cols],
            operation: "pool_2d".to_string(),
        });
    }

    let mut out = Matrix::zeros(out_rows * channels, out_cols);
    if !with_masks {
        out.data_mut()
            .par_chunks_mut(out_cols)
            .enumerate()
            .for_each(|(r, row_out)| {
                let channel = r / out_rows;
                let y = r % out_rows;
                for (x, cell) in row_out.iter_mut().enumerate() {
                    let (value, _, _) =
                        window_max(matrix, channel * rows_per_channel, y, x, window, stride);
                    *cell = value;
                }
            });
        return Ok((out, None));
    }

    let mut mask = vec![(0usize, 0usize); out_rows * channels * out_cols];
    out.data_mut()
        .par_chunks_mut(out_cols)
        .zip(mask.par_chunks_mut(out_cols))
        .enumerate()
        .for_each(|(r, (row_out, row_mask))| {
            let channel = r / out_rows;
            let y = r % out_rows;
            for x in 0..out_cols {
                let (value, max_row, max_col) =
                    window_max(matrix, channel * rows_per_channel, y, x, window, stride);
                row_out[x] = value;
                row_mask[x] = (max_row, max_col);
            }
        });
    Ok((out, Some(mask)))
}

/// Maximum of one pooling window, with the absolute coordinates of the first
/// cell holding it.
fn window_max(
    matrix: &Matrix,
    channel_base: usize,
    y: usize,
    x: usize,
    window: usize,
    stride: usize,
) -> (f64, usize, usize) {
    let start_row = channel_base + y * stride;
    let start_col = x * stride;
    let mut best = f64::NEG_INFINITY;
    let mut best_row = start_row;
    let mut best_col = start_col;
    for i in 0..window {
        for j in 0..window {
            let value = matrix.get(start_row + i, start_col + j);
            if value > best {
                best = value;
                best_row = start_row + i;
                best_col = start_col + j;
            }
        }
    }
    (best, best_row, best_col)
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod tests;
