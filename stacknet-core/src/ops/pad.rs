//! Zero and edge-replicate padding.

use rayon::prelude::*;

use crate::matrix::Matrix;

/// Returns `matrix` enlarged by `margin` rows and columns on every side,
/// with the new border filled with zeroes.
///
/// Output rows are produced in parallel over disjoint chunks.
pub fn zero_padding(matrix: &Matrix, margin: usize) -> Matrix {
    let rows = matrix.rows();
    let cols = matrix.cols();
    let new_cols = cols + margin * 2;

    let mut out = Matrix::zeros(rows + margin * 2, new_cols);
    out.data_mut()
        .par_chunks_mut(new_cols)
        .enumerate()
        .for_each(|(y, row)| {
            if y < margin || y >= rows + margin {
                return;
            }
            for x in margin..cols + margin {
                row[x] = matrix.get(y - margin, x - margin);
            }
        });
    out
}

/// Returns `matrix` enlarged by `margin` rows and columns on every side,
/// border cells taking the value of the nearest edge or corner cell.
///
/// Corner regions replicate the corresponding corner value and edge regions
/// the nearest edge row/column, which is the per-axis clamp of the source
/// index. Row-parallel like [`zero_padding`].
pub fn edge_padding(matrix: &Matrix, margin: usize) -> Matrix {
    let rows = matrix.rows();
    let cols = matrix.cols();
    let new_cols = cols + margin * 2;

    let mut out = Matrix::zeros(rows + margin * 2, new_cols);
    out.data_mut()
        .par_chunks_mut(new_cols)
        .enumerate()
        .for_each(|(y, row)| {
            let src_y = clamp_index(y, margin, rows);
            for (x, cell) in row.iter_mut().enumerate() {
                let src_x = clamp_index(x, margin, cols);
                *cell = matrix.get(src_y, src_x);
            }
        });
    out
}

/// Maps a padded coordinate back into `[0, len)` of the source axis.
fn clamp_index(padded: usize, margin: usize, len: usize) -> usize {
    padded.saturating_sub(margin).min(len - 1)
}

#[cfg(test)]
#[path = "pad_test.rs"]
mod tests;
