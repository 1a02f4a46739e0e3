//! Max-pooling layer.

use crate::error::StackNetError;
use crate::matrix::{reshape, Matrix};
use crate::ops::pool::{pool_2d, PoolKind};
use crate::shape::Dim3;

/// Max pooling over square windows. No weights; the backward pass routes
/// each output cell's gradient to the input cell that won its window.
#[derive(Debug, Clone)]
pub struct MaxPoolLayer {
    input_size: Dim3,
    output_size: Dim3,
    stride: usize,
    window: usize,
    input: Matrix,
    output: Matrix,
    /// Absolute input coordinates of each output cell's winner, recorded
    /// during the forward pass.
    mask: Vec<(usize, usize)>,
    /// Input-shaped gradient scatter target.
    input_gradients: Matrix,
}

impl MaxPoolLayer {
    pub fn new(input_size: Dim3, stride: usize, window: usize) -> Self {
        debug_assert!(stride >= 1 && window >= 1);
        let output_size = Dim3::new(
            (input_size.x - window) / stride + 1,
            (input_size.y - window) / stride + 1,
            input_size.z,
        );
        MaxPoolLayer {
            input_size,
            output_size,
            stride,
            window,
            input: Matrix::zeros(input_size.z * input_size.y, input_size.x),
            output: Matrix::zeros(output_size.z * output_size.y, output_size.x),
            mask: Vec::new(),
            input_gradients: Matrix::zeros(input_size.z * input_size.y, input_size.x),
        }
    }

    pub fn input_size(&self) -> Dim3 {
        self.input_size
    }

    pub fn output_size(&self) -> Dim3 {
        self.output_size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn output(&self) -> &Matrix {
        &self.output
    }

    pub fn input_gradients(&self) -> &Matrix {
        &self.input_gradients
    }

    pub(crate) fn feed_forward(&mut self, input: &Matrix) -> Result<(), StackNetError> {
        self.input = input.clone();
        let (output, mask) = pool_2d(
            &self.input,
            self.output_size.y,
            self.output_size.x,
            self.output_size.z,
            self.window,
            self.stride,
            PoolKind::Max,
            true,
        )?;
        self.output = output;
        self.mask = mask.unwrap_or_default();
        Ok(())
    }

    pub(crate) fn calculate_gradients(&mut self, errors: &Matrix) -> Result<(), StackNetError> {
        let errors = if errors.rows() == self.output.rows() && errors.cols() == self.output.cols()
        {
            errors.clone()
        } else {
            reshape(errors, self.output.rows(), self.output.cols())?
        };
        if self.mask.len() != errors.data().len() {
            return Err(StackNetError::DimensionMismatch {
                expected: self.mask.len(),
                actual: errors.data().len(),
            });
        }

        self.input_gradients.fill(0.0);
        for (&(row, col), &error) in self.mask.iter().zip(errors.data().iter()) {
            self.input_gradients.set(row, col, error);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod tests;
