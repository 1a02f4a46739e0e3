//! Rectifier layer.

use crate::error::StackNetError;
use crate::matrix::{reshape, Matrix};
use crate::shape::Dim3;

/// Rectified linear unit with an optional leak.
///
/// With `alpha == 0.0` this is the plain `max(0, x)` rectifier; a positive
/// `alpha` gives the leaky variant `x < 0 → alpha * x`. Output dimensions
/// equal input dimensions and there are no weights.
#[derive(Debug, Clone)]
pub struct ReluLayer {
    size: Dim3,
    alpha: f64,
    input: Matrix,
    output: Matrix,
    input_gradients: Matrix,
}

impl ReluLayer {
    /// Plain rectifier.
    pub fn new(size: Dim3) -> Self {
        Self::leaky(size, 0.0)
    }

    /// Leaky rectifier with slope `alpha` on the negative side.
    pub fn leaky(size: Dim3, alpha: f64) -> Self {
        ReluLayer {
            size,
            alpha,
            input: Matrix::zeros(size.z * size.y, size.x),
            output: Matrix::zeros(size.z * size.y, size.x),
            input_gradients: Matrix::zeros(size.z * size.y, size.x),
        }
    }

    pub fn input_size(&self) -> Dim3 {
        self.size
    }

    pub fn output_size(&self) -> Dim3 {
        self.size
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn output(&self) -> &Matrix {
        &self.output
    }

    pub fn input_gradients(&self) -> &Matrix {
        &self.input_gradients
    }

    pub(crate) fn feed_forward(&mut self, input: &Matrix) -> Result<(), StackNetError> {
        let rows = self.size.z * self.size.y;
        self.input = if input.rows() == rows && input.cols() == self.size.x {
            input.clone()
        } else {
            reshape(input, rows, self.size.x)?
        };
        let alpha = self.alpha;
        self.output = self.input.map(|v| if v < 0.0 { alpha * v } else { v });
        Ok(())
    }

    pub(crate) fn calculate_gradients(&mut self, errors: &Matrix) -> Result<(), StackNetError> {
        let errors = if errors.rows() == self.input.rows() && errors.cols() == self.input.cols() {
            errors.clone()
        } else {
            reshape(errors, self.input.rows(), self.input.cols())?
        };
        for (i, (&x, &e)) in self
            .input
            .data()
            .iter()
            .zip(errors.data().iter())
            .enumerate()
        {
            let routed = if x < 0.0 { self.alpha * e } else { e };
            self.input_gradients.data_mut()[i] = routed;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "relu_test.rs"]
mod tests;
