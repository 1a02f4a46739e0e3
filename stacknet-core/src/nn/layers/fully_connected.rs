//! Fully-connected layer.

use rand::Rng;

use crate::error::StackNetError;
use crate::matrix::{reshape, Matrix};
use crate::nn::activation::Activation;
use crate::optim::{momentum_step, LearningParams};
use crate::shape::Dim3;

/// Dense layer mapping a flattened rank-3 input to `output_size` neurons.
///
/// Weights form an `(outputs) × (inputs)` matrix where the flattened input
/// index is `z*x*y + y*x + x` of the incoming block. The layer caches the
/// pre-activation sums so the backward pass can evaluate the activation
/// derivative at the exact values the forward pass produced.
#[derive(Debug, Clone)]
pub struct FullyConnectedLayer {
    input_size: Dim3,
    output_size: Dim3,
    /// Cached input as a column vector.
    input: Matrix,
    /// Activated output, `outputs × 1`.
    output: Matrix,
    /// Pre-activation sums of the current step.
    sum_input: Matrix,
    weights: Matrix,
    /// Momentum carry-over for the weight matrix.
    previous_delta: Matrix,
    /// δ of the current step: errors ⊙ activation'(sum_input).
    local_delta: Matrix,
    /// Wᵀ · δ, the gradient handed upstream.
    input_gradients: Matrix,
    activation: Activation,
}

impl FullyConnectedLayer {
    /// Creates a layer with weights initialised uniformly in [-0.5, 0.5) and
    /// the default tanh activation.
    pub fn new(input_size: Dim3, outputs: usize, rng: &mut impl Rng) -> Self {
        let inputs = input_size.total();
        let mut weights = Matrix::zeros(outputs, inputs);
        for value in weights.data_mut() {
            *value = rng.gen::<f64>() - 0.5;
        }

        FullyConnectedLayer {
            input_size,
            output_size: Dim3::new(outputs, 1, 1),
            input: Matrix::zeros(inputs, 1),
            output: Matrix::zeros(outputs, 1),
            sum_input: Matrix::zeros(outputs, 1),
            previous_delta: Matrix::zeros(outputs, inputs),
            local_delta: Matrix::zeros(outputs, 1),
            input_gradients: Matrix::zeros(inputs, 1),
            weights,
            activation: Activation::default(),
        }
    }

    pub fn input_size(&self) -> Dim3 {
        self.input_size
    }

    pub fn output_size(&self) -> Dim3 {
        self.output_size
    }

    pub fn output(&self) -> &Matrix {
        &self.output
    }

    pub fn input_gradients(&self) -> &Matrix {
        &self.input_gradients
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    /// δ of the last backward pass.
    pub fn local_delta(&self) -> &Matrix {
        &self.local_delta
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Swaps the activation function and its derivative.
    pub fn set_activation(&mut self, activation: Activation) {
        self.activation = activation;
    }

    /// Replaces the weight matrix, resetting the momentum state.
    ///
    /// Exactly one matrix of shape `(outputs) × (inputs)` is accepted.
    pub fn set_weights(&mut self, weights: &[Matrix]) -> Result<(), StackNetError> {
        if weights.len() != 1 {
            return Err(StackNetError::ShapeMismatch {
                expected: vec![1],
                actual: vec![weights.len()],
                operation: "FullyConnectedLayer::set_weights".to_string(),
            });
        }
        let replacement = &weights[0];
        if replacement.rows() != self.weights.rows() || replacement.cols() != self.weights.cols()
        {
            return Err(StackNetError::ShapeMismatch {
                expected: vec![self.weights.rows(), self.weights.cols()],
                actual: vec![replacement.rows(), replacement.cols()],
                operation: "FullyConnectedLayer::set_weights".to_string(),
            });
        }
        self.weights = replacement.clone();
        self.previous_delta.fill(0.0);
        Ok(())
    }

    pub(crate) fn feed_forward(&mut self, input: &Matrix) -> Result<(), StackNetError> {
        let inputs = self.weights.cols();
        // Accept any block with the right element count by relabeling it as
        // a column vector.
        self.input = if input.rows() == inputs && input.cols() == 1 {
            input.clone()
        } else {
            reshape(input, inputs, 1)?
        };
        self.sum_input = self.weights.matmul(&self.input)?;
        let activation = self.activation;
        self.output = self.sum_input.map(|v| activation.apply(v));
        Ok(())
    }

    pub(crate) fn calculate_gradients(&mut self, errors: &Matrix) -> Result<(), StackNetError> {
        let outputs = self.output_size.x;
        let errors = if errors.rows() == outputs && errors.cols() == 1 {
            errors.clone()
        } else {
            reshape(errors, outputs, 1)?
        };

        let activation = self.activation;
        let derivative = self.sum_input.map(|v| activation.derivative(v));
        self.local_delta = errors.mul_elem(&derivative)?;
        self.input_gradients = self.weights.transpose().matmul(&self.local_delta)?;
        Ok(())
    }

    pub(crate) fn update_weights(
        &mut self,
        params: &LearningParams,
    ) -> Result<(), StackNetError> {
        let gradient = self.local_delta.matmul(&self.input.transpose())?;
        momentum_step(
            &mut self.weights,
            &gradient,
            &mut self.previous_delta,
            params,
        )
    }
}

#[cfg(test)]
#[path = "fully_connected_test.rs"]
mod tests;
