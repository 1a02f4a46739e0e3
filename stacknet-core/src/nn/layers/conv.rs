//! Convolutional layer.

use rand::Rng;

use crate::error::StackNetError;
use crate::matrix::{extract_channel, reshape, stack_channels, Matrix};
use crate::ops::conv::convolve_2d;
use crate::ops::pad::zero_padding;
use crate::ops::rotate::rotate_180;
use crate::optim::{momentum_step, LearningParams};
use crate::shape::Dim3;

/// Convolutional layer: one channel-stacked kernel per filter, convolved
/// against the channel-stacked input and stacked into a multi-channel output.
///
/// Kernels use the same stacking convention as activations: a filter over
/// `C` input channels is a `(C * kernel_size) × kernel_size` matrix whose
/// row block `c` is the sub-kernel for input channel `c`. The cached
/// per-filter kernel gradient therefore has exactly the kernel's shape and
/// is the quantity the momentum update applies.
#[derive(Debug, Clone)]
pub struct ConvLayer {
    input_size: Dim3,
    output_size: Dim3,
    stride: usize,
    kernel_size: usize,
    /// Cached input of the current training step.
    input: Matrix,
    /// Activated output, filters stacked along the row axis.
    output: Matrix,
    kernels: Vec<Matrix>,
    /// Momentum carry-over, one buffer per kernel.
    previous_deltas: Vec<Matrix>,
    /// Per-filter kernel gradients cached between the gradient and update
    /// steps.
    local_deltas: Vec<Matrix>,
    /// Gradient w.r.t. the layer input, summed across filters.
    input_gradients: Matrix,
}

impl ConvLayer {
    /// Creates a layer with `filters` kernels of `kernel_size × kernel_size`
    /// per input channel, initialised uniformly in [-0.5, 0.5).
    pub fn new(
        input_size: Dim3,
        stride: usize,
        kernel_size: usize,
        filters: usize,
        rng: &mut impl Rng,
    ) -> Self {
        debug_assert!(stride >= 1 && filters >= 1 && input_size.z >= 1);
        let output_size = Dim3::new(
            (input_size.x - kernel_size) / stride + 1,
            (input_size.y - kernel_size) / stride + 1,
            filters,
        );
        let kernel_rows = input_size.z * kernel_size;
        let mut kernels = Vec::with_capacity(filters);
        for _ in 0..filters {
            let mut kernel = Matrix::zeros(kernel_rows, kernel_size);
            for value in kernel.data_mut() {
                *value = rng.gen::<f64>() - 0.5;
            }
            kernels.push(kernel);
        }

        ConvLayer {
            input_size,
            output_size,
            stride,
            kernel_size,
            input: Matrix::zeros(input_size.z * input_size.y, input_size.x),
            output: Matrix::zeros(filters * output_size.y, output_size.x),
            previous_deltas: vec![Matrix::zeros(kernel_rows, kernel_size); filters],
            local_deltas: vec![Matrix::zeros(kernel_rows, kernel_size); filters],
            kernels,
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

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    pub fn output(&self) -> &Matrix {
        &self.output
    }

    pub fn input_gradients(&self) -> &Matrix {
        &self.input_gradients
    }

    pub fn kernels(&self) -> &[Matrix] {
        &self.kernels
    }

    /// Per-filter kernel gradients from the last backward pass.
    pub fn local_deltas(&self) -> &[Matrix] {
        &self.local_deltas
    }

    /// Replaces the kernels, resetting the momentum state.
    pub fn set_weights(&mut self, kernels: &[Matrix]) -> Result<(), StackNetError> {
        if kernels.len() != self.kernels.len() {
            return Err(StackNetError::ShapeMismatch {
                expected: vec![self.kernels.len()],
                actual: vec![kernels.len()],
                operation: "ConvLayer::set_weights".to_string(),
            });
        }
        let kernel_rows = self.input_size.z * self.kernel_size;
        for kernel in kernels {
            if kernel.rows() != kernel_rows || kernel.cols() != self.kernel_size {
                return Err(StackNetError::ShapeMismatch {
                    expected: vec![kernel_rows, self.kernel_size],
                    actual: vec![kernel.rows(), kernel.cols()],
                    operation: "ConvLayer::set_weights".to_string(),
                });
            }
        }
        self.kernels = kernels.to_vec();
        for delta in &mut self.previous_deltas {
            delta.fill(0.0);
        }
        Ok(())
    }

    pub(crate) fn feed_forward(&mut self, input: &Matrix) -> Result<(), StackNetError> {
        let expected_rows = self.input_size.z * self.input_size.y;
        if input.rows() != expected_rows || input.cols() != self.input_size.x {
            return Err(StackNetError::ShapeMismatch {
                expected: vec![expected_rows, self.input_size.x],
                actual: vec![input.rows(), input.cols()],
                operation: "ConvLayer::feed_forward".to_string(),
            });
        }
        self.input = input.clone();

        let mut stacked: Option<Matrix> = None;
        for kernel in &self.kernels {
            let feature = convolve_2d(&self.input, kernel, self.input_size.z, self.stride)?;
            stacked = Some(match stacked {
                None => feature,
                Some(acc) => stack_channels(&acc, &feature)?,
            });
        }
        self.output = stacked.ok_or(StackNetError::ShapeMismatch {
            expected: vec![1],
            actual: vec![0],
            operation: "ConvLayer::feed_forward".to_string(),
        })?;
        Ok(())
    }

    pub(crate) fn calculate_gradients(
        &mut self,
        loss_gradients: &Matrix,
    ) -> Result<(), StackNetError> {
        // Downstream layers may hand the gradient back flattened; relabel it
        // to this layer's output grid before slicing channels.
        let errors = if loss_gradients.rows() == self.output.rows()
            && loss_gradients.cols() == self.output.cols()
        {
            loss_gradients.clone()
        } else {
            reshape(loss_gradients, self.output.rows(), self.output.cols())?
        };

        let features = self.output_size.z;
        let channels = self.input_size.z;

        // Kernel gradient: dL/dK = Convolution(input, dL/dO), one block per
        // input channel, stacked to match the kernel layout.
        for f in 0..features {
            let partial_errors = extract_channel(&errors, features, f)?;
            let mut stacked: Option<Matrix> = None;
            for c in 0..channels {
                let partial_input = extract_channel(&self.input, channels, c)?;
                let partial_delta =
                    convolve_2d(&partial_input, &partial_errors, 1, self.stride)?;
                stacked = Some(match stacked {
                    None => partial_delta,
                    Some(acc) => stack_channels(&acc, &partial_delta)?,
                });
            }
            self.local_deltas[f] = stacked.ok_or(StackNetError::ChannelMismatch {
                rows: self.input.rows(),
                channels,
            })?;
        }

        // Input gradient: dL/dX = FullConvolution(dL/dO, rot180(kernel)),
        // channel blocks stacked per filter and summed across filters. The
        // full convolution always walks at stride 1; the padding restores
        // the input grid.
        self.input_gradients.fill(0.0);
        for f in 0..features {
            let partial_errors = extract_channel(&errors, features, f)?;
            let padded = zero_padding(&partial_errors, self.kernel_size - 1);
            let mut stacked: Option<Matrix> = None;
            for c in 0..channels {
                let partial_kernel = extract_channel(&self.kernels[f], channels, c)?;
                let rotated = rotate_180(&partial_kernel);
                let partial_grad = convolve_2d(&padded, &rotated, 1, 1)?;
                stacked = Some(match stacked {
                    None => partial_grad,
                    Some(acc) => stack_channels(&acc, &partial_grad)?,
                });
            }
            let stacked = stacked.ok_or(StackNetError::ChannelMismatch {
                rows: self.input.rows(),
                channels,
            })?;
            self.input_gradients.add_assign(&stacked)?;
        }
        Ok(())
    }

    pub(crate) fn update_weights(
        &mut self,
        params: &LearningParams,
    ) -> Result<(), StackNetError> {
        for f in 0..self.kernels.len() {
            momentum_step(
                &mut self.kernels[f],
                &self.local_deltas[f],
                &mut self.previous_deltas[f],
                params,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "conv_test.rs"]
mod tests;
