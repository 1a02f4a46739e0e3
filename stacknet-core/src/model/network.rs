//! The network orchestrator.

use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::StackNetError;
use crate::matrix::{reshape, Matrix};
use crate::nn::layers::Layer;
use crate::optim::LearningParams;

/// An ordered stack of layers plus the learning parameters that drive their
/// weight updates.
///
/// Layer state is mutated in place by every training step, so a forward pass,
/// the matching backward pass and the weight update always refer to the same
/// sample.
#[derive(Debug, Clone, Default)]
pub struct Network {
    layers: Vec<Layer>,
    params: LearningParams,
}

impl Network {
    /// Empty network with default learning parameters.
    pub fn new() -> Self {
        Network::default()
    }

    /// Empty network with caller-chosen learning parameters.
    pub fn with_params(params: LearningParams) -> Self {
        Network {
            layers: Vec::new(),
            params,
        }
    }

    pub fn params(&self) -> &LearningParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut LearningParams {
        &mut self.params
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Appends a layer, checking that it can consume the element count the
    /// current last layer produces.
    pub fn push(&mut self, layer: Layer) -> Result<(), StackNetError> {
        if let Some(last) = self.layers.last() {
            let expected = last.output_size().total();
            let actual = layer.input_size().total();
            if expected != actual {
                return Err(StackNetError::DimensionMismatch { expected, actual });
            }
        }
        self.layers.push(layer);
        Ok(())
    }

    /// Activated output of the last layer.
    pub fn output(&self) -> Result<&Matrix, StackNetError> {
        self.layers
            .last()
            .map(Layer::output)
            .ok_or(StackNetError::EmptyNetwork)
    }

    /// Runs the input through every layer in order.
    pub fn feed_forward(&mut self, input: &Matrix) -> Result<(), StackNetError> {
        if self.layers.is_empty() {
            return Err(StackNetError::EmptyNetwork);
        }
        self.layers[0].feed_forward(input)?;
        for i in 1..self.layers.len() {
            let (front, back) = self.layers.split_at_mut(i);
            back[0].feed_forward(front[i - 1].output())?;
        }
        Ok(())
    }

    /// One backward pass for the sample of the latest [`Network::feed_forward`].
    ///
    /// The loss gradient at the last layer is `output - target` (the
    /// mean-squared-error derivative up to a constant factor). Gradients are
    /// computed walking the layers back to front; afterwards every layer's
    /// weights are updated, in any order, since the gradients are already
    /// fixed.
    pub fn backpropagate(&mut self, target: &Matrix) -> Result<(), StackNetError> {
        let last = self.layers.last_mut().ok_or(StackNetError::EmptyNetwork)?;
        let output = last.output();
        let target = if target.rows() == output.rows() && target.cols() == output.cols() {
            target.clone()
        } else {
            reshape(target, output.rows(), output.cols())?
        };
        let difference = last.output().sub(&target)?;
        last.calculate_gradients(&difference)?;

        for i in (0..self.layers.len() - 1).rev() {
            let (front, back) = self.layers.split_at_mut(i + 1);
            front[i].calculate_gradients(back[0].gradients())?;
        }

        let params = self.params;
        for layer in &mut self.layers {
            layer.update_weights(&params)?;
        }
        Ok(())
    }

    /// Trains on `(inputs, targets)` pairs for `epochs` epochs, one
    /// forward+backward pass per sample, shuffling the pairs every epoch.
    ///
    /// Returns the mean per-sample squared-error loss over the training and
    /// test sets after the last epoch.
    pub fn train(
        &mut self,
        inputs: &[Matrix],
        targets: &[Matrix],
        test_inputs: &[Matrix],
        test_targets: &[Matrix],
        epochs: usize,
        rng: &mut impl Rng,
    ) -> Result<(f64, f64), StackNetError> {
        if inputs.len() != targets.len() {
            return Err(StackNetError::DimensionMismatch {
                expected: inputs.len(),
                actual: targets.len(),
            });
        }
        if test_inputs.len() != test_targets.len() {
            return Err(StackNetError::DimensionMismatch {
                expected: test_inputs.len(),
                actual: test_targets.len(),
            });
        }

        let mut order: Vec<usize> = (0..inputs.len()).collect();
        let started = Instant::now();
        for epoch in 0..epochs {
            order.shuffle(rng);
            let epoch_started = Instant::now();
            for &i in &order {
                self.feed_forward(&inputs[i])?;
                self.backpropagate(&targets[i])?;
            }
            log::info!("epoch #{} done in {:?}", epoch, epoch_started.elapsed());
        }
        log::info!("training {} epochs done in {:?}", epochs, started.elapsed());

        let train_error = self.mean_loss(inputs, targets)?;
        let test_error = self.mean_loss(test_inputs, test_targets)?;
        Ok((train_error, test_error))
    }

    /// Mean over samples of the squared-error sum against the targets.
    fn mean_loss(
        &mut self,
        inputs: &[Matrix],
        targets: &[Matrix],
    ) -> Result<f64, StackNetError> {
        if inputs.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for (input, target) in inputs.iter().zip(targets.iter()) {
            self.feed_forward(input)?;
            total += squared_error(self.output()?, target)?;
        }
        Ok(total / inputs.len() as f64)
    }
}

/// Sum of squared element differences.
fn squared_error(output: &Matrix, target: &Matrix) -> Result<f64, StackNetError> {
    if output.data().len() != target.data().len() {
        return Err(StackNetError::DimensionMismatch {
            expected: output.data().len(),
            actual: target.data().len(),
        });
    }
    Ok(output
        .data()
        .iter()
        .zip(target.data().iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum())
}

#[cfg(test)]
#[path = "network_test.rs"]
mod tests;
