//! Learning parameters and the momentum update rule.

use serde::{Deserialize, Serialize};

use crate::error::StackNetError;
use crate::matrix::Matrix;

/// Hyperparameters of the training step.
///
/// Each network holds its own copy, so several networks can train with
/// different parameters without interfering. `weight_decay` is carried in
/// the record and the persisted format but takes no part in the update
/// arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningParams {
    pub learning_rate: f64,
    pub momentum: f64,
    pub weight_decay: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        LearningParams {
            learning_rate: 0.01,
            momentum: 0.6,
            weight_decay: 0.005,
        }
    }
}

impl LearningParams {
    /// Builds a validated parameter set; every value must be positive.
    pub fn new(
        learning_rate: f64,
        momentum: f64,
        weight_decay: f64,
    ) -> Result<Self, StackNetError> {
        let mut params = LearningParams::default();
        params.set_learning_rate(learning_rate)?;
        params.set_momentum(momentum)?;
        params.set_weight_decay(weight_decay)?;
        Ok(params)
    }

    /// Sets η; rejects non-positive values and keeps the previous one.
    pub fn set_learning_rate(&mut self, value: f64) -> Result<(), StackNetError> {
        if value <= 0.0 {
            return Err(StackNetError::InvalidLearningParams {
                name: "learning rate",
                value,
            });
        }
        self.learning_rate = value;
        Ok(())
    }

    /// Sets α; rejects non-positive values and keeps the previous one.
    pub fn set_momentum(&mut self, value: f64) -> Result<(), StackNetError> {
        if value <= 0.0 {
            return Err(StackNetError::InvalidLearningParams {
                name: "momentum",
                value,
            });
        }
        self.momentum = value;
        Ok(())
    }

    /// Sets λ; rejects non-positive values and keeps the previous one.
    pub fn set_weight_decay(&mut self, value: f64) -> Result<(), StackNetError> {
        if value <= 0.0 {
            return Err(StackNetError::InvalidLearningParams {
                name: "weight decay",
                value,
            });
        }
        self.weight_decay = value;
        Ok(())
    }
}

/// Classical momentum step shared by the weighted layers:
///
/// `Δw = -(1-α)·η·gradient + α·Δw_prev`, then `w += Δw` and `Δw` becomes the
/// carried-over state for the next step.
pub(crate) fn momentum_step(
    weights: &mut Matrix,
    gradient: &Matrix,
    previous_delta: &mut Matrix,
    params: &LearningParams,
) -> Result<(), StackNetError> {
    let mut delta = gradient.clone();
    delta.scale(-(1.0 - params.momentum) * params.learning_rate);

    let mut carried = previous_delta.clone();
    carried.scale(params.momentum);
    delta.add_assign(&carried)?;

    weights.add_assign(&delta)?;
    *previous_delta = delta;
    Ok(())
}

#[cfg(test)]
#[path = "optim_test.rs"]
mod tests;
