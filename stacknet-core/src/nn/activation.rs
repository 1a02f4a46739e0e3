//! Activation functions and their derivatives.
//!
//! Derivatives are expressed in terms of the raw pre-activation input, which
//! is what the fully-connected layer caches between its forward and backward
//! passes.

/// Pluggable activation for the fully-connected layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Tanh,
    Sigmoid,
    Arctan,
    Softplus,
    Gaussian,
    Identity,
}

impl Activation {
    /// Applies the activation to one pre-activation value.
    pub fn apply(&self, v: f64) -> f64 {
        match self {
            Activation::Tanh => v.tanh(),
            Activation::Sigmoid => sigmoid(v),
            Activation::Arctan => v.atan(),
            Activation::Softplus => (1.0 + v.exp()).ln(),
            Activation::Gaussian => (-v * v).exp(),
            Activation::Identity => v,
        }
    }

    /// Derivative at one pre-activation value.
    pub fn derivative(&self, v: f64) -> f64 {
        match self {
            Activation::Tanh => 1.0 - v.tanh() * v.tanh(),
            Activation::Sigmoid => sigmoid(v) * (1.0 - sigmoid(v)),
            Activation::Arctan => 1.0 / (1.0 + v * v),
            Activation::Softplus => sigmoid(v),
            Activation::Gaussian => -2.0 * v * (-v * v).exp(),
            Activation::Identity => 1.0,
        }
    }
}

impl Default for Activation {
    fn default() -> Self {
        Activation::Tanh
    }
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

#[cfg(test)]
#[path = "activation_test.rs"]
mod tests;
