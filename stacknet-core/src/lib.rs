//! Channel-stacked matrix convolution engine with trainable MLP/CNN layer
//! pipelines.
//!
//! Multi-channel data is represented as one dense 2D [`Matrix`] with the
//! channels concatenated along the row axis, which lets activations, kernels
//! and gradients flow through the same primitive operations. Convolution is
//! im2col-based, gradients are hand-derived per layer kind and weight
//! updates use classical momentum SGD.
//!
//! # Modules
//!
//! - [`matrix`]: the dense matrix type plus channel extraction, stacking and
//!   reshaping.
//! - [`ops`]: im2col, convolution, padding, rotation and pooling primitives.
//! - [`nn`]: the [`Layer`] variants and activation functions.
//! - [`model`]: the [`Network`] orchestrator and the persisted document
//!   schema.
//! - [`optim`]: learning parameters and the momentum update rule.

pub mod error;
pub mod matrix;
pub mod model;
pub mod nn;
pub mod ops;
pub mod optim;
pub mod shape;

pub use error::StackNetError;
pub use matrix::Matrix;
pub use model::{Network, NetworkDocument};
pub use nn::{Activation, ConvLayer, FullyConnectedLayer, Layer, LayerKind, MaxPoolLayer, ReluLayer};
pub use optim::LearningParams;
pub use shape::Dim3;
