//! Layer abstraction and activation functions.

pub mod activation;
pub mod layers;

pub use activation::Activation;
pub use layers::{
    ConvLayer, FullyConnectedLayer, Layer, LayerKind, MaxPoolLayer, ReluLayer,
};
