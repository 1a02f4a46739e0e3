//! Layer variants and their shared dispatch surface.
//!
//! A [`Layer`] is a tagged variant over the four layer kinds. Every variant
//! owns its cached input, its activated output, its weights (when it has any)
//! and its locally computed gradient state; dispatch happens in one `match`
//! per operation, which keeps the persisted-format mapping exhaustive.

use crate::error::StackNetError;
use crate::matrix::Matrix;
use crate::optim::LearningParams;
use crate::shape::Dim3;

pub mod conv;
pub mod fully_connected;
pub mod pool;
pub mod relu;

pub use conv::ConvLayer;
pub use fully_connected::FullyConnectedLayer;
pub use pool::MaxPoolLayer;
pub use relu::ReluLayer;

/// Discriminant of a [`Layer`], aligned with the persisted-format tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Conv,
    Relu,
    MaxPool,
    FullyConnected,
}

impl LayerKind {
    /// Tag used by the persisted network format.
    pub fn tag(&self) -> &'static str {
        match self {
            LayerKind::Conv => "conv",
            LayerKind::Relu => "relu",
            LayerKind::MaxPool => "pool",
            LayerKind::FullyConnected => "fc",
        }
    }
}

/// One unit of the feed-forward pipeline.
#[derive(Debug, Clone)]
pub enum Layer {
    Conv(ConvLayer),
    Relu(ReluLayer),
    MaxPool(MaxPoolLayer),
    FullyConnected(FullyConnectedLayer),
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Conv(_) => LayerKind::Conv,
            Layer::Relu(_) => LayerKind::Relu,
            Layer::MaxPool(_) => LayerKind::MaxPool,
            Layer::FullyConnected(_) => LayerKind::FullyConnected,
        }
    }

    /// Dimensions of the data this layer consumes.
    pub fn input_size(&self) -> Dim3 {
        match self {
            Layer::Conv(l) => l.input_size(),
            Layer::Relu(l) => l.input_size(),
            Layer::MaxPool(l) => l.input_size(),
            Layer::FullyConnected(l) => l.input_size(),
        }
    }

    /// Dimensions of the data this layer produces.
    pub fn output_size(&self) -> Dim3 {
        match self {
            Layer::Conv(l) => l.output_size(),
            Layer::Relu(l) => l.output_size(),
            Layer::MaxPool(l) => l.output_size(),
            Layer::FullyConnected(l) => l.output_size(),
        }
    }

    /// Runs the forward pass, caching the input and overwriting the layer's
    /// activated output.
    pub fn feed_forward(&mut self, input: &Matrix) -> Result<(), StackNetError> {
        match self {
            Layer::Conv(l) => l.feed_forward(input),
            Layer::Relu(l) => l.feed_forward(input),
            Layer::MaxPool(l) => l.feed_forward(input),
            Layer::FullyConnected(l) => l.feed_forward(input),
        }
    }

    /// Consumes the downstream layer's gradient and recomputes this layer's
    /// local gradient state, including the gradient handed further upstream.
    pub fn calculate_gradients(&mut self, errors: &Matrix) -> Result<(), StackNetError> {
        match self {
            Layer::Conv(l) => l.calculate_gradients(errors),
            Layer::Relu(l) => l.calculate_gradients(errors),
            Layer::MaxPool(l) => l.calculate_gradients(errors),
            Layer::FullyConnected(l) => l.calculate_gradients(errors),
        }
    }

    /// Applies the momentum update using the gradients computed by the last
    /// [`Layer::calculate_gradients`] call. A no-op for weightless layers.
    pub fn update_weights(&mut self, params: &LearningParams) -> Result<(), StackNetError> {
        match self {
            Layer::Conv(l) => l.update_weights(params),
            Layer::Relu(_) | Layer::MaxPool(_) => Ok(()),
            Layer::FullyConnected(l) => l.update_weights(params),
        }
    }

    /// The activated output of the last forward pass.
    pub fn output(&self) -> &Matrix {
        match self {
            Layer::Conv(l) => l.output(),
            Layer::Relu(l) => l.output(),
            Layer::MaxPool(l) => l.output(),
            Layer::FullyConnected(l) => l.output(),
        }
    }

    /// The gradient this layer hands to the upstream layer.
    pub fn gradients(&self) -> &Matrix {
        match self {
            Layer::Conv(l) => l.input_gradients(),
            Layer::Relu(l) => l.input_gradients(),
            Layer::MaxPool(l) => l.input_gradients(),
            Layer::FullyConnected(l) => l.input_gradients(),
        }
    }

    /// Weight matrices owned by the layer; empty for weightless layers.
    pub fn weights(&self) -> Vec<&Matrix> {
        match self {
            Layer::Conv(l) => l.kernels().iter().collect(),
            Layer::Relu(_) | Layer::MaxPool(_) => Vec::new(),
            Layer::FullyConnected(l) => vec![l.weights()],
        }
    }

    /// Replaces the layer's weights with caller-provided matrices.
    ///
    /// Weightless layers reject any non-empty slice.
    pub fn set_weights(&mut self, weights: &[Matrix]) -> Result<(), StackNetError> {
        match self {
            Layer::Conv(l) => l.set_weights(weights),
            Layer::FullyConnected(l) => l.set_weights(weights),
            Layer::Relu(_) | Layer::MaxPool(_) => {
                if weights.is_empty() {
                    Ok(())
                } else {
                    Err(StackNetError::ShapeMismatch {
                        expected: vec![0],
                        actual: vec![weights.len()],
                        operation: "Layer::set_weights".to_string(),
                    })
                }
            }
        }
    }

    /// Stride of the sliding-window layers, zero otherwise.
    pub fn stride(&self) -> usize {
        match self {
            Layer::Conv(l) => l.stride(),
            Layer::MaxPool(l) => l.stride(),
            Layer::Relu(_) | Layer::FullyConnected(_) => 0,
        }
    }

    /// Kernel/window size of the sliding-window layers, zero otherwise.
    pub fn kernel_size(&self) -> usize {
        match self {
            Layer::Conv(l) => l.kernel_size(),
            Layer::MaxPool(l) => l.window(),
            Layer::Relu(_) | Layer::FullyConnected(_) => 0,
        }
    }
}
