use crate::ops::pool::PoolKind;
use thiserror::Error;

/// Crate-wide error type.
///
/// Primitive operations report dimension problems to their caller instead of
/// aborting; layer methods propagate them upward with the operation name that
/// produced them.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum StackNetError {
    #[error("shape mismatch: expected {expected:?}, got {actual:?} during {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("dimension mismatch: expected {expected} elements, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("channel count {channels} does not divide {rows} rows")]
    ChannelMismatch { rows: usize, channels: usize },

    #[error("{kind} pooling is not implemented")]
    UnsupportedPooling { kind: PoolKind },

    #[error("unrecognized layer type {tag:?}")]
    UnrecognizedLayerType { tag: String },

    #[error("invalid network document: {message}")]
    InvalidDocument { message: String },

    #[error("{name} must be positive, got {value}")]
    InvalidLearningParams { name: &'static str, value: f64 },

    #[error("network has no layers")]
    EmptyNetwork,
}
