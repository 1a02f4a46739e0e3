//! Numeric primitives the layers are built from.
//!
//! - [`im2col`]: sliding-window unroll that turns convolution into one
//!   matrix product.
//! - [`conv`]: multi-channel 2D convolution on top of im2col.
//! - [`pad`]: zero and edge-replicate padding.
//! - [`rotate`]: 90-degree block rotations for the full-convolution path.
//! - [`pool`]: max pooling with argmax bookkeeping.

pub mod conv;
pub mod im2col;
pub mod pad;
pub mod pool;
pub mod rotate;

pub use conv::convolve_2d;
pub use im2col::im2col;
pub use pad::{edge_padding, zero_padding};
pub use pool::{pool_2d, PoolKind};
pub use rotate::{rotate_180, rotate_270, rotate_90};
