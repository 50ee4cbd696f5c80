//! # Tiny ResNet
//!
//! A minimal-size Rust library providing residual CNN building blocks for
//! inference. Forward pass only - no training.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tiny_resnet::{ResidualBlock, Tensor};
//!
//! let block = ResidualBlock::new("block1".to_string(), 16, 32, 2, weights)?;
//! let output = block.forward(&input)?;
//! ```

pub mod activations;
mod conv2d_impl;
pub mod error;
pub mod layers;
pub mod model;
pub mod tensor;

pub use error::{Error, Result};
pub use layers::residual::ResidualBlock;
pub use model::Stack;
pub use tensor::Tensor;
