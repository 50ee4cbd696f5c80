pub mod batch_normalization;
pub mod conv2d;
pub mod residual;

use crate::{Result, Tensor};

pub trait Layer: std::fmt::Debug + Send + Sync {
    fn forward(&self, input: &Tensor) -> Result<Tensor>;
    fn name(&self) -> &str;
    fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>>;
}

pub use batch_normalization::{BatchNormParams, BatchNormalization};
pub use conv2d::{Conv2D, Padding};
pub use residual::{ResidualBlock, ResidualBlockWeights};
