use crate::{Result, Tensor};
use ndarray::Zip;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    Linear,
    ReLU,
    LeakyReLU { alpha: f32 },
    Sigmoid,
    Tanh,
}

impl Activation {
    /// Apply the activation elementwise, in place.
    pub fn apply(&self, tensor: &mut Tensor) -> Result<()> {
        match self {
            Activation::Linear => {}
            Activation::ReLU => {
                Zip::from(tensor.data_mut()).for_each(|x| {
                    *x = x.max(0.0);
                });
            }
            Activation::LeakyReLU { alpha } => {
                let alpha = *alpha;
                Zip::from(tensor.data_mut()).for_each(|x| {
                    if *x < 0.0 {
                        *x = alpha * *x;
                    }
                });
            }
            Activation::Sigmoid => {
                Zip::from(tensor.data_mut()).for_each(|x| {
                    *x = 1.0 / (1.0 + (-*x).exp());
                });
            }
            Activation::Tanh => {
                Zip::from(tensor.data_mut()).for_each(|x| {
                    *x = x.tanh();
                });
            }
        }

        Ok(())
    }
}
