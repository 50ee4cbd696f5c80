use crate::{Error, Result, Tensor};
use ndarray::{Array1, Axis};

/// Learned batch normalization statistics, as exported by training.
#[derive(Debug, Clone)]
pub struct BatchNormParams {
    pub gamma: Array1<f32>,
    pub beta: Array1<f32>,
    pub moving_mean: Array1<f32>,
    pub moving_variance: Array1<f32>,
    pub epsilon: f32,
}

impl BatchNormParams {
    /// Identity normalization: gamma 1, beta 0, mean 0, variance 1.
    pub fn identity(num_features: usize) -> Self {
        Self {
            gamma: Array1::ones(num_features),
            beta: Array1::zeros(num_features),
            moving_mean: Array1::zeros(num_features),
            moving_variance: Array1::ones(num_features),
            epsilon: 0.0,
        }
    }
}

/// Inference-mode batch normalization over the trailing (channel) axis.
///
/// `y = gamma * (x - mean) / sqrt(var + eps) + beta` is folded at
/// construction into a single per-channel scale and shift.
#[derive(Debug, Clone)]
pub struct BatchNormalization {
    name: String,
    scale: Array1<f32>,
    shift: Array1<f32>,
    num_features: usize,
}

impl BatchNormalization {
    pub fn new(name: String, params: BatchNormParams) -> Result<Self> {
        let num_features = params.gamma.len();
        if num_features == 0 {
            return Err(Error::Layer(format!(
                "BatchNormalization {}: gamma must not be empty",
                name
            )));
        }

        for (field, len) in [
            ("beta", params.beta.len()),
            ("moving_mean", params.moving_mean.len()),
            ("moving_variance", params.moving_variance.len()),
        ] {
            if len != num_features {
                return Err(Error::Layer(format!(
                    "BatchNormalization {}: {} length {} doesn't match gamma length {}",
                    name, field, len, num_features
                )));
            }
        }

        let std_inv = params
            .moving_variance
            .mapv(|v| 1.0 / (v + params.epsilon).sqrt());
        let scale = &params.gamma * &std_inv;
        let shift = &params.beta - &(&params.moving_mean * &scale);

        Ok(Self {
            name,
            scale,
            shift,
            num_features,
        })
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }
}

impl super::Layer for BatchNormalization {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let ndim = input.ndim();
        if ndim == 0 {
            return Err(Error::Layer(
                "BatchNormalization expects at least 1D input".to_string(),
            ));
        }

        let channels = input.shape()[ndim - 1];
        if channels != self.num_features {
            return Err(Error::ShapeMismatch {
                expected: vec![self.num_features],
                actual: vec![channels],
            });
        }

        let mut output = input.data().clone();

        if let Some(data) = output.as_slice_mut() {
            // Channels are innermost and contiguous in standard layout.
            for lane in data.chunks_exact_mut(self.num_features) {
                for (c, x) in lane.iter_mut().enumerate() {
                    *x = self.scale[c] * *x + self.shift[c];
                }
            }
        } else {
            for mut lane in output.lanes_mut(Axis(ndim - 1)) {
                for (c, x) in lane.iter_mut().enumerate() {
                    *x = self.scale[c] * *x + self.shift[c];
                }
            }
        }

        Ok(Tensor::new(output))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        Ok(input_shape.to_vec())
    }
}
