use crate::{activations::Activation, conv2d_impl::im2col, Error, Result, Tensor};
use ndarray::{Array1, Array4, IxDyn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Padding {
    Valid,
    Same,
}

impl Padding {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "valid" => Ok(Padding::Valid),
            "same" => Ok(Padding::Same),
            _ => Err(Error::Layer(format!("Unknown padding type: {}", s))),
        }
    }
}

/// 2D convolution over channels-last feature maps. Weights are laid out
/// (kernel_h, kernel_w, in_channels, filters); the forward pass unrolls the
/// input with im2col and reduces to a single matrix multiply.
#[derive(Debug, Clone)]
pub struct Conv2D {
    name: String,
    filters: usize,
    kernel_size: (usize, usize),
    strides: (usize, usize),
    padding: Padding,
    weights: Array4<f32>,
    bias: Option<Array1<f32>>,
    activation: Activation,
}

impl Conv2D {
    pub fn new(
        name: String,
        filters: usize,
        kernel_size: (usize, usize),
        strides: (usize, usize),
        padding: Padding,
        weights: Array4<f32>,
        bias: Option<Array1<f32>>,
        activation: Activation,
    ) -> Result<Self> {
        let dims = weights.dim();
        if dims.0 != kernel_size.0 || dims.1 != kernel_size.1 || dims.3 != filters {
            return Err(Error::ShapeMismatch {
                expected: vec![kernel_size.0, kernel_size.1, dims.2, filters],
                actual: vec![dims.0, dims.1, dims.2, dims.3],
            });
        }

        if strides.0 == 0 || strides.1 == 0 {
            return Err(Error::Layer(format!(
                "Conv2D {}: strides must be non-zero, got {:?}",
                name, strides
            )));
        }

        if let Some(ref b) = bias {
            if b.len() != filters {
                return Err(Error::Layer(format!(
                    "Bias size {} doesn't match filters {}",
                    b.len(),
                    filters
                )));
            }
        }

        Ok(Self {
            name,
            filters,
            kernel_size,
            strides,
            padding,
            weights,
            bias,
            activation,
        })
    }

    pub fn filters(&self) -> usize {
        self.filters
    }

    pub fn in_channels(&self) -> usize {
        self.weights.dim().2
    }

    fn compute_output_size(&self, height: usize, width: usize) -> Result<(usize, usize)> {
        if self.padding == Padding::Valid
            && (height < self.kernel_size.0 || width < self.kernel_size.1)
        {
            return Err(Error::Layer(format!(
                "Conv2D {}: {}x{} input is smaller than the {}x{} kernel with valid padding",
                self.name, height, width, self.kernel_size.0, self.kernel_size.1
            )));
        }

        let out_height = match self.padding {
            Padding::Valid => (height - self.kernel_size.0) / self.strides.0 + 1,
            Padding::Same => (height + self.strides.0 - 1) / self.strides.0,
        };

        let out_width = match self.padding {
            Padding::Valid => (width - self.kernel_size.1) / self.strides.1 + 1,
            Padding::Same => (width + self.strides.1 - 1) / self.strides.1,
        };

        Ok((out_height, out_width))
    }

    fn compute_padding(&self, height: usize, width: usize) -> Result<(usize, usize)> {
        match self.padding {
            Padding::Valid => Ok((0, 0)),
            Padding::Same => {
                let (out_h, out_w) = self.compute_output_size(height, width)?;

                let pad_h =
                    ((out_h - 1) * self.strides.0 + self.kernel_size.0).saturating_sub(height);
                let pad_w =
                    ((out_w - 1) * self.strides.1 + self.kernel_size.1).saturating_sub(width);

                // Keras convention: the extra pixel of odd padding goes to
                // the bottom/right, so only the top/left offsets matter here.
                Ok((pad_h / 2, pad_w / 2))
            }
        }
    }
}

impl super::Layer for Conv2D {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let input_shape = input.shape();

        let (batch_size, height, width, in_channels, is_batched) = if input_shape.len() == 4 {
            (
                input_shape[0],
                input_shape[1],
                input_shape[2],
                input_shape[3],
                true,
            )
        } else if input_shape.len() == 3 {
            (1, input_shape[0], input_shape[1], input_shape[2], false)
        } else {
            return Err(Error::Layer(format!(
                "Conv2D expects 3D or 4D input, got {:?}",
                input_shape
            )));
        };

        if in_channels != self.in_channels() {
            return Err(Error::ShapeMismatch {
                expected: vec![self.in_channels()],
                actual: vec![in_channels],
            });
        }

        let input_4d = input
            .data()
            .clone()
            .into_shape_with_order((batch_size, height, width, in_channels))
            .map_err(|e| Error::Layer(format!("Reshape failed: {}", e)))?;

        let (out_height, out_width) = self.compute_output_size(height, width)?;
        let (pad_top, pad_left) = self.compute_padding(height, width)?;

        let (kernel_h, kernel_w) = self.kernel_size;
        let patches = im2col(
            &input_4d,
            kernel_h,
            kernel_w,
            self.strides.0,
            self.strides.1,
            pad_top,
            pad_left,
            out_height,
            out_width,
        );

        let weights_2d = self
            .weights
            .clone()
            .into_shape_with_order((kernel_h * kernel_w * in_channels, self.filters))
            .map_err(|e| Error::Layer(format!("Reshape failed: {}", e)))?;

        let mut output = patches.dot(&weights_2d);

        if let Some(ref bias) = self.bias {
            for mut row in output.rows_mut() {
                row += bias;
            }
        }

        let output_shape = if is_batched {
            vec![batch_size, out_height, out_width, self.filters]
        } else {
            vec![out_height, out_width, self.filters]
        };

        let output_dyn = output
            .into_shape_with_order(IxDyn(&output_shape))
            .map_err(|e| Error::Layer(format!("Reshape failed: {}", e)))?;

        let mut tensor = Tensor::new(output_dyn);
        self.activation.apply(&mut tensor)?;

        Ok(tensor)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        let (height, width, is_batched) = if input_shape.len() == 4 {
            (input_shape[1], input_shape[2], true)
        } else if input_shape.len() == 3 {
            (input_shape[0], input_shape[1], false)
        } else {
            return Err(Error::Layer(format!(
                "Conv2D expects 3D or 4D input, got {:?}",
                input_shape
            )));
        };

        let (out_height, out_width) = self.compute_output_size(height, width)?;

        if is_batched {
            Ok(vec![input_shape[0], out_height, out_width, self.filters])
        } else {
            Ok(vec![out_height, out_width, self.filters])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Layer;
    use super::*;

    #[test]
    fn test_conv2d_1x1_sum() {
        let weights = Array4::from_shape_fn((1, 1, 1, 1), |_| 1.0);
        let bias = Some(Array1::zeros(1));

        let layer = Conv2D::new(
            "test_conv".to_string(),
            1,
            (1, 1),
            (1, 1),
            Padding::Valid,
            weights,
            bias,
            Activation::Linear,
        )
        .unwrap();

        let input = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2, 1]).unwrap();
        let output = layer.forward(&input).unwrap();

        assert_eq!(output.shape(), &[2, 2, 1]);
        assert_eq!(output.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_conv2d_weight_shape_validation() {
        let weights = Array4::zeros((3, 3, 1, 2));

        let result = Conv2D::new(
            "bad_conv".to_string(),
            4,
            (3, 3),
            (1, 1),
            Padding::Same,
            weights,
            None,
            Activation::Linear,
        );

        assert!(result.is_err());
    }
}
