use crate::{
    activations::Activation,
    layers::{BatchNormParams, BatchNormalization, Conv2D, Layer, Padding},
    Error, Result, Tensor,
};
use ndarray::Array4;

/// Weights for one residual block in (kernel_h, kernel_w, in, out) layout.
///
/// `projection` carries the 1x1 shortcut convolution and its normalization
/// statistics. It must be present exactly when the block downsamples or
/// changes channel count.
#[derive(Debug, Clone)]
pub struct ResidualBlockWeights {
    pub conv1: Array4<f32>,
    pub bn1: BatchNormParams,
    pub conv2: Array4<f32>,
    pub bn2: BatchNormParams,
    pub projection: Option<(Array4<f32>, BatchNormParams)>,
}

/// Residual convolutional block:
///
/// ```text
/// x -> conv1 (3x3, stride s) -> bn1 -> relu -> conv2 (3x3) -> bn2 -+-> relu
///  \                                                              /
///   +-> identity, or 1x1 projection (stride s) -> bn -------------+
/// ```
///
/// The main path keeps spatial extent via same padding; the projection
/// shortcut matches its stride and channel count so the elementwise add is
/// always well-shaped.
#[derive(Debug)]
pub struct ResidualBlock {
    name: String,
    conv1: Conv2D,
    bn1: BatchNormalization,
    conv2: Conv2D,
    bn2: BatchNormalization,
    projection: Option<(Conv2D, BatchNormalization)>,
}

impl ResidualBlock {
    pub fn new(
        name: String,
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        weights: ResidualBlockWeights,
    ) -> Result<Self> {
        check_kernel(&name, "conv1", &weights.conv1, 3, in_channels, out_channels)?;
        check_kernel(&name, "conv2", &weights.conv2, 3, out_channels, out_channels)?;

        let needs_projection = stride != 1 || in_channels != out_channels;
        let projection = match (needs_projection, weights.projection) {
            (true, Some((proj_weights, proj_bn))) => {
                check_kernel(&name, "projection", &proj_weights, 1, in_channels, out_channels)?;
                let conv = Conv2D::new(
                    format!("{}_proj", name),
                    out_channels,
                    (1, 1),
                    (stride, stride),
                    Padding::Same,
                    proj_weights,
                    None,
                    Activation::Linear,
                )?;
                let bn = BatchNormalization::new(format!("{}_proj_bn", name), proj_bn)?;
                Some((conv, bn))
            }
            (false, None) => None,
            (true, None) => {
                return Err(Error::Layer(format!(
                    "ResidualBlock {}: shortcut needs a projection \
                     (stride {} with {} -> {} channels) but none was given",
                    name, stride, in_channels, out_channels
                )));
            }
            (false, Some(_)) => {
                return Err(Error::Layer(format!(
                    "ResidualBlock {}: identity shortcut doesn't take projection weights",
                    name
                )));
            }
        };

        let conv1 = Conv2D::new(
            format!("{}_conv1", name),
            out_channels,
            (3, 3),
            (stride, stride),
            Padding::Same,
            weights.conv1,
            None,
            Activation::Linear,
        )?;
        let bn1 = BatchNormalization::new(format!("{}_bn1", name), weights.bn1)?;

        // The second convolution never strides; the block's downsampling is
        // done once, by conv1 and the projection.
        let conv2 = Conv2D::new(
            format!("{}_conv2", name),
            out_channels,
            (3, 3),
            (1, 1),
            Padding::Same,
            weights.conv2,
            None,
            Activation::Linear,
        )?;
        let bn2 = BatchNormalization::new(format!("{}_bn2", name), weights.bn2)?;

        Ok(Self {
            name,
            conv1,
            bn1,
            conv2,
            bn2,
            projection,
        })
    }

    pub fn uses_projection(&self) -> bool {
        self.projection.is_some()
    }

    pub fn in_channels(&self) -> usize {
        self.conv1.in_channels()
    }

    pub fn out_channels(&self) -> usize {
        self.conv1.filters()
    }
}

fn check_kernel(
    block: &str,
    which: &str,
    weights: &Array4<f32>,
    kernel: usize,
    in_channels: usize,
    out_channels: usize,
) -> Result<()> {
    let dims = weights.dim();
    if dims != (kernel, kernel, in_channels, out_channels) {
        return Err(Error::Layer(format!(
            "ResidualBlock {}: {} weights have shape {:?}, expected {:?}",
            block,
            which,
            [dims.0, dims.1, dims.2, dims.3],
            [kernel, kernel, in_channels, out_channels]
        )));
    }
    Ok(())
}

impl Layer for ResidualBlock {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let mut main = self.conv1.forward(input)?;
        main = self.bn1.forward(&main)?;
        Activation::ReLU.apply(&mut main)?;
        main = self.conv2.forward(&main)?;
        main = self.bn2.forward(&main)?;

        let shortcut = match &self.projection {
            Some((conv, bn)) => {
                let projected = conv.forward(input)?;
                bn.forward(&projected)?
            }
            None => input.clone(),
        };

        if main.shape() != shortcut.shape() {
            return Err(Error::ShapeMismatch {
                expected: main.shape().to_vec(),
                actual: shortcut.shape().to_vec(),
            });
        }

        let mut output = Tensor::new(main.into_data() + shortcut.into_data());
        Activation::ReLU.apply(&mut output)?;

        Ok(output)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        let after_conv1 = self.conv1.output_shape(input_shape)?;
        self.conv2.output_shape(&after_conv1)
    }
}
