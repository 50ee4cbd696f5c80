use approx::assert_abs_diff_eq;
use ndarray::{array, Array4};
use tiny_resnet::layers::{
    batch_normalization::{BatchNormParams, BatchNormalization},
    conv2d::{Conv2D, Padding},
    Layer,
};
use tiny_resnet::{activations::Activation, Tensor};

/// 3x3 kernel whose center tap is 1 on matching channels: with same
/// padding and stride 1 the convolution is the identity.
fn center_tap_weights(channels: usize) -> Array4<f32> {
    Array4::from_shape_fn((3, 3, channels, channels), |(kh, kw, ic, oc)| {
        if kh == 1 && kw == 1 && ic == oc {
            1.0
        } else {
            0.0
        }
    })
}

#[test]
fn test_conv2d_center_tap_is_identity() {
    let layer = Conv2D::new(
        "conv".to_string(),
        1,
        (3, 3),
        (1, 1),
        Padding::Same,
        center_tap_weights(1),
        None,
        Activation::Linear,
    )
    .unwrap();

    let values: Vec<f32> = (1..=9).map(|i| i as f32).collect();
    let input = Tensor::from_vec(values.clone(), &[3, 3, 1]).unwrap();
    let output = layer.forward(&input).unwrap();

    assert_eq!(output.shape(), &[3, 3, 1]);
    assert_eq!(output.to_vec(), values);
}

#[test]
fn test_conv2d_strided_center_tap_subsamples() {
    let layer = Conv2D::new(
        "conv".to_string(),
        1,
        (3, 3),
        (2, 2),
        Padding::Same,
        center_tap_weights(1),
        None,
        Activation::Linear,
    )
    .unwrap();

    let values: Vec<f32> = (1..=16).map(|i| i as f32).collect();
    let input = Tensor::from_vec(values, &[4, 4, 1]).unwrap();
    let output = layer.forward(&input).unwrap();

    // Same padding with stride 2 on a 4x4 map pads only bottom/right, so
    // the 3x3 centers land on rows/cols 1 and 3.
    assert_eq!(output.shape(), &[2, 2, 1]);
    assert_eq!(output.to_vec(), vec![6.0, 8.0, 14.0, 16.0]);
}

#[test]
fn test_conv2d_1x1_mixes_channels() {
    let weights = Array4::from_shape_vec((1, 1, 2, 1), vec![1.0, 1.0]).unwrap();
    let layer = Conv2D::new(
        "conv".to_string(),
        1,
        (1, 1),
        (1, 1),
        Padding::Valid,
        weights,
        None,
        Activation::Linear,
    )
    .unwrap();

    let input = Tensor::from_vec(vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0], &[2, 2, 2])
        .unwrap();
    let output = layer.forward(&input).unwrap();

    assert_eq!(output.shape(), &[2, 2, 1]);
    assert_eq!(output.to_vec(), vec![11.0, 22.0, 33.0, 44.0]);
}

#[test]
fn test_conv2d_batched_input() {
    let layer = Conv2D::new(
        "conv".to_string(),
        1,
        (3, 3),
        (1, 1),
        Padding::Same,
        center_tap_weights(1),
        None,
        Activation::Linear,
    )
    .unwrap();

    let values: Vec<f32> = (0..18).map(|i| i as f32).collect();
    let input = Tensor::from_vec(values.clone(), &[2, 3, 3, 1]).unwrap();
    let output = layer.forward(&input).unwrap();

    assert_eq!(output.shape(), &[2, 3, 3, 1]);
    assert_eq!(output.to_vec(), values);
}

#[test]
fn test_conv2d_fused_relu() {
    let weights = Array4::from_shape_vec((1, 1, 1, 1), vec![-1.0]).unwrap();
    let layer = Conv2D::new(
        "conv".to_string(),
        1,
        (1, 1),
        (1, 1),
        Padding::Valid,
        weights,
        None,
        Activation::ReLU,
    )
    .unwrap();

    let input = Tensor::from_vec(vec![1.0, -2.0], &[1, 2, 1]).unwrap();
    let output = layer.forward(&input).unwrap();

    assert_eq!(output.to_vec(), vec![0.0, 2.0]);
}

#[test]
fn test_conv2d_channel_mismatch() {
    let layer = Conv2D::new(
        "conv".to_string(),
        2,
        (3, 3),
        (1, 1),
        Padding::Same,
        Array4::zeros((3, 3, 2, 2)),
        None,
        Activation::Linear,
    )
    .unwrap();

    let input = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2, 1]).unwrap();
    assert!(layer.forward(&input).is_err());
}

#[test]
fn test_conv2d_valid_padding_rejects_undersized_input() {
    let layer = Conv2D::new(
        "conv".to_string(),
        1,
        (3, 3),
        (1, 1),
        Padding::Valid,
        Array4::zeros((3, 3, 1, 1)),
        None,
        Activation::Linear,
    )
    .unwrap();

    // A 2x2 map has no room for a 3x3 kernel without padding; this must
    // come back as an error, not an arithmetic failure.
    let input = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2, 1]).unwrap();
    assert!(layer.forward(&input).is_err());
    assert!(layer.output_shape(&[2, 2, 1]).is_err());
    assert!(layer.output_shape(&[1, 2, 2, 1]).is_err());
}

#[test]
fn test_conv2d_output_shape() {
    let layer = Conv2D::new(
        "conv".to_string(),
        4,
        (3, 3),
        (2, 2),
        Padding::Same,
        Array4::zeros((3, 3, 3, 4)),
        None,
        Activation::Linear,
    )
    .unwrap();

    assert_eq!(layer.output_shape(&[5, 5, 3]).unwrap(), vec![3, 3, 4]);
    assert_eq!(
        layer.output_shape(&[8, 5, 5, 3]).unwrap(),
        vec![8, 3, 3, 4]
    );
}

#[test]
fn test_padding_from_str() {
    assert_eq!(Padding::from_str("valid").unwrap(), Padding::Valid);
    assert_eq!(Padding::from_str("same").unwrap(), Padding::Same);
    assert_eq!(Padding::from_str("VALID").unwrap(), Padding::Valid);
    assert_eq!(Padding::from_str("Same").unwrap(), Padding::Same);
}

#[test]
fn test_padding_from_str_invalid() {
    assert!(Padding::from_str("invalid").is_err());
}

#[test]
fn test_batch_norm_matches_closed_form() {
    let params = BatchNormParams {
        gamma: array![2.0],
        beta: array![1.0],
        moving_mean: array![3.0],
        moving_variance: array![4.0],
        epsilon: 0.0,
    };
    let layer = BatchNormalization::new("bn".to_string(), params).unwrap();

    let input = Tensor::from_vec(vec![5.0, 3.0, 1.0], &[3, 1]).unwrap();
    let result = layer.forward(&input).unwrap().to_vec();

    // y = 2 * (x - 3) / 2 + 1
    assert_abs_diff_eq!(result[0], 3.0, epsilon = 1e-6);
    assert_abs_diff_eq!(result[1], 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(result[2], -1.0, epsilon = 1e-6);
}

#[test]
fn test_batch_norm_on_4d_feature_maps() {
    let layer =
        BatchNormalization::new("bn".to_string(), BatchNormParams::identity(2)).unwrap();

    let values: Vec<f32> = (0..16).map(|i| i as f32).collect();
    let input = Tensor::from_vec(values.clone(), &[2, 2, 2, 2]).unwrap();
    let output = layer.forward(&input).unwrap();

    assert_eq!(output.shape(), &[2, 2, 2, 2]);
    assert_eq!(output.to_vec(), values);
}
