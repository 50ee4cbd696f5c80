use ndarray::{Array2, Array4};

/// Unroll a 4D (batch, height, width, channels) tensor into a 2D patch
/// matrix for GEMM convolution (im2col). Each row holds one receptive
/// field, kernel-position-major with channels innermost, so it lines up
/// with (kh, kw, in, out) weights flattened to (kh * kw * in, out).
/// Out-of-bounds positions from padding stay zero.
pub fn im2col(
    input: &Array4<f32>,
    kernel_h: usize,
    kernel_w: usize,
    stride_h: usize,
    stride_w: usize,
    pad_top: usize,
    pad_left: usize,
    out_h: usize,
    out_w: usize,
) -> Array2<f32> {
    let (batch, height, width, channels) = input.dim();
    let rows = batch * out_h * out_w;
    let cols = kernel_h * kernel_w * channels;

    let mut patches = Array2::zeros((rows, cols));

    for (row, mut patch) in patches.rows_mut().into_iter().enumerate() {
        let b = row / (out_h * out_w);
        let oh = (row / out_w) % out_h;
        let ow = row % out_w;

        for kh in 0..kernel_h {
            // Padded coordinates wrap below zero; the bounds check rejects
            // both ends at once. A whole kernel row can fall into padding.
            let ih = (oh * stride_h + kh).wrapping_sub(pad_top);
            if ih >= height {
                continue;
            }

            for kw in 0..kernel_w {
                let iw = (ow * stride_w + kw).wrapping_sub(pad_left);
                if iw >= width {
                    continue;
                }

                let offset = (kh * kernel_w + kw) * channels;
                for c in 0..channels {
                    patch[offset + c] = input[[b, ih, iw, c]];
                }
            }
        }
    }

    patches
}
