// ============================================================
// Layer 5 - Prediction Pooling and Image Correction
// ============================================================
// The tensor operators that sit between cascade stages:
//
//   spatial_sum              [N,C,H,W] → [N,C]
//   l2_normalize             rows scaled to unit length
//   correct_image_nonlinear  divide out an illuminant, renormalise
//
// The correction raises the illuminant to 1/2.2 before dividing,
// so a linear illuminant estimate is applied to a gamma-encoded
// image. Each corrected image is then rescaled to peak at 1.

use burn::prelude::*;

pub const GAMMA: f32 = 2.2;
const NORM_EPS: f32 = 1e-12;
const DIV_EPS: f32 = 1e-10;

/// Sum every spatial position: [N, C, H, W] → [N, C]
pub fn spatial_sum<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 2> {
    let [n, c, _, _] = x.dims();
    x.sum_dim(3).sum_dim(2).reshape([n, c])
}

/// Scale each row to unit L2 norm. Rows with zero norm stay zero.
pub fn l2_normalize<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    let norm = x.clone().powf_scalar(2.0).sum_dim(1).sqrt().clamp_min(NORM_EPS);
    x.div(norm)
}

/// Remove the illuminant cast from `img` ([N, 3, H, W]) using one RGB
/// illuminant per image ([N, 3]).
pub fn correct_image_nonlinear<B: Backend>(img: Tensor<B, 4>, illuminant: Tensor<B, 2>) -> Tensor<B, 4> {
    let [n, c] = illuminant.dims();
    let scale = illuminant
        .powf_scalar(1.0 / GAMMA)
        .mul_scalar(3f32.sqrt())
        .reshape([n, c, 1, 1]);
    let corrected = img.div(scale.add_scalar(DIV_EPS));
    let peak = corrected
        .clone()
        .max_dim(1)
        .max_dim(2)
        .max_dim(3)
        .add_scalar(DIV_EPS);
    corrected.div(peak)
}
