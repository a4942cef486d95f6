// ============================================================
// Layer 5 - Fire Module
// ============================================================
// The SqueezeNet building block:
//
//   x ─► squeeze 1×1 ─► ReLU ─┬─► expand 1×1 ─► ReLU ─┐
//                             └─► expand 3×3 ─► ReLU ─┴─► concat(channels)
//
// The 3×3 branch pads by one so both branches keep the spatial
// size of the input and can be concatenated.

use burn::{
    module::Param,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        Initializer, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::domain::backbone::FirePlan;

#[derive(Config, Debug)]
pub struct FireConfig {
    pub in_channels:      usize,
    pub squeeze_planes:   usize,
    pub expand1x1_planes: usize,
    pub expand3x3_planes: usize,
}

impl FireConfig {
    pub fn from_plan((in_channels, squeeze, e1, e3): FirePlan) -> Self {
        Self::new(in_channels, squeeze, e1, e3)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Fire<B> {
        let squeeze = zero_bias(conv([self.in_channels, self.squeeze_planes], 1, 0).init(device));
        let expand1x1 = zero_bias(conv([self.squeeze_planes, self.expand1x1_planes], 1, 0).init(device));
        let expand3x3 = zero_bias(conv([self.squeeze_planes, self.expand3x3_planes], 3, 1).init(device));
        Fire {
            squeeze, expand1x1, expand3x3,
            out_channels: self.expand1x1_planes + self.expand3x3_planes,
        }
    }
}

/// Kaiming-uniform initialised conv with ReLU gain, as SqueezeNet uses for
/// every convolution except its classifier.
pub(crate) fn conv(channels: [usize; 2], kernel: usize, padding: usize) -> Conv2dConfig {
    Conv2dConfig::new(channels, [kernel, kernel])
        .with_padding(PaddingConfig2d::Explicit(padding, padding))
        .with_initializer(Initializer::KaimingUniform {
            gain:         2f64.sqrt(),
            fan_out_only: false,
        })
}

/// SqueezeNet starts every conv bias at zero.
pub(crate) fn zero_bias<B: Backend>(mut conv: Conv2d<B>) -> Conv2d<B> {
    conv.bias = conv.bias.map(|bias| Param::from_tensor(bias.val().zeros_like()));
    conv
}

#[derive(Module, Debug)]
pub struct Fire<B: Backend> {
    pub squeeze:   Conv2d<B>,
    pub expand1x1: Conv2d<B>,
    pub expand3x3: Conv2d<B>,
    out_channels:  usize,
}

impl<B: Backend> Fire<B> {
    /// [batch, in, h, w] → [batch, expand1x1 + expand3x3, h, w]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.squeeze.forward(x));
        let left = relu(self.expand1x1.forward(x.clone()));
        let right = relu(self.expand3x3.forward(x));
        Tensor::cat(vec![left, right], 1)
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_fire_concatenates_both_branches() {
        let device = Default::default();
        let fire = FireConfig::new(64, 16, 64, 64).init::<TestBackend>(&device);
        assert_eq!(fire.out_channels(), 128);

        let x = Tensor::<TestBackend, 4>::ones([2, 64, 8, 8], &device);
        assert_eq!(fire.forward(x).dims(), [2, 128, 8, 8]);
    }

    #[test]
    fn test_fire_output_is_non_negative() {
        let device = Default::default();
        let fire = FireConfig::new(8, 4, 6, 10).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::random(
            [1, 8, 5, 5],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        let out = fire.forward(x);
        assert_eq!(out.dims(), [1, 16, 5, 5]);
        let min = out.min().into_scalar().elem::<f32>();
        assert!(min >= 0.0);
    }

    #[test]
    fn test_fire_biases_start_at_zero() {
        let device = Default::default();
        let fire = FireConfig::new(64, 16, 64, 64).init::<TestBackend>(&device);
        for conv in [&fire.squeeze, &fire.expand1x1, &fire.expand3x3] {
            let bias = conv.bias.as_ref().expect("fire convs carry a bias");
            let values = bias.val().into_data().to_vec::<f32>().unwrap();
            assert!(values.iter().all(|v| *v == 0.0));
        }
        // weights stay random
        let weights = fire.squeeze.weight.val().into_data().to_vec::<f32>().unwrap();
        assert!(weights.iter().any(|v| *v != 0.0));
    }

    #[test]
    fn test_fire_parameter_count() {
        let device = Default::default();
        let fire = FireConfig::new(64, 16, 64, 64).init::<TestBackend>(&device);
        // squeeze 64·16+16, expand1x1 16·64+64, expand3x3 16·64·9+64
        assert_eq!(fire.num_params(), 1040 + 1088 + 9280);
    }
}
