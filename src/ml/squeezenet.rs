// ============================================================
// Layer 5 - SqueezeNet
// ============================================================
// SqueezeNet 1.0 and 1.1 as ImageNet classifiers, plus the
// feature trunk the cascade stages are cut from.
//
//   1.0: conv 96@7×7/2 → pool → F F F → pool → F F F F → pool → F
//   1.1: conv 64@3×3/2 → pool → F F → pool → F F → pool → F F F F
//   classifier: dropout → conv 1×1 → ReLU → global average pool
//
// Both versions reach 512 channels after the seventh Fire block,
// which is where a cascade stage cuts the trunk off. A 1.0 trunk
// cut there keeps the pool behind it, so both versions hand the
// head a map of the same size.
//
// Reference: Iandola et al. (2016) SqueezeNet: AlexNet-level accuracy
//            with 50x fewer parameters and <0.5MB model size

use burn::{
    module::Ignored,
    nn::{
        conv::Conv2d,
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Dropout, DropoutConfig, Initializer,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::domain::backbone::SqueezeNetVersion;
use crate::ml::fire::{conv, zero_bias, Fire, FireConfig};
use crate::ml::pool::{CeilMaxPool2d, CeilMaxPool2dConfig};

/// Fire blocks a cascade stage keeps from a pretrained trunk.
pub const STAGE_TRUNK_DEPTH: usize = 7;

#[derive(Config, Debug)]
pub struct SqueezeNetConfig {
    #[config(default = "SqueezeNetVersion::V1_1")]
    pub version:     SqueezeNetVersion,
    #[config(default = 1000)]
    pub num_classes: usize,
    #[config(default = 0.5)]
    pub dropout:     f64,
}

impl SqueezeNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SqueezeNet<B> {
        let features = FireTrunk::new(self.version, self.version.fires().len(), device);
        // The classifier conv starts near zero so initial logits are flat
        let classifier = conv([features.out_channels(), self.num_classes], 1, 0)
            .with_initializer(Initializer::Normal { mean: 0.0, std: 0.01 })
            .init(device);
        let classifier = zero_bias(classifier);
        SqueezeNet {
            features,
            dropout: DropoutConfig::new(self.dropout).init(),
            classifier,
            avg_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            num_classes: self.num_classes,
        }
    }
}

// ─── FireTrunk ────────────────────────────────────────────────────────────────
/// Stem convolution followed by a run of Fire blocks with the version's
/// pools interleaved.
#[derive(Module, Debug)]
pub struct FireTrunk<B: Backend> {
    pub stem:  Conv2d<B>,
    pub pool:  CeilMaxPool2d,
    pub fires: Vec<Fire<B>>,
    version:   Ignored<SqueezeNetVersion>,
}

impl<B: Backend> FireTrunk<B> {
    /// Trunk with the first `depth` Fire blocks of `version`.
    pub fn new(version: SqueezeNetVersion, depth: usize, device: &B::Device) -> Self {
        let (stem_channels, kernel, stride) = version.stem();
        let stem = conv([3, stem_channels], kernel, 0)
            .with_stride([stride, stride])
            .init(device);
        let stem = zero_bias(stem);
        let fires = version
            .fires()
            .iter()
            .take(depth)
            .map(|plan| FireConfig::from_plan(*plan).init(device))
            .collect();
        Self {
            stem,
            pool: CeilMaxPool2dConfig::new().init(),
            fires,
            version: Ignored(version),
        }
    }

    /// Drop every Fire block past `depth`.
    pub fn truncate(mut self, depth: usize) -> Self {
        self.fires.truncate(depth);
        self
    }

    pub fn out_channels(&self) -> usize {
        self.fires
            .last()
            .map(|f| f.out_channels())
            .unwrap_or(self.version.0.stem().0)
    }

    /// [batch, 3, h, w] → [batch, out_channels, h', w']
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = self.pool.forward(relu(self.stem.forward(x)));
        for (i, fire) in self.fires.iter().enumerate() {
            if self.version.0.pool_before(i) {
                x = self.pool.forward(x);
            }
            x = fire.forward(x);
        }
        if self.trailing_pool() {
            x = self.pool.forward(x);
        }
        x
    }

    /// A cut trunk keeps the pool that followed its last Fire block in the
    /// full network (SqueezeNet 1.0 cut after seven blocks).
    fn trailing_pool(&self) -> bool {
        let depth = self.fires.len();
        depth < self.version.0.fires().len() && self.version.0.pool_before(depth)
    }

    /// Spatial length after the trunk for an input of length `len`.
    pub fn output_len(&self, len: usize) -> Option<usize> {
        let (_, kernel, stride) = self.version.0.stem();
        let len = conv_len(len, kernel, stride, 0)?;
        let mut len = self.pool.output_len(len)?;
        for i in 0..self.fires.len() {
            if self.version.0.pool_before(i) {
                len = self.pool.output_len(len)?;
            }
        }
        if self.trailing_pool() {
            len = self.pool.output_len(len)?;
        }
        Some(len)
    }
}

// ─── SqueezeNet ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct SqueezeNet<B: Backend> {
    pub features:   FireTrunk<B>,
    pub dropout:    Dropout,
    pub classifier: Conv2d<B>,
    pub avg_pool:   AdaptiveAvgPool2d,
    pub num_classes: usize,
}

impl<B: Backend> SqueezeNet<B> {
    /// [batch, 3, h, w] → class scores [batch, num_classes]
    ///
    /// The ImageNet classifier path. Cascade stages only run the trunk.
    #[allow(dead_code)]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.features.forward(x);
        let x = relu(self.classifier.forward(self.dropout.forward(x)));
        let [batch, _, _, _] = x.dims();
        self.avg_pool.forward(x).reshape([batch, self.num_classes])
    }

    /// Discard the classifier and keep the first `depth` Fire blocks as a
    /// dense feature extractor.
    pub fn into_trunk(self, depth: usize) -> FireTrunk<B> {
        self.features.truncate(depth)
    }
}

/// Output length of a square convolution along one axis.
pub fn conv_len(len: usize, kernel: usize, stride: usize, padding: usize) -> Option<usize> {
    let padded = len + 2 * padding;
    if padded < kernel || stride == 0 {
        return None;
    }
    Some((padded - kernel) / stride + 1)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_v1_1_classifier_shape() {
        let device = Default::default();
        let model = SqueezeNetConfig::new()
            .with_num_classes(10)
            .init::<TestBackend>(&device);
        assert_eq!(model.features.fires.len(), 8);
        assert_eq!(model.features.out_channels(), 512);

        let x = Tensor::<TestBackend, 4>::ones([1, 3, 64, 64], &device);
        assert_eq!(model.forward(x).dims(), [1, 10]);
    }

    #[test]
    fn test_v1_0_classifier_shape() {
        let device = Default::default();
        let model = SqueezeNetConfig::new()
            .with_version(SqueezeNetVersion::V1_0)
            .with_num_classes(5)
            .init::<TestBackend>(&device);
        assert_eq!(model.features.version.0, SqueezeNetVersion::V1_0);

        let x = Tensor::<TestBackend, 4>::ones([2, 3, 64, 64], &device);
        assert_eq!(model.forward(x).dims(), [2, 5]);
    }

    #[test]
    fn test_output_len_trace() {
        let device = Default::default();
        let trunk = FireTrunk::<TestBackend>::new(SqueezeNetVersion::V1_1, 8, &device);
        // 256 → conv 127 → pool 63 → pool 31 → pool 15
        assert_eq!(trunk.output_len(256), Some(15));
        let trunk = FireTrunk::<TestBackend>::new(SqueezeNetVersion::V1_0, 8, &device);
        // 256 → conv 125 → pool 62 → pool 31 → pool 15
        assert_eq!(trunk.output_len(256), Some(15));
        assert_eq!(trunk.output_len(6), None);
    }

    #[test]
    fn test_output_len_matches_forward() {
        let device = Default::default();
        let trunk = FireTrunk::<TestBackend>::new(SqueezeNetVersion::V1_1, STAGE_TRUNK_DEPTH, &device);
        let x = Tensor::<TestBackend, 4>::ones([1, 3, 48, 40], &device);
        let [_, c, h, w] = trunk.forward(x).dims();
        assert_eq!(c, 512);
        assert_eq!(Some(h), trunk.output_len(48));
        assert_eq!(Some(w), trunk.output_len(40));
    }

    #[test]
    fn test_v1_0_cut_trunk_keeps_trailing_pool() {
        let device = Default::default();
        let trunk = SqueezeNetConfig::new()
            .with_version(SqueezeNetVersion::V1_0)
            .init::<TestBackend>(&device)
            .into_trunk(STAGE_TRUNK_DEPTH);
        // 256 → conv 125 → pool 62 → pool 31 → pool 15, same as 1.1
        assert_eq!(trunk.output_len(256), Some(15));

        // 64 → conv 29 → pool 14 → pool 7 → pool 3
        let x = Tensor::<TestBackend, 4>::ones([1, 3, 64, 64], &device);
        assert_eq!(trunk.forward(x).dims(), [1, 512, 3, 3]);
        assert_eq!(trunk.output_len(64), Some(3));
    }

    #[test]
    fn test_v1_1_cut_trunk_has_no_trailing_pool() {
        let device = Default::default();
        let trunk = FireTrunk::<TestBackend>::new(SqueezeNetVersion::V1_1, STAGE_TRUNK_DEPTH, &device);
        let full = FireTrunk::<TestBackend>::new(SqueezeNetVersion::V1_1, 8, &device);
        assert_eq!(trunk.output_len(256), full.output_len(256));
    }

    #[test]
    fn test_into_trunk_keeps_seven_fires() {
        let device = Default::default();
        for version in [SqueezeNetVersion::V1_0, SqueezeNetVersion::V1_1] {
            let trunk = SqueezeNetConfig::new()
                .with_version(version)
                .init::<TestBackend>(&device)
                .into_trunk(STAGE_TRUNK_DEPTH);
            assert_eq!(trunk.fires.len(), 7);
            assert_eq!(trunk.out_channels(), 512);
        }
    }

    #[test]
    fn test_stem_and_classifier_biases_start_at_zero() {
        let device = Default::default();
        let model = SqueezeNetConfig::new().with_num_classes(4).init::<TestBackend>(&device);
        for conv in [&model.features.stem, &model.classifier] {
            let bias = conv.bias.as_ref().expect("conv carries a bias");
            let values = bias.val().into_data().to_vec::<f32>().unwrap();
            assert!(values.iter().all(|v| *v == 0.0));
        }
    }

    #[test]
    fn test_parameter_count_is_squeezenet_sized() {
        let device = Default::default();
        let model = SqueezeNetConfig::new().init::<TestBackend>(&device);
        // SqueezeNet 1.1 has about 1.24M parameters
        let params = model.num_params();
        assert!(params > 1_200_000 && params < 1_300_000, "params = {params}");
    }
}
