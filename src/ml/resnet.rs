// ============================================================
// Layer 5 - Residual Trunk
// ============================================================
// ResNet-18/34 up to and including the last residual layer,
// i.e. everything before global pooling and the fc classifier.
// For a 256×256 input the trunk yields [batch, 512, 8, 8].
//
// Reference: He et al. (2016) Deep Residual Learning for Image Recognition

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Initializer, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::domain::backbone::ResNetDepth;
use crate::ml::squeezenet::conv_len;

/// Channel width of each residual layer.
const LAYER_CHANNELS: [usize; 4] = [64, 128, 256, 512];

pub const TRUNK_CHANNELS: usize = 512;

#[derive(Config, Debug)]
pub struct ResNetTrunkConfig {
    #[config(default = "ResNetDepth::R34")]
    pub depth: ResNetDepth,
}

impl ResNetTrunkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNetTrunk<B> {
        let conv1 = conv_bn([3, 64], 7, 2, 3).init(device);
        let bn1 = BatchNormConfig::new(64).init(device);
        let maxpool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        let [b1, b2, b3, b4] = self.depth.blocks();
        let [c1, c2, c3, c4] = LAYER_CHANNELS;
        let layer1 = ResidualLayer::new(64, c1, b1, 1, device);
        let layer2 = ResidualLayer::new(c1, c2, b2, 2, device);
        let layer3 = ResidualLayer::new(c2, c3, b3, 2, device);
        let layer4 = ResidualLayer::new(c3, c4, b4, 2, device);

        ResNetTrunk { conv1, bn1, maxpool, layer1, layer2, layer3, layer4 }
    }
}

/// Bias-free conv as used in front of every BatchNorm.
fn conv_bn(channels: [usize; 2], kernel: usize, stride: usize, padding: usize) -> Conv2dConfig {
    Conv2dConfig::new(channels, [kernel, kernel])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(padding, padding))
        .with_bias(false)
        .with_initializer(Initializer::KaimingNormal { gain: 2f64.sqrt(), fan_out_only: true })
}

// ─── BasicBlock ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Downsample<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn:   BatchNorm<B>,
}

#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    pub conv1:      Conv2d<B>,
    pub bn1:        BatchNorm<B>,
    pub conv2:      Conv2d<B>,
    pub bn2:        BatchNorm<B>,
    pub downsample: Option<Downsample<B>>,
}

impl<B: Backend> BasicBlock<B> {
    fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        // Projection shortcut only where the identity would not line up
        let downsample = (stride != 1 || in_channels != out_channels).then(|| Downsample {
            conv: conv_bn([in_channels, out_channels], 1, stride, 0).init(device),
            bn:   BatchNormConfig::new(out_channels).init(device),
        });
        Self {
            conv1: conv_bn([in_channels, out_channels], 3, stride, 1).init(device),
            bn1:   BatchNormConfig::new(out_channels).init(device),
            conv2: conv_bn([out_channels, out_channels], 3, 1, 1).init(device),
            bn2:   BatchNormConfig::new(out_channels).init(device),
            downsample,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.downsample {
            Some(ds) => ds.bn.forward(ds.conv.forward(x.clone())),
            None => x.clone(),
        };
        let out = relu(self.bn1.forward(self.conv1.forward(x)));
        let out = self.bn2.forward(self.conv2.forward(out));
        relu(out + identity)
    }
}

#[derive(Module, Debug)]
pub struct ResidualLayer<B: Backend> {
    pub blocks: Vec<BasicBlock<B>>,
    stride:     usize,
}

impl<B: Backend> ResidualLayer<B> {
    fn new(
        in_channels:  usize,
        out_channels: usize,
        count:        usize,
        stride:       usize,
        device:       &B::Device,
    ) -> Self {
        let blocks = (0..count)
            .map(|i| {
                if i == 0 {
                    BasicBlock::new(in_channels, out_channels, stride, device)
                } else {
                    BasicBlock::new(out_channels, out_channels, 1, device)
                }
            })
            .collect();
        Self { blocks, stride }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.blocks.iter().fold(x, |x, block| block.forward(x))
    }

    fn output_len(&self, len: usize) -> Option<usize> {
        conv_len(len, 3, self.stride, 1)
    }
}

// ─── ResNetTrunk ──────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ResNetTrunk<B: Backend> {
    pub conv1:   Conv2d<B>,
    pub bn1:     BatchNorm<B>,
    pub maxpool: MaxPool2d,
    pub layer1:  ResidualLayer<B>,
    pub layer2:  ResidualLayer<B>,
    pub layer3:  ResidualLayer<B>,
    pub layer4:  ResidualLayer<B>,
}

impl<B: Backend> ResNetTrunk<B> {
    /// [batch, 3, h, w] → [batch, 512, h/32, w/32]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.bn1.forward(self.conv1.forward(x)));
        let x = self.maxpool.forward(x);
        let x = self.layer1.forward(x);
        let x = self.layer2.forward(x);
        let x = self.layer3.forward(x);
        self.layer4.forward(x)
    }

    pub fn output_len(&self, len: usize) -> Option<usize> {
        let len = conv_len(len, 7, 2, 3)?;
        let len = conv_len(len, 3, 2, 1)?;
        [&self.layer1, &self.layer2, &self.layer3, &self.layer4]
            .iter()
            .try_fold(len, |len, layer| layer.output_len(len))
    }

    pub fn block_count(&self) -> usize {
        [&self.layer1, &self.layer2, &self.layer3, &self.layer4]
            .iter()
            .map(|layer| layer.blocks.len())
            .sum()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_block_counts() {
        let device = Default::default();
        let r18 = ResNetTrunkConfig::new().with_depth(ResNetDepth::R18).init::<TestBackend>(&device);
        let r34 = ResNetTrunkConfig::new().init::<TestBackend>(&device);
        assert_eq!(r18.block_count(), 8);
        assert_eq!(r34.block_count(), 16);
    }

    #[test]
    fn test_trunk_is_stride_32() {
        let device = Default::default();
        let trunk = ResNetTrunkConfig::new().with_depth(ResNetDepth::R18).init::<TestBackend>(&device);
        assert_eq!(trunk.output_len(256), Some(8));
        assert_eq!(trunk.output_len(64), Some(2));

        let x = Tensor::<TestBackend, 4>::ones([1, 3, 64, 64], &device);
        assert_eq!(trunk.forward(x).dims(), [1, TRUNK_CHANNELS, 2, 2]);
    }

    #[test]
    fn test_first_layer_keeps_identity_shortcut() {
        let device = Default::default();
        let trunk = ResNetTrunkConfig::new().with_depth(ResNetDepth::R18).init::<TestBackend>(&device);
        assert!(trunk.layer1.blocks[0].downsample.is_none());
        assert!(trunk.layer2.blocks[0].downsample.is_some());
        assert!(trunk.layer2.blocks[1].downsample.is_none());
    }
}
