// ============================================================
// Layer 5 - Cascade Stage Network
// ============================================================
// One stage of the cascade: a dense feature extractor followed
// by a small convolutional head that maps 512 feature channels
// to a coarse RGB illuminant map.
//
//   SqueezeNet stage:  FireTrunk(7 fires) ─────────────────────────► head
//   Hybrid stage:      ResNetTrunk → tile 8×8 → bridge 2×2 → fires ─► head
//
//   head: pool → conv 512→64 6×6/p3 → ReLU → dropout → conv 64→3 1×1 → ReLU
//
// For a 256×256 input both variants produce [N, 3, 8, 8].

use burn::{
    nn::{conv::Conv2d, Dropout, DropoutConfig, PaddingConfig2d},
    prelude::*,
    tensor::activation::relu,
};

use crate::domain::backbone::{BackboneKind, ResNetDepth, SqueezeNetVersion};
use crate::ml::fire::{conv, Fire, FireConfig};
use crate::ml::pool::{CeilMaxPool2d, CeilMaxPool2dConfig};
use crate::ml::resnet::{ResNetTrunk, ResNetTrunkConfig, TRUNK_CHANNELS};
use crate::ml::squeezenet::{conv_len, FireTrunk, SqueezeNet, STAGE_TRUNK_DEPTH};

/// How many times the residual feature map is tiled along each axis.
const HYBRID_TILE: usize = 8;
const BRIDGE_CHANNELS: usize = 128;
const HEAD_CHANNELS: usize = 64;
const HEAD_KERNEL: usize = 6;
const HEAD_PAD: usize = 3;

#[derive(Config, Debug)]
pub struct StageNetConfig {
    #[config(default = "SqueezeNetVersion::V1_1")]
    pub version:  SqueezeNetVersion,
    #[config(default = "BackboneKind::SqueezeNet")]
    pub backbone: BackboneKind,
    #[config(default = 0.5)]
    pub dropout:  f64,
}

impl StageNetConfig {
    /// Randomly initialised stage.
    pub fn init<B: Backend>(&self, device: &B::Device) -> StageNet<B> {
        match self.backbone {
            BackboneKind::SqueezeNet => {
                let trunk = FireTrunk::new(self.version, STAGE_TRUNK_DEPTH, device);
                self.with_squeezenet_trunk(trunk, device)
            }
            BackboneKind::Hybrid(depth) => {
                let resnet = ResNetTrunkConfig::new().with_depth(depth).init(device);
                self.with_resnet_trunk(resnet, device)
            }
        }
    }

    /// Stage cut from a (typically pretrained) SqueezeNet classifier.
    pub fn init_from_squeezenet<B: Backend>(
        &self,
        squeezenet: SqueezeNet<B>,
        device: &B::Device,
    ) -> StageNet<B> {
        self.with_squeezenet_trunk(squeezenet.into_trunk(STAGE_TRUNK_DEPTH), device)
    }

    /// Hybrid stage around a (typically pretrained) residual trunk.
    pub fn init_from_resnet<B: Backend>(
        &self,
        resnet: ResNetTrunk<B>,
        device: &B::Device,
    ) -> StageNet<B> {
        self.with_resnet_trunk(resnet, device)
    }

    fn with_squeezenet_trunk<B: Backend>(&self, trunk: FireTrunk<B>, device: &B::Device) -> StageNet<B> {
        let head = self.head(trunk.out_channels(), device);
        StageNet { squeeze: Some(trunk), hybrid: None, head }
    }

    fn with_resnet_trunk<B: Backend>(&self, resnet: ResNetTrunk<B>, device: &B::Device) -> StageNet<B> {
        let hybrid = HybridTrunk::new(resnet, device);
        let head = self.head(hybrid.out_channels(), device);
        StageNet { squeeze: None, hybrid: Some(hybrid), head }
    }

    fn head<B: Backend>(&self, in_channels: usize, device: &B::Device) -> IlluminantHead<B> {
        IlluminantHead {
            pool:    CeilMaxPool2dConfig::new().init(),
            conv1:   conv([in_channels, HEAD_CHANNELS], HEAD_KERNEL, 0)
                .with_padding(PaddingConfig2d::Valid)
                .init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            conv2:   conv([HEAD_CHANNELS, 3], 1, 0).init(device),
        }
    }
}

// ─── HybridTrunk ──────────────────────────────────────────────────────────────
/// Residual trunk re-expanded spatially and handed to a Fire stack.
#[derive(Module, Debug)]
pub struct HybridTrunk<B: Backend> {
    pub resnet: ResNetTrunk<B>,
    pub bridge: Conv2d<B>,
    pub pool:   CeilMaxPool2d,
    pub fires:  Vec<Fire<B>>,
}

impl<B: Backend> HybridTrunk<B> {
    fn new(resnet: ResNetTrunk<B>, device: &B::Device) -> Self {
        let bridge = conv([TRUNK_CHANNELS, BRIDGE_CHANNELS], 2, 0).init(device);
        // SqueezeNet 1.1 Fire blocks 2..8 accept the 128-channel bridge output
        let fires = SqueezeNetVersion::V1_1.fires()[2..]
            .iter()
            .map(|plan| FireConfig::from_plan(*plan).init(device))
            .collect();
        Self {
            resnet,
            bridge,
            pool: CeilMaxPool2dConfig::new().init(),
            fires,
        }
    }

    pub fn depth(&self) -> ResNetDepth {
        if self.resnet.block_count() > 8 { ResNetDepth::R34 } else { ResNetDepth::R18 }
    }

    pub fn out_channels(&self) -> usize {
        self.fires.last().map(|f| f.out_channels()).unwrap_or(BRIDGE_CHANNELS)
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.resnet.forward(x);
        let x = x.repeat_dim(2, HYBRID_TILE).repeat_dim(3, HYBRID_TILE);
        let mut x = self.bridge.forward(x);
        for (i, fire) in self.fires.iter().enumerate() {
            // Pools in front of the first and third Fire blocks
            if i == 0 || i == 2 {
                x = self.pool.forward(x);
            }
            x = fire.forward(x);
        }
        x
    }

    pub fn output_len(&self, len: usize) -> Option<usize> {
        let len = self.resnet.output_len(len)? * HYBRID_TILE;
        let len = conv_len(len, 2, 1, 0)?;
        let len = self.pool.output_len(len)?;
        self.pool.output_len(len)
    }
}

// ─── IlluminantHead ───────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct IlluminantHead<B: Backend> {
    pub pool:    CeilMaxPool2d,
    pub conv1:   Conv2d<B>,
    pub dropout: Dropout,
    pub conv2:   Conv2d<B>,
}

impl<B: Backend> IlluminantHead<B> {
    /// [N, 512, h, w] → non-negative [N, 3, h', w']
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = zero_pad(self.pool.forward(x), HEAD_PAD);
        let x = relu(self.conv1.forward(x));
        let x = self.dropout.forward(x);
        relu(self.conv2.forward(x))
    }

    pub fn output_len(&self, len: usize) -> Option<usize> {
        let len = self.pool.output_len(len)?;
        conv_len(len, HEAD_KERNEL, 1, HEAD_PAD)
    }
}

/// Surround both spatial axes with `pad` zeros on every side.
fn zero_pad<B: Backend>(x: Tensor<B, 4>, pad: usize) -> Tensor<B, 4> {
    if pad == 0 {
        return x;
    }
    let device = x.device();
    let [n, c, h, w] = x.dims();
    let rows = Tensor::<B, 4>::zeros([n, c, pad, w], &device);
    let x = Tensor::cat(vec![rows.clone(), x, rows], 2);
    let cols = Tensor::<B, 4>::zeros([n, c, h + 2 * pad, pad], &device);
    Tensor::cat(vec![cols.clone(), x, cols], 3)
}

// ─── StageNet ─────────────────────────────────────────────────────────────────
/// Exactly one of `squeeze` / `hybrid` is set; StageNetConfig guarantees it.
#[derive(Module, Debug)]
pub struct StageNet<B: Backend> {
    pub squeeze: Option<FireTrunk<B>>,
    pub hybrid:  Option<HybridTrunk<B>>,
    pub head:    IlluminantHead<B>,
}

impl<B: Backend> StageNet<B> {
    /// [N, 3, H, W] → illuminant map [N, 3, h, w]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.head.forward(self.features(x))
    }

    fn features(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match (&self.squeeze, &self.hybrid) {
            (Some(trunk), _) => trunk.forward(x),
            (None, Some(hybrid)) => hybrid.forward(x),
            (None, None) => unreachable!("StageNet is always built with a backbone"),
        }
    }

    pub fn backbone(&self) -> BackboneKind {
        match &self.hybrid {
            Some(hybrid) => BackboneKind::Hybrid(hybrid.depth()),
            None => BackboneKind::SqueezeNet,
        }
    }

    /// Spatial length of the backbone feature map for an input of `len`.
    pub fn trunk_len(&self, len: usize) -> Option<usize> {
        match (&self.squeeze, &self.hybrid) {
            (Some(trunk), _) => trunk.output_len(len),
            (None, Some(hybrid)) => hybrid.output_len(len),
            (None, None) => None,
        }
    }

    /// Spatial size of the illuminant map for an `h`×`w` input, or None
    /// when the input is too small to survive every pooling step.
    pub fn output_hw(&self, h: usize, w: usize) -> Option<(usize, usize)> {
        let h = self.head.output_len(self.trunk_len(h)?)?;
        let w = self.head.output_len(self.trunk_len(w)?)?;
        Some((h, w))
    }
}
