// ============================================================
// Layer 3 - Backbone Descriptions
// ============================================================
// Plain descriptions of the convolutional backbones a cascade
// stage can be built from. The ml layer turns these into burn
// modules; nothing here touches tensors.
//
// Reference: Iandola et al. (2016) SqueezeNet
//            He et al. (2016) Deep Residual Learning

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// (in_channels, squeeze, expand1x1, expand3x3) for one Fire block.
pub type FirePlan = (usize, usize, usize, usize);

const FIRES_V1_0: [FirePlan; 8] = [
    (96, 16, 64, 64),
    (128, 16, 64, 64),
    (128, 32, 128, 128),
    (256, 32, 128, 128),
    (256, 48, 192, 192),
    (384, 48, 192, 192),
    (384, 64, 256, 256),
    (512, 64, 256, 256),
];

const FIRES_V1_1: [FirePlan; 8] = [
    (64, 16, 64, 64),
    (128, 16, 64, 64),
    (128, 32, 128, 128),
    (256, 32, 128, 128),
    (256, 48, 192, 192),
    (384, 48, 192, 192),
    (384, 64, 256, 256),
    (512, 64, 256, 256),
];

/// The two published SqueezeNet layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqueezeNetVersion {
    V1_0,
    V1_1,
}

impl SqueezeNetVersion {
    /// Stem convolution as (out_channels, kernel, stride).
    pub fn stem(self) -> (usize, usize, usize) {
        match self {
            Self::V1_0 => (96, 7, 2),
            Self::V1_1 => (64, 3, 2),
        }
    }

    pub fn fires(self) -> &'static [FirePlan] {
        match self {
            Self::V1_0 => &FIRES_V1_0,
            Self::V1_1 => &FIRES_V1_1,
        }
    }

    /// True when a max-pool sits directly in front of Fire block `index`.
    /// The pool after the stem is not counted here.
    pub fn pool_before(self, index: usize) -> bool {
        match self {
            Self::V1_0 => matches!(index, 3 | 7),
            Self::V1_1 => matches!(index, 2 | 4),
        }
    }

    /// Name under which pretrained weights are catalogued.
    pub fn weights_name(self) -> &'static str {
        match self {
            Self::V1_0 => "squeezenet1_0",
            Self::V1_1 => "squeezenet1_1",
        }
    }
}

impl fmt::Display for SqueezeNetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1_0 => write!(f, "1.0"),
            Self::V1_1 => write!(f, "1.1"),
        }
    }
}

impl FromStr for SqueezeNetVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1.0" | "1_0" | "10" | "squeezenet1_0" => Ok(Self::V1_0),
            "1.1" | "1_1" | "11" | "squeezenet1_1" => Ok(Self::V1_1),
            other => bail!("Unsupported SqueezeNet version {other}: 1.0 or 1.1 expected"),
        }
    }
}

/// Residual trunk depths that use BasicBlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResNetDepth {
    R18,
    R34,
}

impl ResNetDepth {
    /// Number of BasicBlocks in each of the four residual layers.
    pub fn blocks(self) -> [usize; 4] {
        match self {
            Self::R18 => [2, 2, 2, 2],
            Self::R34 => [3, 4, 6, 3],
        }
    }

    pub fn weights_name(self) -> &'static str {
        match self {
            Self::R18 => "resnet18",
            Self::R34 => "resnet34",
        }
    }
}

/// Which feature extractor a cascade stage runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackboneKind {
    /// Truncated SqueezeNet Fire trunk.
    SqueezeNet,
    /// Residual trunk followed by a Fire stack.
    Hybrid(ResNetDepth),
}

impl fmt::Display for BackboneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SqueezeNet => write!(f, "squeezenet"),
            Self::Hybrid(ResNetDepth::R18) => write!(f, "hybrid-resnet18"),
            Self::Hybrid(ResNetDepth::R34) => write!(f, "hybrid-resnet34"),
        }
    }
}

impl FromStr for BackboneKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "squeezenet" | "squeeze" => Ok(Self::SqueezeNet),
            "hybrid-resnet18" | "resnet18" => Ok(Self::Hybrid(ResNetDepth::R18)),
            "hybrid-resnet34" | "resnet34" | "hybrid" => Ok(Self::Hybrid(ResNetDepth::R34)),
            other => bail!(
                "Unknown backbone '{other}': expected squeezenet, hybrid-resnet18 or hybrid-resnet34"
            ),
        }
    }
}
