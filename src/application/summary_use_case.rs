// ============================================================
// Layer 2 - SummaryUseCase
// ============================================================
// Describes a cascade configuration without touching any files:
// parameter count per stage and the feature/illuminant map sizes
// a given input resolution produces.

use anyhow::{anyhow, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::backbone::{BackboneKind, SqueezeNetVersion};
use crate::ml::{cascade::CascadeConfig, inferencer::InferBackend};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub version:    SqueezeNetVersion,
    pub backbone:   BackboneKind,
    pub num_stages: usize,
    pub input_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeSummary {
    pub stage_params: Vec<usize>,
    /// Backbone feature map side for the configured input
    pub features_len: usize,
    /// Illuminant map side, before spatial pooling
    pub output_len:   usize,
}

impl CascadeSummary {
    pub fn total_params(&self) -> usize {
        self.stage_params.iter().sum()
    }
}

pub struct SummaryUseCase {
    config: SummaryConfig,
}

impl SummaryUseCase {
    pub fn new(config: SummaryConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<CascadeSummary> {
        let device = <InferBackend as Backend>::Device::default();
        self.execute_on::<InferBackend>(&device)
    }

    pub fn execute_on<B: Backend>(&self, device: &B::Device) -> Result<CascadeSummary> {
        let cfg = CascadeConfig::new()
            .with_version(self.config.version)
            .with_backbone(self.config.backbone)
            .with_num_stages(self.config.num_stages);
        let model = cfg.init::<B>(device)?;

        let size = self.config.input_size;
        let too_small = || anyhow!("A {size}x{size} input is too small for the {} backbone", cfg.backbone);
        let first = model.stages.first().ok_or_else(|| anyhow!("Cascade has no stages"))?;
        let features_len = first.trunk_len(size).ok_or_else(too_small)?;
        let (output_len, _) = model.output_hw(size, size).ok_or_else(too_small)?;

        Ok(CascadeSummary { stage_params: model.stage_params(), features_len, output_len })
    }
}
