// ============================================================
// Layer 5 - Cascaded Illuminant Network (C4)
// ============================================================
// Stages are chained so each one only has to explain what the
// previous ones missed:
//
//   pred1 = norm(sum(stage1(x)))
//   pred2 = norm(sum(stage2(correct(x, pred1))))
//   pred3 = norm(sum(stage3(correct(x, pred1 ⊙ pred2))))
//
// Every correction starts again from the original input; only
// the illuminant it divides out accumulates.
//
// Reference: Yu et al. (2020) Cascading Convolutional Color Constancy

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::domain::backbone::{BackboneKind, SqueezeNetVersion};
use crate::ml::correction::{correct_image_nonlinear, l2_normalize, spatial_sum};
use crate::ml::stage::{StageNet, StageNetConfig};

#[derive(Config, Debug)]
pub struct CascadeConfig {
    #[config(default = "SqueezeNetVersion::V1_1")]
    pub version:    SqueezeNetVersion,
    #[config(default = "BackboneKind::SqueezeNet")]
    pub backbone:   BackboneKind,
    #[config(default = 3)]
    pub num_stages: usize,
    #[config(default = 0.5)]
    pub dropout:    f64,
}

impl CascadeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_stages == 0 {
            bail!("A cascade needs at least one stage");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("Dropout must be in [0, 1), got {}", self.dropout);
        }
        Ok(())
    }

    pub fn stage_config(&self) -> StageNetConfig {
        StageNetConfig::new()
            .with_version(self.version)
            .with_backbone(self.backbone)
            .with_dropout(self.dropout)
    }

    /// Randomly initialised cascade.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<C4Net<B>> {
        self.validate()?;
        let stage_cfg = self.stage_config();
        let stages = (0..self.num_stages).map(|_| stage_cfg.init(device)).collect();
        Ok(C4Net { stages })
    }

    /// Cascade from prebuilt stages, e.g. ones cut from pretrained backbones.
    pub fn init_with_stages<B: Backend>(&self, stages: Vec<StageNet<B>>) -> Result<C4Net<B>> {
        self.validate()?;
        if stages.len() != self.num_stages {
            bail!("Expected {} stages, got {}", self.num_stages, stages.len());
        }
        Ok(C4Net { stages })
    }
}

#[derive(Module, Debug)]
pub struct C4Net<B: Backend> {
    pub stages: Vec<StageNet<B>>,
}

/// Unit-length illuminant per stage, each [N, 3].
pub struct CascadeOutput<B: Backend> {
    pub stages: Vec<Tensor<B, 2>>,
}

impl<B: Backend> C4Net<B> {
    /// x: [N, 3, H, W] → per-stage predictions, each [N, 3]
    pub fn forward(&self, x: Tensor<B, 4>) -> CascadeOutput<B> {
        let mut preds: Vec<Tensor<B, 2>> = Vec::with_capacity(self.stages.len());
        let mut applied: Option<Tensor<B, 2>> = None;

        for stage in &self.stages {
            let input = match &applied {
                Some(illum) => correct_image_nonlinear(x.clone(), illum.clone()),
                None => x.clone(),
            };
            let pred = l2_normalize(spatial_sum(stage.forward(input)));
            applied = Some(match applied {
                Some(acc) => acc.mul(pred.clone()),
                None => pred.clone(),
            });
            preds.push(pred);
        }

        CascadeOutput { stages: preds }
    }

    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    /// Output map size of every stage for an `h`×`w` input.
    pub fn output_hw(&self, h: usize, w: usize) -> Option<(usize, usize)> {
        self.stages.first()?.output_hw(h, w)
    }

    pub fn stage_params(&self) -> Vec<usize> {
        self.stages.iter().map(|s| s.num_params()).collect()
    }
}
