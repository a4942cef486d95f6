// ============================================================
// Layer 2 - InitUseCase
// ============================================================
// Builds a cascade and writes it out as a checkpoint:
//
//   Step 1: Validate the cascade config      (Layer 5 - ml)
//   Step 2: Build one stage per cascade step (Layer 5 - ml)
//           - from pretrained backbones when a weights dir is set
//           - randomly initialised otherwise
//   Step 3: Save weights + config            (Layer 6 - infra)

use anyhow::Result;
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::backbone::{BackboneKind, SqueezeNetVersion};
use crate::infra::{checkpoint::CheckpointManager, pretrained::PretrainedStore};
use crate::ml::{
    cascade::{C4Net, CascadeConfig},
    inferencer::InferBackend,
    resnet::ResNetTrunkConfig,
    squeezenet::SqueezeNetConfig,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    pub checkpoint_dir: String,
    /// Directory of converted ImageNet records, see `PretrainedStore`
    pub weights_dir:    Option<String>,
    pub version:        SqueezeNetVersion,
    pub backbone:       BackboneKind,
    pub num_stages:     usize,
    pub dropout:        f64,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: "checkpoints".to_string(),
            weights_dir:    None,
            version:        SqueezeNetVersion::V1_1,
            backbone:       BackboneKind::SqueezeNet,
            num_stages:     3,
            dropout:        0.5,
        }
    }
}

impl InitConfig {
    pub fn cascade(&self) -> CascadeConfig {
        CascadeConfig::new()
            .with_version(self.version)
            .with_backbone(self.backbone)
            .with_num_stages(self.num_stages)
            .with_dropout(self.dropout)
    }
}

pub struct InitUseCase {
    config: InitConfig,
}

impl InitUseCase {
    pub fn new(config: InitConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<CascadeConfig> {
        let device = <InferBackend as Backend>::Device::default();
        self.execute_on::<InferBackend>(&device)
    }

    pub fn execute_on<B: Backend>(&self, device: &B::Device) -> Result<CascadeConfig> {
        let cfg = self.config.cascade();
        let model = self.build::<B>(&cfg, device)?;
        tracing::info!(
            "Built {}-stage cascade, {} parameters per stage",
            model.num_stages(),
            model.stage_params().first().copied().unwrap_or(0),
        );

        let ckpt = CheckpointManager::new(&self.config.checkpoint_dir);
        ckpt.save(&model, &cfg)?;
        tracing::info!("Checkpoint written to '{}'", self.config.checkpoint_dir);
        Ok(cfg)
    }

    fn build<B: Backend>(&self, cfg: &CascadeConfig, device: &B::Device) -> Result<C4Net<B>> {
        cfg.validate()?;
        let Some(weights_dir) = &self.config.weights_dir else {
            return cfg.init(device);
        };

        let store = PretrainedStore::new(weights_dir);
        let stage_cfg = cfg.stage_config();
        let mut stages = Vec::with_capacity(cfg.num_stages);
        // Every stage starts from its own copy of the ImageNet weights
        for _ in 0..cfg.num_stages {
            let stage = match cfg.backbone {
                BackboneKind::SqueezeNet => {
                    let squeezenet = SqueezeNetConfig::new().with_version(cfg.version).init(device);
                    let squeezenet = store.load::<B, _>(cfg.version.weights_name(), squeezenet, device)?;
                    stage_cfg.init_from_squeezenet(squeezenet, device)
                }
                BackboneKind::Hybrid(depth) => {
                    let resnet = ResNetTrunkConfig::new().with_depth(depth).init(device);
                    let resnet = store.load::<B, _>(depth.weights_name(), resnet, device)?;
                    stage_cfg.init_from_resnet(resnet, device)
                }
            };
            stages.push(stage);
        }
        cfg.init_with_stages(stages)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use std::path::PathBuf;

    type TestBackend = NdArray;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("c4-init-{name}-{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        dir
    }

    #[test]
    fn test_random_init_writes_checkpoint() {
        let dir = scratch_dir("random");
        let config = InitConfig {
            checkpoint_dir: dir.display().to_string(),
            num_stages: 2,
            ..InitConfig::default()
        };
        let cfg = InitUseCase::new(config).execute_on::<TestBackend>(&Default::default()).unwrap();

        assert_eq!(cfg.num_stages, 2);
        let ckpt = CheckpointManager::new(&dir);
        assert!(ckpt.exists());
        assert_eq!(ckpt.load_config().unwrap().num_stages, 2);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_pretrained_init_uses_store() {
        let device = Default::default();
        let weights = scratch_dir("weights");
        let ckpt_dir = scratch_dir("pretrained");

        let squeezenet = SqueezeNetConfig::new().init::<TestBackend>(&device);
        PretrainedStore::new(&weights).save::<TestBackend, _>("squeezenet1_1", &squeezenet).unwrap();

        let config = InitConfig {
            checkpoint_dir: ckpt_dir.display().to_string(),
            weights_dir: Some(weights.display().to_string()),
            num_stages: 1,
            ..InitConfig::default()
        };
        InitUseCase::new(config).execute_on::<TestBackend>(&device).unwrap();
        assert!(CheckpointManager::new(&ckpt_dir).exists());

        std::fs::remove_dir_all(&weights).ok();
        std::fs::remove_dir_all(&ckpt_dir).ok();
    }

    #[test]
    fn test_missing_pretrained_weights_fail() {
        let config = InitConfig {
            checkpoint_dir: scratch_dir("never").display().to_string(),
            weights_dir: Some(scratch_dir("empty-weights").display().to_string()),
            num_stages: 1,
            ..InitConfig::default()
        };
        let err = InitUseCase::new(config)
            .execute_on::<TestBackend>(&Default::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("squeezenet1_1"));
    }
}
