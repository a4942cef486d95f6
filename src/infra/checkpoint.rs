// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Saves and restores a full cascade using Burn's CompactRecorder.
//
// What gets saved per checkpoint:
//   1. Cascade weights (.mpk)      - every stage's parameters,
//                                    stored at half precision
//   2. cascade_config.json         - version, backbone, stage count
//
// The config is needed to rebuild a module with the right shape
// before the record can be loaded into it; loading fails if the
// two disagree.
//
// File layout:
//   checkpoints/
//     cascade.mpk
//     cascade_config.json

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::ml::cascade::{C4Net, CascadeConfig};

const WEIGHTS_STEM: &str = "cascade";
const CONFIG_FILE: &str = "cascade_config.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// True when both the weights and the config are present.
    pub fn exists(&self) -> bool {
        let weights = self.weights_path();
        self.dir.join(CONFIG_FILE).exists()
            && ["mpk", "mpk.gz"].iter().any(|ext| weights.with_extension(ext).exists())
    }

    /// Write config and weights. Creates the directory if needed.
    pub fn save<B: Backend>(&self, model: &C4Net<B>, cfg: &CascadeConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", self.dir.display()))?;
        self.save_config(cfg)?;

        // Recorder appends its own extension
        let path = self.weights_path();
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved cascade checkpoint to '{}'", path.display());
        Ok(())
    }

    /// Rebuild the cascade described by the saved config and load its weights.
    pub fn load<B: Backend>(&self, device: &B::Device) -> Result<(C4Net<B>, CascadeConfig)> {
        let cfg = self.load_config()?;
        let model: C4Net<B> = cfg.init(device)?;
        let path = self.weights_path();

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you run 'init' first?", path.display())
            })?;

        tracing::info!(
            "Loaded {}-stage cascade ({} backbone, SqueezeNet {})",
            cfg.num_stages, cfg.backbone, cfg.version,
        );
        Ok((model.load_record(record), cfg))
    }

    pub fn save_config(&self, cfg: &CascadeConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_config(&self) -> Result<CascadeConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'init' before 'estimate'.",
                path.display()
            )
        })?;
        let cfg: CascadeConfig = serde_json::from_str(&json)
            .with_context(|| format!("Malformed cascade config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn weights_path(&self) -> PathBuf {
        self.dir.join(WEIGHTS_STEM)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backbone::SqueezeNetVersion;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("c4-checkpoint-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_config_round_trip() {
        let dir = scratch_dir("config");
        fs::create_dir_all(&dir).unwrap();
        let ckpt = CheckpointManager::new(&dir);
        let cfg = CascadeConfig::new().with_version(SqueezeNetVersion::V1_0).with_num_stages(2);
        ckpt.save_config(&cfg).unwrap();

        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.version, SqueezeNetVersion::V1_0);
        assert_eq!(loaded.num_stages, 2);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_weights_round_trip() {
        let device = Default::default();
        let dir = scratch_dir("weights");
        let ckpt = CheckpointManager::new(&dir);
        assert!(!ckpt.exists());

        let cfg = CascadeConfig::new().with_num_stages(1);
        let model = cfg.init::<TestBackend>(&device).unwrap();
        ckpt.save(&model, &cfg).unwrap();
        assert!(ckpt.exists());

        let (loaded, _) = ckpt.load::<TestBackend>(&device).unwrap();
        let x = Tensor::<TestBackend, 4>::ones([1, 3, 64, 64], &device);
        let a = model.forward(x.clone()).stages[0].clone().into_data().to_vec::<f32>().unwrap();
        let b = loaded.forward(x).stages[0].clone().into_data().to_vec::<f32>().unwrap();
        // Half-precision storage only perturbs the estimate slightly
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 2e-2, "{x} vs {y}");
        }
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let device = Default::default();
        let ckpt = CheckpointManager::new(scratch_dir("missing"));
        assert!(ckpt.load::<TestBackend>(&device).is_err());
    }
}
