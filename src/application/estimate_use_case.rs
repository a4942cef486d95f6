// ============================================================
// Layer 2 - EstimateUseCase
// ============================================================
// Runs a saved cascade over a set of images:
//   1. Load and resize frames          (Layer 4 - data)
//   2. Estimate per-stage illuminants  (Layer 5 - ml)
//   3. Optionally log them to CSV      (Layer 6 - infra)
//   4. Optionally write full-resolution corrected PNGs

use anyhow::Result;
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::data::{export::write_png, loader::ImageLoader};
use crate::domain::illuminant::CascadeEstimate;
use crate::domain::traits::{IlluminantEstimator, ImageSource};
use crate::infra::{checkpoint::CheckpointManager, report::EstimateReport};
use crate::ml::inferencer::{InferBackend, Inferencer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateConfig {
    pub checkpoint_dir: String,
    /// Image files or directories of images
    pub inputs:         Vec<String>,
    pub input_size:     u32,
    pub batch_size:     usize,
    pub report_csv:     Option<String>,
    pub corrected_dir:  Option<String>,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: "checkpoints".to_string(),
            inputs:         Vec::new(),
            input_size:     256,
            batch_size:     8,
            report_csv:     None,
            corrected_dir:  None,
        }
    }
}

pub struct EstimateUseCase<B: Backend = InferBackend> {
    config:     EstimateConfig,
    inferencer: Inferencer<B>,
}

impl EstimateUseCase<InferBackend> {
    pub fn new(config: EstimateConfig) -> Result<Self> {
        let ckpt = CheckpointManager::new(&config.checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt, config.batch_size)?;
        Ok(Self::with_inferencer(config, inferencer))
    }
}

impl<B: Backend> EstimateUseCase<B> {
    pub fn with_inferencer(config: EstimateConfig, inferencer: Inferencer<B>) -> Self {
        Self { config, inferencer }
    }

    pub fn execute(&self) -> Result<Vec<CascadeEstimate>> {
        let inputs: Vec<PathBuf> = self.config.inputs.iter().map(PathBuf::from).collect();
        let loader = ImageLoader::resized(inputs.clone(), self.config.input_size);
        let frames = loader.load_all()?;
        let estimates = self.inferencer.estimate(&frames)?;

        if let Some(csv) = &self.config.report_csv {
            let report = EstimateReport::new(csv)?;
            for estimate in &estimates {
                report.log(estimate)?;
            }
            tracing::info!("Estimates written to '{}'", report.csv_path().display());
        }

        if let Some(dir) = &self.config.corrected_dir {
            self.write_corrected(&ImageLoader::native(inputs), &estimates, Path::new(dir))?;
        }
        Ok(estimates)
    }

    fn write_corrected(&self, loader: &ImageLoader, estimates: &[CascadeEstimate], dir: &Path) -> Result<()> {
        let names = corrected_file_names(estimates.iter().map(|e| e.source.as_str()));
        for (estimate, name) in estimates.iter().zip(names) {
            let source = Path::new(&estimate.source);
            let frame = loader.load(source)?;
            let corrected = self.inferencer.correct(&frame, &estimate.combined())?;

            let out = dir.join(name);
            write_png(&corrected, &out)?;
            tracing::debug!("Wrote '{}'", out.display());
        }
        tracing::info!("{} corrected images written to '{}'", estimates.len(), dir.display());
        Ok(())
    }
}

/// `{stem}_corrected.png` per source. Sources sharing a stem get
/// `_2`, `_3`, ... so no output overwrites another.
fn corrected_file_names<'a>(sources: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken = HashSet::new();
    sources
        .into_iter()
        .map(|source| {
            let stem = Path::new(source).file_stem().and_then(|s| s.to_str()).unwrap_or("image");
            let mut name = format!("{stem}_corrected.png");
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{stem}_{n}_corrected.png");
                n += 1;
            }
            if n > 2 {
                tracing::warn!("'{source}' shares its name with another input, writing '{name}'");
            }
            name
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::cascade::CascadeConfig;
    use burn::backend::NdArray;
    use image::{Rgb, RgbImage};

    type TestBackend = NdArray;

    fn small_inferencer(num_stages: usize) -> Inferencer<TestBackend> {
        let device = Default::default();
        let cascade = CascadeConfig::new().with_num_stages(num_stages);
        let model = cascade.init::<TestBackend>(&device).unwrap();
        Inferencer::new(model, cascade, 4, device).unwrap()
    }

    #[test]
    fn test_estimate_with_report_and_corrected_images() {
        let dir = std::env::temp_dir().join(format!("c4-estimate-{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        let images = dir.join("images");
        std::fs::create_dir_all(&images).unwrap();
        RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, 90]))
            .save(images.join("scene.png"))
            .unwrap();

        let inferencer = small_inferencer(2);

        let csv = dir.join("estimates.csv");
        let corrected = dir.join("corrected");
        let config = EstimateConfig {
            inputs: vec![images.display().to_string()],
            input_size: 64,
            report_csv: Some(csv.display().to_string()),
            corrected_dir: Some(corrected.display().to_string()),
            ..EstimateConfig::default()
        };
        let estimates = EstimateUseCase::with_inferencer(config, inferencer).execute().unwrap();

        assert_eq!(estimates.len(), 1);
        assert_eq!(estimates[0].stages.len(), 2);

        // header + two stages + combined
        let report = std::fs::read_to_string(&csv).unwrap();
        assert_eq!(report.lines().count(), 4);

        let out = image::open(corrected.join("scene_corrected.png")).unwrap();
        assert_eq!((out.width(), out.height()), (40, 30));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrected_names_are_unique() {
        let names = corrected_file_names(["a/scene.png", "b/scene.jpg", "c/other.png", "d/scene.png"]);
        assert_eq!(
            names,
            vec!["scene_corrected.png", "scene_2_corrected.png", "other_corrected.png", "scene_3_corrected.png"],
        );
    }

    #[test]
    fn test_same_stem_in_two_dirs_writes_two_files() {
        let dir = std::env::temp_dir().join(format!("c4-estimate-dup-{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        let (day, night) = (dir.join("day"), dir.join("night"));
        for (sub, blue) in [(&day, 200u8), (&night, 40u8)] {
            std::fs::create_dir_all(sub).unwrap();
            RgbImage::from_fn(24, 20, |x, _| Rgb([(x * 10) as u8, 120, blue]))
                .save(sub.join("scene.png"))
                .unwrap();
        }

        let corrected = dir.join("corrected");
        let config = EstimateConfig {
            inputs: vec![day.display().to_string(), night.display().to_string()],
            input_size: 64,
            corrected_dir: Some(corrected.display().to_string()),
            ..EstimateConfig::default()
        };
        let estimates = EstimateUseCase::with_inferencer(config, small_inferencer(1)).execute().unwrap();

        assert_eq!(estimates.len(), 2);
        assert!(corrected.join("scene_corrected.png").exists());
        assert!(corrected.join("scene_2_corrected.png").exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
