// ============================================================
// Layer 5 - Inferencer
// ============================================================
// Loads a cascade checkpoint onto the inference backend and turns
// frames into per-stage illuminant estimates.
use anyhow::{anyhow, bail, Result};
use burn::prelude::*;

use crate::data::{batcher::FrameBatcher, export::tensor_to_frame};
use crate::domain::illuminant::{CascadeEstimate, Illuminant};
use crate::domain::image::RgbFrame;
use crate::domain::traits::IlluminantEstimator;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::cascade::{C4Net, CascadeConfig};
use crate::ml::correction::correct_image_nonlinear;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;
#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

pub struct Inferencer<B: Backend = InferBackend> {
    model:      C4Net<B>,
    config:     CascadeConfig,
    batch_size: usize,
    device:     B::Device,
}

impl Inferencer<InferBackend> {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, batch_size: usize) -> Result<Self> {
        let device = <InferBackend as Backend>::Device::default();
        let (model, config) = ckpt_manager.load::<InferBackend>(&device)?;
        Self::new(model, config, batch_size, device)
    }
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: C4Net<B>, config: CascadeConfig, batch_size: usize, device: B::Device) -> Result<Self> {
        if batch_size == 0 {
            bail!("Batch size must be at least 1");
        }
        if model.num_stages() != config.num_stages {
            bail!(
                "Checkpoint holds {} stages but its config says {}",
                model.num_stages(), config.num_stages,
            );
        }
        if let Some(stage) = model.stages.iter().find(|s| s.backbone() != config.backbone) {
            bail!(
                "Checkpoint stage uses a {} backbone but its config says {}",
                stage.backbone(), config.backbone,
            );
        }
        Ok(Self { model, config, batch_size, device })
    }

    /// Reject frames too small to survive the stage downsampling.
    pub fn check_frame(&self, frame: &RgbFrame) -> Result<(usize, usize)> {
        self.model
            .output_hw(frame.height, frame.width)
            .ok_or_else(|| {
                anyhow!(
                    "Image '{}' ({}x{}) is too small for the {} backbone",
                    frame.source, frame.width, frame.height, self.config.backbone,
                )
            })
    }

    fn estimate_batch(&self, frames: &[RgbFrame]) -> Result<Vec<CascadeEstimate>> {
        let batch = FrameBatcher::<B>::new(self.device.clone()).batch(frames)?;
        let output = self.model.forward(batch);

        let mut per_stage = Vec::with_capacity(output.stages.len());
        for pred in output.stages {
            let values = pred
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| anyhow!("Cannot read stage prediction: {e:?}"))?;
            per_stage.push(values);
        }

        let estimates = frames
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let stages = per_stage
                    .iter()
                    .filter_map(|values| Illuminant::from_slice(&values[3 * i..3 * i + 3]))
                    .collect();
                CascadeEstimate::new(frame.source.clone(), stages)
            })
            .collect();
        Ok(estimates)
    }

    /// Divide `illuminant` out of a frame at its own resolution.
    pub fn correct(&self, frame: &RgbFrame, illuminant: &Illuminant) -> Result<RgbFrame> {
        let img = FrameBatcher::<B>::new(self.device.clone()).batch(std::slice::from_ref(frame))?;
        let illum = Tensor::<B, 1>::from_floats(illuminant.to_array(), &self.device).reshape([1, 3]);
        tensor_to_frame(frame.source.clone(), correct_image_nonlinear(img, illum))
    }
}

impl<B: Backend> IlluminantEstimator for Inferencer<B> {
    fn estimate(&self, frames: &[RgbFrame]) -> Result<Vec<CascadeEstimate>> {
        for frame in frames {
            let (h, w) = self.check_frame(frame)?;
            tracing::debug!("'{}' → {}x{} illuminant map", frame.source, w, h);
        }

        let mut estimates = Vec::with_capacity(frames.len());
        for chunk in frames.chunks(self.batch_size) {
            estimates.extend(self.estimate_batch(chunk)?);
        }
        Ok(estimates)
    }
}
