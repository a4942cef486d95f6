// ============================================================
// Layer 4 - Frame Batcher
// ============================================================
// Stacks equally sized RGB frames into one [N, 3, H, W] tensor
// on the target device. Frames are already planar, so the batch
// is just their data concatenated in order.

use anyhow::{bail, Result};
use burn::{prelude::*, tensor::TensorData};

use crate::domain::image::RgbFrame;

#[derive(Clone, Debug)]
pub struct FrameBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> FrameBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    pub fn batch(&self, frames: &[RgbFrame]) -> Result<Tensor<B, 4>> {
        let Some(first) = frames.first() else {
            bail!("Cannot batch zero frames");
        };
        let (width, height) = (first.width, first.height);
        for frame in frames {
            if (frame.width, frame.height) != (width, height) {
                bail!(
                    "Frame '{}' is {}x{} but the batch is {}x{}",
                    frame.source, frame.width, frame.height, width, height,
                );
            }
            if !frame.is_consistent() {
                bail!("Frame '{}' does not hold three full planes", frame.source);
            }
        }

        let data: Vec<f32> = frames.iter().flat_map(|f| f.data.iter().copied()).collect();
        let shape = [frames.len(), 3, height, width];
        Ok(Tensor::from_data(TensorData::new(data, shape), &self.device))
    }
}
