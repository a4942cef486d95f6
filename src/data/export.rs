// ============================================================
// Layer 4 - Image Export
// ============================================================
// Turns a single-image tensor back into a frame and writes it
// as an 8-bit PNG.

use anyhow::{anyhow, bail, Context, Result};
use burn::prelude::*;
use image::{Rgb, RgbImage};
use std::path::Path;

use crate::domain::image::RgbFrame;

/// [1, 3, H, W] → RgbFrame
pub fn tensor_to_frame<B: Backend>(source: impl Into<String>, t: Tensor<B, 4>) -> Result<RgbFrame> {
    let [n, c, height, width] = t.dims();
    if n != 1 || c != 3 {
        bail!("Expected a [1, 3, H, W] tensor, got [{n}, {c}, {height}, {width}]");
    }
    let data = t
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))?;
    Ok(RgbFrame::new(source, width, height, data))
}

pub fn write_png(frame: &RgbFrame, path: &Path) -> Result<()> {
    if !frame.is_consistent() {
        bail!("Frame '{}' does not hold three full planes", frame.source);
    }
    let (r, g, b) = (frame.plane(0), frame.plane(1), frame.plane(2));
    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    let mut img = RgbImage::new(frame.width as u32, frame.height as u32);
    for (i, px) in img.pixels_mut().enumerate() {
        *px = Rgb([to_u8(r[i]), to_u8(g[i]), to_u8(b[i])]);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    img.save(path)
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    Ok(())
}
