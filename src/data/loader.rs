// ============================================================
// Layer 4 - Image Loader
// ============================================================
// Decodes image files with the `image` crate and converts them
// to planar RGB frames in [0, 1]. Inputs may be individual files
// or directories (scanned one level deep, sorted by name).
//
// When an input size is set every frame is resized to a square
// of that size so frames can be stacked into one batch; without
// it frames keep their native resolution (used for writing
// corrected full-size images).

use anyhow::{bail, Context, Result};
use image::{imageops::FilterType, DynamicImage};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::image::RgbFrame;
use crate::domain::traits::ImageSource;

const EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

pub struct ImageLoader {
    inputs: Vec<PathBuf>,
    size:   Option<u32>,
}

impl ImageLoader {
    /// Loader resizing every frame to `size`×`size`.
    pub fn resized(inputs: Vec<PathBuf>, size: u32) -> Self {
        Self { inputs, size: Some(size) }
    }

    /// Loader keeping native resolution.
    pub fn native(inputs: Vec<PathBuf>) -> Self {
        Self { inputs, size: None }
    }

    /// Expand directories into the image files they contain.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for input in &self.inputs {
            if input.is_dir() {
                let mut found: Vec<PathBuf> = fs::read_dir(input)
                    .with_context(|| format!("Cannot read directory '{}'", input.display()))?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && is_image(p))
                    .collect();
                found.sort();
                files.extend(found);
            } else {
                files.push(input.clone());
            }
        }
        Ok(files)
    }

    pub fn load(&self, path: &Path) -> Result<RgbFrame> {
        let img = image::open(path)
            .with_context(|| format!("Cannot decode image '{}'", path.display()))?;
        let img = match self.size {
            Some(size) => img.resize_exact(size, size, FilterType::Triangle),
            None => img,
        };
        Ok(to_frame(path.display().to_string(), &img))
    }
}

impl ImageSource for ImageLoader {
    fn load_all(&self) -> Result<Vec<RgbFrame>> {
        let files = self.files()?;
        if files.is_empty() {
            bail!("No images found in the given inputs");
        }
        let frames = files
            .iter()
            .map(|p| self.load(p))
            .collect::<Result<Vec<_>>>()?;
        tracing::info!("Loaded {} images", frames.len());
        Ok(frames)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Interleaved 8/16-bit or float pixels → planar f32 in [0, 1].
pub fn to_frame(source: String, img: &DynamicImage) -> RgbFrame {
    let rgb = img.to_rgb32f();
    let (width, height) = rgb.dimensions();
    let (width, height) = (width as usize, height as usize);
    let plane = width * height;

    let mut data = vec![0.0f32; 3 * plane];
    for (i, px) in rgb.pixels().enumerate() {
        for c in 0..3 {
            data[c * plane + i] = px.0[c].clamp(0.0, 1.0);
        }
    }
    RgbFrame::new(source, width, height, data)
}
