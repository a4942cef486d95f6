// ============================================================
// Layer 3 - Core Traits
// ============================================================
// The application layer talks to image sources and estimators
// through these traits, never through burn types directly.

use anyhow::Result;
use crate::domain::illuminant::CascadeEstimate;
use crate::domain::image::RgbFrame;

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Anything that can produce decoded RGB frames.
///
/// Implementations:
///   - ImageLoader → files on disk via the `image` crate
pub trait ImageSource {
    fn load_all(&self) -> Result<Vec<RgbFrame>>;
}

// ─── IlluminantEstimator ──────────────────────────────────────────────────────
/// Anything that predicts the scene illuminant of a batch of frames.
///
/// Implementations:
///   - Inferencer → the cascaded network
pub trait IlluminantEstimator {
    /// One estimate per frame, in input order.
    fn estimate(&self, frames: &[RgbFrame]) -> Result<Vec<CascadeEstimate>>;
}
