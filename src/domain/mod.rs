// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types describing what the system talks about:
// backbones, illuminants, images. No burn types and no file IO
// live here, so everything in this layer is testable without a
// device.

/// SqueezeNet versions, residual depths, backbone choice
pub mod backbone;

/// Illuminant colors and per-image cascade estimates
pub mod illuminant;

/// Decoded RGB frames in planar layout
pub mod image;

/// Abstractions implemented by the data and ml layers
pub mod traits;
