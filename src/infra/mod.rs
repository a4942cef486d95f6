// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Everything that touches the filesystem on behalf of the model:
//
//   checkpoint.rs - cascade weights + config, via CompactRecorder
//   pretrained.rs - ImageNet backbone weights looked up by name
//   report.rs     - CSV log of per-image illuminant estimates

/// Cascade checkpoint saving and loading
pub mod checkpoint;

/// Named pretrained backbone records
pub mod pretrained;

/// Estimate CSV report
pub mod report;
