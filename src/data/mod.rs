// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// From image files to device tensors and back:
//
//   image files
//       │
//       ▼
//   ImageLoader     → decode, optional square resize, planar f32
//       │
//       ▼
//   FrameBatcher    → [N, 3, H, W] tensor on the device
//       │
//       ▼
//   (cascade)
//       │
//       ▼
//   export          → corrected tensor back to PNG

/// Decodes image files into RGB frames
pub mod loader;

/// Stacks frames into batch tensors
pub mod batcher;

/// Writes frames and tensors back out as images
pub mod export;
