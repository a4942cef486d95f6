// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Each use case wires the data, ml and infra layers together for
// one command. No tensor math and no printing happens here; the
// CLI layer formats whatever a use case returns.

/// Build a cascade and save it as a checkpoint
pub mod init_use_case;

/// Estimate illuminants for images with a saved cascade
pub mod estimate_use_case;

/// Parameter counts and map sizes for a configuration
pub mod summary_use_case;
