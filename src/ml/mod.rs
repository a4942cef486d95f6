// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// All network code lives here, generic over the burn Backend.
//
//   pool.rs        - ceil-mode 3×3/2 max-pool
//   fire.rs        - Fire module (squeeze 1×1, expand 1×1 + 3×3)
//   squeezenet.rs  - SqueezeNet 1.0 / 1.1 and its Fire trunk
//   resnet.rs      - ResNet-18/34 trunk without classifier
//   stage.rs       - one cascade stage: backbone + illuminant head
//   correction.rs  - pooling, normalisation, image correction ops
//   cascade.rs     - the three-stage C4 network
//   inferencer.rs  - checkpoint → estimates for image frames
//
// Reference: Iandola et al. (2016) SqueezeNet
//            He et al. (2016) Deep Residual Learning
//            Hu et al. (2017) FC4: Fully Convolutional Color Constancy
//            Yu et al. (2020) Cascading Convolutional Color Constancy

/// Ceil-mode max pooling
pub mod pool;

/// Fire module
pub mod fire;

/// SqueezeNet classifier and trunk
pub mod squeezenet;

/// Residual trunk for hybrid stages
pub mod resnet;

/// Per-stage illuminant estimator
pub mod stage;

/// Tensor ops shared by the stages
pub mod correction;

/// Cascaded network
pub mod cascade;

/// Inference engine
pub mod inferencer;
