// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model code lives here.
//
//   model.rs     — question encoder: pre-trained word embedding,
//                  optional entity-linking map, stacked GRUs whose
//                  last layer has the KG embedding size, and the
//                  fixed KG projection for entity scoring
//
//   loss.rs      — contrastive sample loss and multi-hot loss
//
//   trainer.rs   — Adam training loop with validation,
//                  best-only checkpointing and early stopping
//
//   evaluator.rs — top-N nearest entity retrieval and hit count
//
// Backend: NdArray on the CPU by default, Wgpu with the `wgpu`
// feature. Training wraps it in Autodiff.
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Question encoder and KG projection
pub mod model;

/// Training objectives
pub mod loss;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Retrieval and hit-rate evaluation
pub mod evaluator;

use burn::prelude::Backend;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

/// Default device of the selected backend
pub fn device() -> <InferBackend as Backend>::Device {
    Default::default()
}
