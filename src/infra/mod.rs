// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by the training and test flows:
//
//   checkpoint.rs — best-model weights (Burn CompactRecorder),
//                   the best-epoch pointer, and the run config
//                   as JSON so `test` can rebuild the model.
//
//   metrics.rs    — per-epoch loss rows appended to a CSV file.
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
