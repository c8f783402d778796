// ============================================================
// Layer 5 — Loss Functions
// ============================================================
// Two training objectives, one per model variant.
//
// Contrastive sample loss (vector output):
//
//   loss_i = -( l2n(true_i) · l2n(pred_i) ) * indicator_i
//
//   i.e. negative cosine similarity, signed by the sample
//   indicator. Positive samples (+1) are pulled towards their
//   target (best value -1), negative samples (-1) are pushed
//   away from theirs (worst value +1). There is no margin.
//
// Multi-hot loss (entity score output):
//
//   loss_i = -Σ_j  t_ij / Σ_k t_ik  *  log_softmax(scores_i)_j
//
//   cross-entropy against the answer set spread uniformly over
//   its members.

use burn::{prelude::*, tensor::activation::log_softmax};

/// Floor applied to squared norms so zero vectors stay finite
const NORM_EPSILON: f64 = 1e-12;

/// Row-wise L2 normalisation of a [batch, dim] tensor.
pub fn l2_normalize<B: Backend>(x: Tensor<B, 2>) -> Tensor<B, 2> {
    let squared = (x.clone() * x.clone()).sum_dim(1);
    x / squared.clamp_min(NORM_EPSILON).sqrt()
}

/// Per-sample contrastive loss — [batch]
pub fn samples_loss<B: Backend>(
    predicted:  Tensor<B, 2>,
    target:     Tensor<B, 2>,
    indicators: Tensor<B, 1>,
) -> Tensor<B, 1> {
    let [batch, _] = predicted.dims();
    let cosine = (l2_normalize(target) * l2_normalize(predicted))
        .sum_dim(1)
        .reshape([batch]);
    cosine.neg() * indicators
}

/// Per-question multi-hot cross-entropy — [batch]
pub fn multi_hot_loss<B: Backend>(scores: Tensor<B, 2>, answers: Tensor<B, 2>) -> Tensor<B, 1> {
    let [batch, _] = scores.dims();
    let counts = answers.clone().sum_dim(1).clamp_min(1.0);
    let target = answers / counts;
    (target * log_softmax(scores, 1))
        .sum_dim(1)
        .reshape([batch])
        .neg()
}
