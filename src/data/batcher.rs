// ============================================================
// Layer 4 — Batchers
// ============================================================
// Implements Burn's Batcher trait for the two item types:
//
//   SampleBatcher   : Vec<SampleItem>   → SampleBatch
//   QuestionBatcher : Vec<QuestionItem> → QuestionBatch
//
// Questions arrive unpadded, so each batch is padded to its own
// longest question (post-padding with 0). Alongside the token ids
// the batcher builds a `last_step` mask of shape [batch, seq_len]
// with a single 1.0 at each question's final real token. The
// model uses it to read the recurrent output at that step, which
// is what masking the padded tail would give. An empty question
// gets an all-zero row.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::{QuestionItem, SampleItem};
use crate::data::preprocessor::pad_sequences;
use crate::domain::embedding_table::PAD_INDEX;

/// Padded question ids and their last-step mask.
fn question_tensors<B: Backend>(
    questions: &[&[u32]],
    device:    &B::Device,
) -> (Tensor<B, 2, Int>, Tensor<B, 2>) {
    let batch_size         = questions.len();
    let (padded, seq_len)  = pad_sequences(questions, PAD_INDEX as u32);

    let ids_flat: Vec<i64> = padded
        .iter()
        .flat_map(|row| row.iter().map(|&t| t as i64))
        .collect();

    let mut mask = vec![0.0f32; batch_size * seq_len];
    for (row, q) in questions.iter().enumerate() {
        if !q.is_empty() {
            mask[row * seq_len + q.len() - 1] = 1.0;
        }
    }

    let ids = Tensor::<B, 2, Int>::from_data(
        TensorData::new(ids_flat, [batch_size, seq_len]),
        device,
    );
    let last_step = Tensor::<B, 2>::from_data(
        TensorData::new(mask, [batch_size, seq_len]),
        device,
    );
    (ids, last_step)
}

// ─── SampleBatch ──────────────────────────────────────────────────────────────
/// A batch of contrastive samples.
#[derive(Debug, Clone)]
pub struct SampleBatch<B: Backend> {
    /// Token ids — [batch_size, seq_len]
    pub questions: Tensor<B, 2, Int>,

    /// One-hot position of each question's last token — [batch_size, seq_len]
    pub last_step: Tensor<B, 2>,

    /// Target entity vectors — [batch_size, kg_dim]
    pub targets: Tensor<B, 2>,

    /// +1 for positive samples, -1 for negatives — [batch_size]
    pub indicators: Tensor<B, 1>,
}

#[derive(Clone, Debug)]
pub struct SampleBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SampleBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<SampleItem, SampleBatch<B>> for SampleBatcher<B> {
    fn batch(&self, items: Vec<SampleItem>) -> SampleBatch<B> {
        let batch_size = items.len();
        let kg_dim     = items.first().map(|i| i.target.len()).unwrap_or(0);

        let questions: Vec<&[u32]> = items.iter().map(|i| i.question.as_slice()).collect();
        let (questions, last_step) = question_tensors::<B>(&questions, &self.device);

        let targets_flat: Vec<f32> = items.iter().flat_map(|i| i.target.iter().copied()).collect();
        let indicators:   Vec<f32> = items.iter().map(|i| i.indicator).collect();

        let targets = Tensor::<B, 2>::from_data(
            TensorData::new(targets_flat, [batch_size, kg_dim]),
            &self.device,
        );
        let indicators = Tensor::<B, 1>::from_data(
            TensorData::new(indicators, [batch_size]),
            &self.device,
        );

        SampleBatch { questions, last_step, targets, indicators }
    }
}

// ─── QuestionBatch ────────────────────────────────────────────────────────────
/// A batch of questions with their answer sets.
#[derive(Debug, Clone)]
pub struct QuestionBatch<B: Backend> {
    /// Token ids — [batch_size, seq_len]
    pub questions: Tensor<B, 2, Int>,

    /// One-hot position of each question's last token — [batch_size, seq_len]
    pub last_step: Tensor<B, 2>,

    /// Multi-hot answers over all table rows — [batch_size, num_entities + 1]
    pub answers: Tensor<B, 2>,

    /// Ground-truth answer indices, kept for retrieval metrics
    pub answer_indices: Vec<Vec<usize>>,
}

#[derive(Clone, Debug)]
pub struct QuestionBatcher<B: Backend> {
    pub device: B::Device,
    /// Width of the multi-hot vector (entity table rows incl. padding)
    pub num_classes: usize,
}

impl<B: Backend> QuestionBatcher<B> {
    pub fn new(device: B::Device, num_classes: usize) -> Self {
        Self { device, num_classes }
    }
}

impl<B: Backend> Batcher<QuestionItem, QuestionBatch<B>> for QuestionBatcher<B> {
    fn batch(&self, items: Vec<QuestionItem>) -> QuestionBatch<B> {
        let batch_size = items.len();

        let questions: Vec<&[u32]> = items.iter().map(|i| i.question.as_slice()).collect();
        let (questions, last_step) = question_tensors::<B>(&questions, &self.device);

        let mut multi_hot = vec![0.0f32; batch_size * self.num_classes];
        for (row, item) in items.iter().enumerate() {
            for &a in item.answers.iter().filter(|&&a| a < self.num_classes) {
                multi_hot[row * self.num_classes + a] = 1.0;
            }
        }
        let answers = Tensor::<B, 2>::from_data(
            TensorData::new(multi_hot, [batch_size, self.num_classes]),
            &self.device,
        );

        let answer_indices = items.into_iter().map(|i| i.answers).collect();

        QuestionBatch { questions, last_step, answers, answer_indices }
    }
}
