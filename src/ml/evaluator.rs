// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Loads the best checkpoint, runs every test question through the
// model and retrieves the top-N entities:
//
//   sample variant    : cosine similarity between the predicted
//                       vector and every KG entity embedding
//   multi-hot variant : the model's own projection scores
//
// This is a brute-force scan over the whole entity table, one
// test batch at a time. A question is a hit when any of its
// ground-truth answers is among its top-N entities.

use std::collections::HashSet;
use std::fmt;

use anyhow::{Context, Result};
use burn::{data::dataloader::DataLoaderBuilder, prelude::*};

use crate::application::knowledge_base::KnowledgeBase;
use crate::application::train_use_case::KbqaConfig;
use crate::data::{batcher::QuestionBatcher, dataset::{KbqaDataset, QuestionItem}};
use crate::domain::embedding_table::PAD_INDEX;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::loss::l2_normalize;
use crate::ml::model::KbqaModel;
use crate::ml::{device, InferBackend};

/// Hit count over a test set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitReport {
    pub top_n:     usize,
    pub hits:      usize,
    pub questions: usize,
}

impl HitReport {
    pub fn hit_rate(&self) -> f64 {
        if self.questions == 0 { 0.0 } else { self.hits as f64 / self.questions as f64 }
    }
}

impl fmt::Display for HitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hits in top {}: {}/{} ({:.1}%)",
            self.top_n,
            self.hits,
            self.questions,
            self.hit_rate() * 100.0
        )
    }
}

pub struct Evaluator {
    model:  KbqaModel<InferBackend>,
    /// L2-normalised entity matrix, transposed — [kg_dim, rows]
    entities_t: Tensor<InferBackend, 2>,
    num_classes: usize,
    batch_size: usize,
    device: <InferBackend as Backend>::Device,
}

impl Evaluator {
    pub fn from_checkpoint(ckpt: &CheckpointManager, cfg: &KbqaConfig, kb: &KnowledgeBase) -> Result<Self> {
        let device = device();
        let model: KbqaModel<InferBackend> = cfg.model_config(kb).init(&kb.tables(), &device);
        let model = ckpt.load_best(model, &device)?;
        tracing::info!("Model loaded from checkpoint '{}'", ckpt.dir().display());
        Ok(Self::new(model, kb, cfg.batch_size, device))
    }

    pub fn new(
        model:      KbqaModel<InferBackend>,
        kb:         &KnowledgeBase,
        batch_size: usize,
        device:     <InferBackend as Backend>::Device,
    ) -> Self {
        let entities = Tensor::<InferBackend, 2>::from_data(
            TensorData::new(kb.entities.matrix().to_vec(), [kb.entities.rows(), kb.entities.dim()]),
            &device,
        );
        Self {
            model,
            entities_t: l2_normalize(entities).transpose(),
            num_classes: kb.entities.rows(),
            batch_size: batch_size.max(1),
            device,
        }
    }

    /// Top-N entity indices for every question, in input order.
    pub fn rank(&self, items: Vec<QuestionItem>, top_n: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        let loader = DataLoaderBuilder::new(QuestionBatcher::<InferBackend>::new(self.device.clone(), self.num_classes))
            .batch_size(self.batch_size)
            .build(KbqaDataset::new(items));

        let mut ranked = Vec::new();
        for batch in loader.iter() {
            let output = self.model.forward(batch.questions, batch.last_step);
            let scores = if self.model.scores_entities() {
                output
            } else {
                cosine_scores(output, self.entities_t.clone())
            };

            let [rows, cols] = scores.dims();
            let scores: Vec<f32> = scores
                .into_data()
                .convert::<f32>()
                .to_vec()
                .map_err(|e| anyhow::anyhow!("Cannot read scores: {e:?}"))
                .context("Retrieval failed")?;

            for (row, answers) in batch.answer_indices.into_iter().enumerate().take(rows) {
                let top = top_n_indices(&scores[row * cols..(row + 1) * cols], top_n);
                ranked.push((answers, top));
            }
        }
        Ok(ranked)
    }

    pub fn evaluate(&self, items: Vec<QuestionItem>, top_n: usize) -> Result<HitReport> {
        let ranked = self.rank(items, top_n)?;
        let hits = ranked.iter().filter(|(answers, top)| is_hit(answers, top)).count();
        Ok(HitReport { top_n, hits, questions: ranked.len() })
    }
}

/// Cosine similarity of every prediction with every entity.
///
/// `predicted` is [batch, kg_dim]; `entities_t` is the transposed,
/// already normalised entity matrix [kg_dim, rows].
pub fn cosine_scores<B: Backend>(predicted: Tensor<B, 2>, entities_t: Tensor<B, 2>) -> Tensor<B, 2> {
    l2_normalize(predicted).matmul(entities_t)
}

/// Indices of the `n` highest scores, best first. The padding
/// column is never returned and NaN scores rank last.
pub fn top_n_indices(scores: &[f32], n: usize) -> Vec<usize> {
    let key = |i: usize| if scores[i].is_nan() { f32::NEG_INFINITY } else { scores[i] };
    let mut order: Vec<usize> = (0..scores.len()).filter(|&i| i != PAD_INDEX).collect();
    order.sort_by(|&a, &b| key(b).total_cmp(&key(a)));
    order.truncate(n);
    order
}

/// True when the two index sets intersect.
pub fn is_hit(answers: &[usize], top: &[usize]) -> bool {
    let top: HashSet<usize> = top.iter().copied().collect();
    answers.iter().any(|a| top.contains(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_n_skips_padding_and_orders() {
        let scores = [9.0, 0.1, 0.7, -0.3, 0.5];
        assert_eq!(top_n_indices(&scores, 3), vec![2, 4, 1]);
        assert_eq!(top_n_indices(&scores, 10).len(), 4);
    }

    #[test]
    fn test_top_n_ranks_nan_last() {
        let scores = [0.0, f32::NAN, 0.2, 0.1];
        assert_eq!(top_n_indices(&scores, 1), vec![2]);
        assert_eq!(top_n_indices(&scores, 3), vec![2, 3, 1]);
    }

    // ─── Cosine retrieval ─────────────────────────────────────────────────────

    use crate::domain::embedding_table::EmbeddingTable;

    type TestBackend = burn::backend::NdArray;

    /// Padding row, then four entities in 2-d:
    ///   1 → along x, 2 → along y, 3 → long diagonal, 4 → along -x
    fn entity_table() -> EmbeddingTable {
        EmbeddingTable::from_entries(2, vec![
            ("e:x",    vec![1.0, 0.0]),
            ("e:y",    vec![0.0, 1.0]),
            ("e:diag", vec![10.0, 10.0]),
            ("e:-x",   vec![-1.0, 0.0]),
        ])
    }

    fn ranked(predicted: Vec<f32>, rows: usize, n: usize) -> Vec<Vec<usize>> {
        let device = Default::default();
        let table  = entity_table();
        let entities = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(table.matrix().to_vec(), [table.rows(), table.dim()]),
            &device,
        );
        let predicted = Tensor::<TestBackend, 2>::from_data(TensorData::new(predicted, [rows, 2]), &device);

        let scores = cosine_scores(predicted, l2_normalize(entities).transpose());
        let [_, cols] = scores.dims();
        let scores: Vec<f32> = scores.into_data().to_vec().unwrap();
        scores.chunks(cols).map(|row| top_n_indices(row, n)).collect()
    }

    #[test]
    fn test_nearest_entity_ranks_first() {
        // Slightly off the x axis: e:x first, e:-x never in the top 2
        let top = ranked(vec![1.0, 0.1, 0.2, 3.0], 2, 2);
        assert_eq!(top[0], vec![1, 3]);
        assert_eq!(top[1], vec![2, 3]);
        assert!(!top[0].contains(&4));
    }

    #[test]
    fn test_ranking_ignores_entity_norm() {
        // The diagonal entity has by far the largest dot product with
        // this prediction, but e:x is the closer direction
        let top = ranked(vec![5.0, 1.0], 1, 1);
        assert_eq!(top[0], vec![1]);
    }

    #[test]
    fn test_top_one_excludes_wrong_entity_in_hit_count() {
        let top = ranked(vec![-2.0, 0.1], 1, 1);
        assert_eq!(top[0], vec![4]);
        assert!(is_hit(&[4], &top[0]));
        assert!(!is_hit(&[1], &top[0]));
    }

    #[test]
    fn test_hit_requires_intersection() {
        assert!(is_hit(&[4, 7], &[1, 7, 9]));
        assert!(!is_hit(&[4], &[1, 2]));
        assert!(!is_hit(&[], &[1, 2]));
    }

    #[test]
    fn test_report_rate() {
        let r = HitReport { top_n: 5, hits: 3, questions: 4 };
        assert!((r.hit_rate() - 0.75).abs() < 1e-12);
        assert_eq!(r.to_string(), "Hits in top 5: 3/4 (75.0%)");
        assert_eq!(HitReport { top_n: 5, hits: 0, questions: 0 }.hit_rate(), 0.0);
    }
}
