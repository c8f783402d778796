// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and Adam.
//
// The loop is shared by both model variants. What differs is
// the batch type and its loss, abstracted by `TrainBatch`:
//   SampleBatch   → contrastive sample loss
//   QuestionBatch → multi-hot answer loss
//
// Per epoch:
//   1. forward + backward + Adam step over every training batch
//   2. model.valid() (no autodiff, no dropout) over validation
//   3. log, append to metrics.csv
//   4. save the model if validation loss improved
//   5. stop once `patience` epochs pass without improvement
//
// With no validation data the training loss is monitored instead.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};
use rand::{rngs::StdRng, SeedableRng};

use crate::application::knowledge_base::KnowledgeBase;
use crate::application::train_use_case::{KbqaConfig, ModelVariant};
use crate::data::{
    batcher::{QuestionBatch, QuestionBatcher, SampleBatch, SampleBatcher},
    dataset::KbqaDataset,
    encoder::DatasetEncoder,
    splitter::split_train_val,
};
use crate::domain::qa_record::QaRecord;
use crate::infra::checkpoint::{BestEpoch, CheckpointManager};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::KbqaModel;
use crate::ml::{device, InferBackend, TrainBackend};

/// A batch that knows how to compute its training loss.
pub trait TrainBatch<B: Backend> {
    /// Mean loss over the batch — shape [1]
    fn loss(self, model: &KbqaModel<B>) -> Tensor<B, 1>;
}

impl<B: Backend> TrainBatch<B> for SampleBatch<B> {
    fn loss(self, model: &KbqaModel<B>) -> Tensor<B, 1> {
        model.forward_samples(self).mean()
    }
}

impl<B: Backend> TrainBatch<B> for QuestionBatch<B> {
    fn loss(self, model: &KbqaModel<B>) -> Tensor<B, 1> {
        model.forward_multi_hot(self).mean()
    }
}

// ─── Early stopping ──────────────────────────────────────────────────────────
/// What the loop does after an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochOutcome {
    /// New best loss: checkpoint it
    Improved,
    /// No improvement, patience left
    Stalled,
    /// `patience` epochs in a row without improvement
    Stop,
}

/// Tracks the best monitored loss and the epochs since it.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    best:     Option<BestEpoch>,
    stalled:  usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self { patience, best: None, stalled: 0 }
    }

    pub fn observe(&mut self, row: &EpochMetrics) -> EpochOutcome {
        let improved = self.best.map_or(true, |b| row.is_improvement(b.val_loss));
        if improved {
            self.best = Some(BestEpoch { epoch: row.epoch, val_loss: row.val_loss });
            self.stalled = 0;
            return EpochOutcome::Improved;
        }
        self.stalled += 1;
        if self.stalled >= self.patience { EpochOutcome::Stop } else { EpochOutcome::Stalled }
    }

    pub fn best(&self) -> Option<BestEpoch> {
        self.best
    }

    pub fn stalled_epochs(&self) -> usize {
        self.stalled
    }
}

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub epochs_run: usize,
    pub best:       Option<BestEpoch>,
    pub stopped_early: bool,
}

/// Split, encode, and train on `records`, saving the best model.
pub fn run_training(
    cfg:     &KbqaConfig,
    kb:      &KnowledgeBase,
    records: Vec<QaRecord>,
    ckpt:    &CheckpointManager,
) -> Result<TrainingSummary> {
    let device = device();
    TrainBackend::seed(cfg.seed);
    let mut rng = StdRng::seed_from_u64(cfg.seed);

    let (train_records, val_records) = split_train_val(records, cfg.validation_split, &mut rng);
    tracing::info!(
        "Split: {} train questions, {} validation questions",
        train_records.len(),
        val_records.len()
    );

    let model_cfg = cfg.model_config(kb);
    let model: KbqaModel<TrainBackend> = model_cfg.init(&kb.tables(), &device);
    tracing::info!(
        "Model ready: {} x GRU({}) + GRU({}), variant={:?}",
        cfg.encoder_depth,
        cfg.rnn_units,
        model_cfg.kg_dim,
        cfg.variant
    );

    let metrics = MetricsLogger::new(ckpt.dir())?;
    tracing::info!("Epoch metrics go to '{}'", metrics.csv_path().display());
    let encoder = DatasetEncoder::new(&kb.words, &kb.entities);

    match cfg.variant {
        ModelVariant::Sample => {
            let train = encoder.encode_samples(&train_records, cfg.negative_samples, &mut rng);
            let val   = encoder.encode_samples(&val_records, cfg.negative_samples, &mut rng);
            if train.is_empty() {
                bail!("No training samples: no question has a first answer with a KG embedding");
            }

            let train_loader = DataLoaderBuilder::new(SampleBatcher::<TrainBackend>::new(device.clone()))
                .batch_size(cfg.batch_size)
                .shuffle(cfg.seed)
                .build(KbqaDataset::new(train));
            let val_loader = DataLoaderBuilder::new(SampleBatcher::<InferBackend>::new(device.clone()))
                .batch_size(cfg.batch_size)
                .build(KbqaDataset::new(val));

            fit(cfg, model, || train_loader.iter(), || val_loader.iter(), ckpt, &metrics)
        }
        ModelVariant::MultiHot => {
            let train = encoder.encode_multi_hot(&train_records, cfg.max_answers);
            let val   = encoder.encode_multi_hot(&val_records, cfg.max_answers);
            if train.is_empty() {
                bail!("No training questions with between 1 and {} known answers", cfg.max_answers);
            }

            let classes = kb.entities.rows();
            let train_loader = DataLoaderBuilder::new(QuestionBatcher::<TrainBackend>::new(device.clone(), classes))
                .batch_size(cfg.batch_size)
                .shuffle(cfg.seed)
                .build(KbqaDataset::new(train));
            let val_loader = DataLoaderBuilder::new(QuestionBatcher::<InferBackend>::new(device.clone(), classes))
                .batch_size(cfg.batch_size)
                .build(KbqaDataset::new(val));

            fit(cfg, model, || train_loader.iter(), || val_loader.iter(), ckpt, &metrics)
        }
    }
}

/// The epoch loop shared by both variants.
fn fit<TB, VB, FT, IT, FV, IV>(
    cfg:           &KbqaConfig,
    mut model:     KbqaModel<TrainBackend>,
    train_batches: FT,
    val_batches:   FV,
    ckpt:          &CheckpointManager,
    metrics:       &MetricsLogger,
) -> Result<TrainingSummary>
where
    TB: TrainBatch<TrainBackend>,
    VB: TrainBatch<InferBackend>,
    FT: Fn() -> IT,
    IT: Iterator<Item = TB>,
    FV: Fn() -> IV,
    IV: Iterator<Item = VB>,
{
    let mut optim = AdamConfig::new().with_epsilon(1e-7).init();

    let mut stopping = EarlyStopping::new(cfg.patience);
    let mut epochs_run = 0usize;
    let mut stopped_early = false;

    for epoch in 1..=cfg.epochs {
        epochs_run = epoch;

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batch_count = 0usize;

        for batch in train_batches() {
            let loss = batch.loss(&model);
            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batch_count += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }
        let train_loss = mean(train_loss_sum, train_batch_count);

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let mut val_loss_sum = 0.0f64;
        let mut val_batch_count = 0usize;

        for batch in val_batches() {
            val_loss_sum += batch.loss(&model_valid).into_scalar().elem::<f64>();
            val_batch_count += 1;
        }
        let val_loss = if val_batch_count > 0 {
            mean(val_loss_sum, val_batch_count)
        } else {
            train_loss
        };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4}",
            epoch, cfg.epochs, train_loss, val_loss,
        );
        let row = EpochMetrics::new(epoch, train_loss, val_loss);
        metrics.log(&row)?;

        // ── Best-only checkpoint + early stopping ─────────────────────────────
        let outcome = stopping.observe(&row);
        if outcome == EpochOutcome::Improved {
            ckpt.save_best(&model, BestEpoch { epoch, val_loss })?;
            tracing::info!("val_loss improved to {:.4}, checkpoint saved", val_loss);
            continue;
        }

        tracing::info!(
            "val_loss did not improve from {:.4} ({}/{})",
            stopping.best().map_or(f64::NAN, |b| b.val_loss),
            stopping.stalled_epochs(),
            cfg.patience
        );
        if outcome == EpochOutcome::Stop {
            tracing::info!("Early stopping after epoch {}", epoch);
            stopped_early = true;
            break;
        }
    }

    tracing::info!("Training complete!");
    Ok(TrainingSummary { epochs_run, best: stopping.best(), stopped_early })
}

fn mean(sum: f64, count: usize) -> f64 {
    if count > 0 { sum / count as f64 } else { f64::NAN }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn replay(patience: usize, losses: &[f64]) -> (Vec<EpochOutcome>, EarlyStopping) {
        let mut stopping = EarlyStopping::new(patience);
        let mut outcomes = Vec::new();
        for (i, &loss) in losses.iter().enumerate() {
            let outcome = stopping.observe(&EpochMetrics::new(i + 1, 0.0, loss));
            outcomes.push(outcome);
            if outcome == EpochOutcome::Stop {
                break;
            }
        }
        (outcomes, stopping)
    }

    #[test]
    fn test_stops_after_patience_stalled_epochs() {
        use EpochOutcome::*;
        let (outcomes, stopping) = replay(2, &[0.5, 0.4, 0.45, 0.41, 0.3]);
        assert_eq!(outcomes, vec![Improved, Improved, Stalled, Stop]);
        assert_eq!(stopping.best(), Some(BestEpoch { epoch: 2, val_loss: 0.4 }));
    }

    #[test]
    fn test_improvement_resets_patience() {
        use EpochOutcome::*;
        let (outcomes, stopping) = replay(2, &[1.0, 0.9, 0.95, 0.8, 0.85, 0.7]);
        assert_eq!(outcomes, vec![Improved, Improved, Stalled, Improved, Stalled, Improved]);
        assert_eq!(stopping.best().map(|b| b.epoch), Some(6));
        assert_eq!(stopping.stalled_epochs(), 0);
    }

    #[test]
    fn test_equal_loss_is_not_an_improvement() {
        use EpochOutcome::*;
        let (outcomes, stopping) = replay(1, &[-0.3, -0.3]);
        assert_eq!(outcomes, vec![Improved, Stop]);
        assert_eq!(stopping.best().map(|b| b.epoch), Some(1));
    }
}
