// ============================================================
// Layer 2 — TestUseCase
// ============================================================
// Evaluates the best checkpoint on a held-out dataset:
//
//   Step 1: Reload the run config from the checkpoint directory
//   Step 2: Reload the same embedding tables
//   Step 3: Encode every test question (none are dropped)
//   Step 4: Retrieve the top-N entities and count hits

use anyhow::Result;

use crate::application::knowledge_base::KnowledgeBase;
use crate::data::{encoder::DatasetEncoder, loader::JsonDatasetLoader};
use crate::domain::traits::QaSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::evaluator::{Evaluator, HitReport};

pub struct TestUseCase {
    dataset:        String,
    checkpoint_dir: String,
    top_n:          usize,
}

impl TestUseCase {
    pub fn new(dataset: impl Into<String>, checkpoint_dir: impl Into<String>, top_n: usize) -> Self {
        Self {
            dataset:        dataset.into(),
            checkpoint_dir: checkpoint_dir.into(),
            top_n,
        }
    }

    pub fn execute(&self) -> Result<HitReport> {
        let ckpt = CheckpointManager::new(&self.checkpoint_dir)?;
        let cfg  = ckpt.load_config()?;
        if let Ok(best) = ckpt.best_epoch() {
            tracing::info!("Best checkpoint: epoch {} (val_loss={:.4})", best.epoch, best.val_loss);
        }

        let kb = KnowledgeBase::load(&cfg)?;

        tracing::info!("Loading test dataset from '{}'", self.dataset);
        let records = JsonDatasetLoader::new(&self.dataset).load_all()?;
        let items   = DatasetEncoder::new(&kb.words, &kb.entities).encode_for_evaluation(&records);
        tracing::info!("Evaluating {} questions", items.len());

        let evaluator = Evaluator::from_checkpoint(&ckpt, &cfg, &kb)?;
        let report    = evaluator.evaluate(items, self.top_n)?;
        tracing::info!("{}", report);
        Ok(report)
    }
}
