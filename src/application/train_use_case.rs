// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load word / KG / linking embeddings (Layer 4 - data)
//   Step 2: Load the QA dataset                 (Layer 4 - data)
//   Step 3: Save the run config                 (Layer 6 - infra)
//   Step 4: Split, encode, train                (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::application::knowledge_base::KnowledgeBase;
use crate::data::loader::JsonDatasetLoader;
use crate::domain::traits::QaSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::KbqaModelConfig;
use crate::ml::trainer::{run_training, TrainingSummary};

/// Which training objective the model is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelVariant {
    /// Predict the answer's KG vector; contrastive loss with negatives
    Sample,
    /// Score every KG entity; loss over the normalised answer set
    MultiHot,
}

// ─── Run Configuration ───────────────────────────────────────────────────────
// Everything needed to rebuild the model for `test`.
// Saved as kbqa_config.json in the checkpoint directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbqaConfig {
    pub dataset:            String,
    pub word_embeddings:    String,
    pub kg_embeddings:      String,
    #[serde(default)]
    pub linking_embeddings: Option<String>,
    pub checkpoint_dir:     String,
    pub variant:            ModelVariant,
    pub rnn_units:          usize,
    pub encoder_depth:      usize,
    pub negative_samples:   usize,
    pub max_answers:        usize,
    pub batch_size:         usize,
    pub epochs:             usize,
    pub lr:                 f64,
    pub dropout:            f64,
    pub validation_split:   f64,
    pub patience:           usize,
    pub train_word_embeddings: bool,
    pub seed:               u64,
}

impl Default for KbqaConfig {
    fn default() -> Self {
        Self {
            dataset:            "data/train.json".to_string(),
            word_embeddings:    "data/words.txt".to_string(),
            kg_embeddings:      "data/entities.txt".to_string(),
            linking_embeddings: None,
            checkpoint_dir:     "models".to_string(),
            variant:            ModelVariant::Sample,
            rnn_units:          500,
            encoder_depth:      4,
            negative_samples:   1,
            max_answers:        100,
            batch_size:         100,
            epochs:             20,
            lr:                 1e-3,
            dropout:            0.0,
            validation_split:   0.3,
            patience:           5,
            train_word_embeddings: true,
            seed:               42,
        }
    }
}

impl KbqaConfig {
    /// Model architecture for the given knowledge base.
    pub fn model_config(&self, kb: &KnowledgeBase) -> KbqaModelConfig {
        KbqaModelConfig::new(
            kb.words.rows(),
            kb.words.dim(),
            self.rnn_units,
            self.encoder_depth,
            kb.entities.dim(),
            self.variant == ModelVariant::MultiHot,
        )
        .with_dropout(self.dropout)
        .with_train_word_embeddings(self.train_word_embeddings)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: KbqaConfig,
}

impl TrainUseCase {
    pub fn new(config: KbqaConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;

        // ── Step 1: Embedding tables ─────────────────────────────────────────
        let kb = KnowledgeBase::load(cfg)?;

        // ── Step 2: Questions and answers ────────────────────────────────────
        tracing::info!("Loading dataset from '{}'", cfg.dataset);
        let records = JsonDatasetLoader::new(&cfg.dataset).load_all()?;
        tracing::info!("Loaded {} questions", records.len());

        // ── Step 3: Save config so `test` can rebuild the model ──────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt.save_config(cfg)?;

        // ── Step 4: Training loop (Layer 5) ──────────────────────────────────
        run_training(cfg, &kb, records, &ckpt)
    }
}
