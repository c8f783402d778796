// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the best model using Burn's CompactRecorder.
//
// Only the best model survives: the training loop calls
// save_best() whenever validation loss improves, overwriting
// the previous weights.
//
// File layout:
//   checkpoints/
//     model_best.mpk.gz   ← weights with the lowest validation loss
//     best_epoch.json     ← { "epoch": 7, "val_loss": -0.8123 }
//     kbqa_config.json    ← run configuration (paths + hyperparameters)
//
// The config is needed at test time: it names the embedding files
// and the architecture, so the model can be rebuilt before its
// weights are loaded into it.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::KbqaConfig;
use crate::ml::model::KbqaModel;

const MODEL_FILE:  &str = "model_best";
const BEST_FILE:   &str = "best_epoch.json";
const CONFIG_FILE: &str = "kbqa_config.json";

/// Which epoch produced the saved weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestEpoch {
    pub epoch:    usize,
    pub val_loss: f64,
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a manager rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Overwrite the best checkpoint with `model`.
    pub fn save_best<B: Backend>(&self, model: &KbqaModel<B>, best: BestEpoch) -> Result<()> {
        let path = self.dir.join(MODEL_FILE);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        fs::write(self.dir.join(BEST_FILE), serde_json::to_string(&best)?)
            .with_context(|| format!("Failed to write {BEST_FILE}"))?;

        tracing::debug!("Saved best checkpoint: epoch {} val_loss={:.4}", best.epoch, best.val_loss);
        Ok(())
    }

    /// Load the best weights into a freshly built `model`.
    pub fn load_best<B: Backend>(&self, model: KbqaModel<B>, device: &B::Device) -> Result<KbqaModel<B>> {
        let best = self.best_epoch()?;
        let path = self.dir.join(MODEL_FILE);

        tracing::info!("Loading checkpoint from epoch {} (val_loss={:.4})", best.epoch, best.val_loss);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?", path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn best_epoch(&self) -> Result<BestEpoch> {
        let path = self.dir.join(BEST_FILE);
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'. Have you run 'train' first?", path.display()))?;
        Ok(serde_json::from_str(&s)?)
    }

    pub fn save_config(&self, cfg: &KbqaConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<KbqaConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Make sure you have run 'train' before 'test'.",
                path.display()
            )
        })?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("nested")).unwrap();

        let cfg = KbqaConfig { rnn_units: 7, seed: 3, ..KbqaConfig::default() };
        ckpt.save_config(&cfg).unwrap();

        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.rnn_units, 7);
        assert_eq!(loaded.seed, 3);
        assert_eq!(loaded.variant, cfg.variant);
    }

    #[test]
    fn test_missing_checkpoint_is_reported() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        assert!(ckpt.best_epoch().is_err());
        assert!(ckpt.load_config().is_err());
    }
}
