// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: average loss over training batches
//   - val_loss:   average loss over validation batches
//
// For the contrastive loss both values live in [-1, 1]; the closer
// to -1 the better the positives align and the negatives separate.
//
// Output file: <checkpoint_dir>/metrics.csv
//
// Each training run starts a fresh file, so its rows always belong
// to the run whose best model sits next to it.
//
//   epoch,train_loss,val_loss
//   1,-0.124500,-0.089200
//   2,-0.290100,-0.254300

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub val_loss:   f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64) -> Self {
        Self { epoch, train_loss, val_loss }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Truncates any previous log and writes the CSV header.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");

        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "epoch,train_loss,val_loss")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(f, "{},{:.6},{:.6}", m.epoch, m.train_loss, m.val_loss)?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, -0.5, -0.3);
        assert!(m.is_improvement(-0.2));
        assert!(!m.is_improvement(-0.4));
    }

    #[test]
    fn test_appends_rows_under_one_header() {
        let dir = tempfile::tempdir().unwrap();

        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&EpochMetrics::new(1, 0.5, 0.25)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.4, 0.2)).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(
            csv,
            "epoch,train_loss,val_loss\n1,0.500000,0.250000\n2,0.400000,0.200000\n"
        );
    }

    #[test]
    fn test_new_run_replaces_previous_log() {
        let dir = tempfile::tempdir().unwrap();

        let first = MetricsLogger::new(dir.path()).unwrap();
        first.log(&EpochMetrics::new(1, 0.5, 0.25)).unwrap();
        first.log(&EpochMetrics::new(2, 0.4, 0.2)).unwrap();

        // A rerun in the same directory must not keep the old epochs
        let second = MetricsLogger::new(dir.path()).unwrap();
        second.log(&EpochMetrics::new(1, 0.9, 0.8)).unwrap();

        let csv = fs::read_to_string(second.csv_path()).unwrap();
        assert_eq!(csv, "epoch,train_loss,val_loss\n1,0.900000,0.800000\n");
    }
}
