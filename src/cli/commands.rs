// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `test`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::{KbqaConfig, ModelVariant};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a question encoder against pre-trained KG embeddings
    Train(TrainArgs),

    /// Evaluate the best checkpoint: top-N hits on a dataset
    Test(TestArgs),
}

/// Training objective, as spelled on the command line
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum VariantArg {
    /// Predict the answer's KG vector (contrastive loss)
    Sample,
    /// Score every KG entity against the answer set
    MultiHot,
}

impl From<VariantArg> for ModelVariant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::Sample   => ModelVariant::Sample,
            VariantArg::MultiHot => ModelVariant::MultiHot,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON array of {"question": ..., "answers": [...]}
    #[arg(long)]
    pub dataset: String,

    /// Word embeddings text file (label followed by floats)
    #[arg(long)]
    pub word_embeddings: String,

    /// KG entity embeddings text file
    #[arg(long)]
    pub kg_embeddings: String,

    /// Word-space vectors of KG items; enables the entity linking layer
    #[arg(long)]
    pub linking_embeddings: Option<String>,

    /// Where the best model, run config and metrics are written
    #[arg(long, default_value = "models")]
    pub checkpoint_dir: String,

    #[arg(long, value_enum, default_value_t = VariantArg::Sample)]
    pub variant: VariantArg,

    /// Hidden size of the intermediate GRU layers
    #[arg(long, default_value_t = 500)]
    pub rnn_units: usize,

    /// Number of intermediate GRU layers
    #[arg(long, default_value_t = 4)]
    pub encoder_depth: usize,

    /// Random negatives per positive (sample variant)
    #[arg(long, default_value_t = 1)]
    pub negative_samples: usize,

    /// Questions with more known answers are skipped (multi-hot variant)
    #[arg(long, default_value_t = 100)]
    pub max_answers: usize,

    #[arg(long, default_value_t = 100)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    /// Fraction of questions held out for validation
    #[arg(long, default_value_t = 0.3)]
    pub validation_split: f64,

    /// Epochs without validation improvement before stopping
    #[arg(long, default_value_t = 5)]
    pub patience: usize,

    /// Keep the pre-trained word embeddings fixed
    #[arg(long)]
    pub freeze_word_embeddings: bool,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for KbqaConfig {
    fn from(a: TrainArgs) -> Self {
        KbqaConfig {
            dataset:            a.dataset,
            word_embeddings:    a.word_embeddings,
            kg_embeddings:      a.kg_embeddings,
            linking_embeddings: a.linking_embeddings,
            checkpoint_dir:     a.checkpoint_dir,
            variant:            a.variant.into(),
            rnn_units:          a.rnn_units,
            encoder_depth:      a.encoder_depth,
            negative_samples:   a.negative_samples,
            max_answers:        a.max_answers,
            batch_size:         a.batch_size,
            epochs:             a.epochs,
            lr:                 a.lr,
            dropout:            a.dropout,
            validation_split:   a.validation_split,
            patience:           a.patience,
            train_word_embeddings: !a.freeze_word_embeddings,
            seed:               a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct TestArgs {
    /// JSON dataset to evaluate on
    #[arg(long)]
    pub dataset: String,

    /// Directory written by `train`
    #[arg(long, default_value = "models")]
    pub checkpoint_dir: String,

    /// How many nearest entities count as retrieved
    #[arg(long, default_value_t = 5)]
    pub top_n: usize,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    #[test]
    fn test_train_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "kbqa", "train",
            "--dataset", "qa.json",
            "--word-embeddings", "w.txt",
            "--kg-embeddings", "kg.txt",
            "--variant", "multi-hot",
            "--freeze-word-embeddings",
        ])
        .unwrap();

        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: KbqaConfig = args.into();
        assert_eq!(cfg.variant, ModelVariant::MultiHot);
        assert!(!cfg.train_word_embeddings);
        assert_eq!(cfg.linking_embeddings, None);
        assert_eq!(cfg.rnn_units, 500);
        assert_eq!(cfg.patience, 5);
    }

    #[test]
    fn test_test_defaults() {
        let cli = Cli::try_parse_from(["kbqa", "test", "--dataset", "qa.json"]).unwrap();
        let Commands::Test(args) = cli.command else { panic!("expected test") };
        assert_eq!(args.top_n, 5);
        assert_eq!(args.checkpoint_dir, "models");
    }
}
