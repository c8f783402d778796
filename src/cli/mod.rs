// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train` — fits the question encoder, keeps the best model
//   2. `test`  — reports top-N hits of the best model on a dataset
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TestArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "kbqa",
    version,
    about = "Answer questions by retrieving entities from pre-trained knowledge graph embeddings."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Test(args)  => run_test(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.dataset);
    let checkpoint_dir = args.checkpoint_dir.clone();

    let summary = TrainUseCase::new(args.into()).execute()?;

    match summary.best {
        Some(best) => println!(
            "Training complete after {} epoch(s){}. Best epoch {} (val_loss={:.4}) saved to '{}'.",
            summary.epochs_run,
            if summary.stopped_early { " (early stop)" } else { "" },
            best.epoch,
            best.val_loss,
            checkpoint_dir
        ),
        None => println!("Training ran no epochs; nothing was saved."),
    }
    Ok(())
}

fn run_test(args: TestArgs) -> Result<()> {
    use crate::application::test_use_case::TestUseCase;

    let report = TestUseCase::new(args.dataset, args.checkpoint_dir, args.top_n).execute()?;
    println!("{report}");
    Ok(())
}
