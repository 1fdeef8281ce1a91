// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with `clap` and routes to one of
// the two use cases:
//   default   train, validate, checkpoint, plot
//   --test    evaluate the saved checkpoint on the test split

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::RunArgs;

use crate::application::{
    evaluate_use_case::EvaluateUseCase,
    train_use_case::{RunConfig, TrainUseCase},
};

#[derive(Parser, Debug)]
#[command(
    name = "frame-parser",
    version,
    about = "Train and evaluate a BiLSTM (optionally attention-pooled) frame classifier."
)]
pub struct Cli {
    #[command(flatten)]
    pub args: RunArgs,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let config: RunConfig = self.args.into();
        tracing::debug!("Run configuration: {}", serde_json::to_string(&config)?);

        if config.test {
            EvaluateUseCase::new(config).execute()
        } else {
            TrainUseCase::new(config).execute()
        }
    }
}
