// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and prints results. All work is
// delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — scrape, train, evaluate and export a model
//   2. `evaluate` — score scene files with an exported model
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

use crate::data::scraper::ScrapeStats;
use crate::ml::evaluator::EvaluationReport;

#[derive(Parser, Debug)]
#[command(
    name = "grounding-llm",
    version = "0.1.0",
    about = "Train and evaluate a log-linear grounding model on annotated scenes."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on {} input files", args.inputs.len());
    let outcome = TrainUseCase::new(args.into()).execute()?;

    print_scrape(&outcome.scrape);
    println!(
        "\nTraining: {:?} after {} iterations, objective {:.6}, |g| {:.3e}",
        outcome.training.termination,
        outcome.training.iterations,
        outcome.training.objective,
        outcome.training.gradient_norm,
    );
    print_report("training set", &outcome.train_eval);
    if let Some(holdout) = &outcome.holdout {
        print_report("hold-out set", holdout);
    }
    println!("\nModel saved to {}", outcome.model_path.display());
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let outcome = EvaluateUseCase::new(args.into()).execute()?;
    print_scrape(&outcome.scrape);
    print_report("evaluation", &outcome.report);
    Ok(())
}

fn print_scrape(stats: &ScrapeStats) {
    println!(
        "Scraped {} examples ({} true); {} phrases without ground truth, {} unknown, {} dangling",
        stats.examples,
        stats.true_labels,
        stats.phrases_without_truth,
        stats.coverage_gaps,
        stats.dangling_entries,
    );
}

fn print_report(name: &str, report: &EvaluationReport) {
    if !report.misclassified.is_empty() {
        println!("\n{} example(s) below {} in the {name}:", report.misclassified.len(), report.threshold);
        for miss in &report.misclassified {
            println!("{miss}");
        }
    }
    println!("\n{name}: {report}");
}
