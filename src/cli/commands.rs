// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `evaluate`, and all
// their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{evaluate_use_case::EvaluateConfig, train_use_case::TrainConfig};
use crate::data::search_builder::SearchSpaceBuilder;
use crate::ml::evaluator::DEFAULT_THRESHOLD;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a grounding model on annotated scene files
    Train(TrainArgs),

    /// Score scene files with an exported model
    Evaluate(EvaluateArgs),
}

/// Search-space vocabulary, shared by both subcommands
#[derive(Args, Debug, Clone)]
pub struct SearchSpaceArgs {
    /// Region types enumerated when a scene has no search space
    #[arg(long, value_delimiter = ',', default_value = "near,far,left,right,front,back")]
    pub region_types: Vec<String>,

    /// Constraint types enumerated when a scene has no search space
    #[arg(long, value_delimiter = ',', default_value = "inside,outside")]
    pub constraint_types: Vec<String>,
}

impl From<SearchSpaceArgs> for SearchSpaceBuilder {
    fn from(a: SearchSpaceArgs) -> Self {
        SearchSpaceBuilder {
            region_types:     a.region_types,
            constraint_types: a.constraint_types,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Annotated scene files (.json)
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Feature set file; the standard set is used when omitted
    #[arg(long)]
    pub feature_set: Option<String>,

    /// Exported model to continue training from
    #[arg(long)]
    pub initial_model: Option<String>,

    /// Directory for model.json, train_config.json and metrics.csv
    #[arg(long, short, default_value = "output")]
    pub output_dir: String,

    /// Worker threads for the objective and gradient
    #[arg(long, short, default_value_t = 1)]
    pub threads: usize,

    /// Upper bound on optimiser iterations
    #[arg(long, default_value_t = 100)]
    pub max_iterations: usize,

    /// L2 regularisation strength
    #[arg(long, default_value_t = 0.01)]
    pub lambda: f64,

    /// Convergence tolerance on the relative objective change
    /// and the relative gradient norm
    #[arg(long, default_value_t = 1e-4)]
    pub epsilon: f64,

    /// Share of examples trained on; the rest is held out
    #[arg(long, default_value_t = 1.0)]
    pub train_fraction: f64,

    /// Seed for the hold-out shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Confidence at or above which an example counts as correct
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    #[command(flatten)]
    pub search_space: SearchSpaceArgs,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            inputs:         a.inputs,
            feature_set:    a.feature_set,
            initial_model:  a.initial_model,
            output_dir:     a.output_dir,
            threads:        a.threads,
            max_iterations: a.max_iterations,
            lambda:         a.lambda,
            epsilon:        a.epsilon,
            train_fraction: a.train_fraction,
            seed:           a.seed,
            threshold:      a.threshold,
            search_space:   a.search_space.into(),
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Exported model (model.json)
    #[arg(long, short)]
    pub model: String,

    /// Annotated scene files (.json)
    #[arg(required = true)]
    pub inputs: Vec<String>,

    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    #[command(flatten)]
    pub search_space: SearchSpaceArgs,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            model:        a.model,
            inputs:       a.inputs,
            threshold:    a.threshold,
            search_space: a.search_space.into(),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_flags_reach_config() {
        let cli = Cli::try_parse_from([
            "grounding-llm", "train", "a.json", "b.json",
            "--threads", "4", "--lambda", "0.5", "--region-types", "near,far",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.inputs, vec!["a.json", "b.json"]);
        assert_eq!(cfg.threads, 4);
        assert_eq!(cfg.lambda, 0.5);
        assert_eq!(cfg.search_space.region_types, vec!["near", "far"]);
        assert_eq!(cfg.search_space.constraint_types, vec!["inside", "outside"]);
        assert_eq!(cfg.train_fraction, 1.0);
    }

    #[test]
    fn test_defaults_match_application_defaults() {
        let cli = Cli::try_parse_from(["grounding-llm", "train", "a.json"]).unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        let cfg: TrainConfig = args.into();
        let expected = TrainConfig { inputs: vec!["a.json".into()], ..TrainConfig::default() };
        assert_eq!(cfg, expected);
    }

    #[test]
    fn test_evaluate_requires_model() {
        assert!(Cli::try_parse_from(["grounding-llm", "evaluate", "a.json"]).is_err());
        assert!(Cli::try_parse_from(["grounding-llm", "evaluate", "-m", "m.json", "a.json"]).is_ok());
    }
}
