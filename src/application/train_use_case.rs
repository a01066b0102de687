// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training run in order:
//
//   Step 1: Load scene files               (Layer 4 - data)
//   Step 2: Scrape labelled examples       (Layer 4 - data)
//   Step 3: Split off a hold-out set       (Layer 4 - data)
//   Step 4: Build / import the model       (Layer 5 - ml, Layer 6 - infra)
//   Step 5: Save config                    (Layer 6 - infra)
//   Step 6: Train, logging every iteration (Layer 5 - ml, Layer 6 - infra)
//   Step 7: Evaluate train and hold-out    (Layer 5 - ml)
//   Step 8: Export the model               (Layer 6 - infra)
//
// The scenes are loaded here and dropped at the end of execute();
// every example borrows from them in between.
//
// Reference: Rust Book §10.3 (Lifetimes)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc};

use crate::data::{
    loader::SceneLoader,
    scraper::{scrape_scenes, ScrapeStats},
    search_builder::SearchSpaceBuilder,
    splitter::split_holdout,
};
use crate::domain::traits::{Persistable, SceneSource};
use crate::infra::{
    metrics::MetricsLogger,
    model_store::{load_model_file, ModelStore},
};
use crate::ml::{
    evaluator::{evaluate, EvaluationReport, DEFAULT_THRESHOLD},
    features::FeatureSet,
    model::Llm,
    trainer::{Trainer, TrainerConfig, TrainingReport},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a training run needs. Saved next to the model so a
// run can be reproduced from its output directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub inputs:         Vec<String>,
    /// Feature set file; the standard set is built when absent
    pub feature_set:    Option<String>,
    /// Exported model to continue from
    pub initial_model:  Option<String>,
    pub output_dir:     String,
    pub threads:        usize,
    pub max_iterations: usize,
    pub lambda:         f64,
    pub epsilon:        f64,
    pub train_fraction: f64,
    pub seed:           u64,
    pub threshold:      f64,
    #[serde(default)]
    pub search_space:   SearchSpaceBuilder,
}

impl Default for TrainConfig {
    fn default() -> Self {
        let trainer = TrainerConfig::default();
        Self {
            inputs:         Vec::new(),
            feature_set:    None,
            initial_model:  None,
            output_dir:     "output".to_string(),
            threads:        trainer.threads,
            max_iterations: trainer.max_iterations,
            lambda:         trainer.lambda,
            epsilon:        trainer.epsilon,
            train_fraction: 1.0,
            seed:           42,
            threshold:      DEFAULT_THRESHOLD,
            search_space:   SearchSpaceBuilder::default(),
        }
    }
}

impl TrainConfig {
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            max_iterations: self.max_iterations,
            lambda:         self.lambda,
            epsilon:        self.epsilon,
            threads:        self.threads,
        }
    }
}

/// What a finished run hands back to the CLI for display
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub scrape:     ScrapeStats,
    pub training:   TrainingReport,
    pub train_eval: EvaluationReport,
    pub holdout:    Option<EvaluationReport>,
    pub model_path: PathBuf,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainOutcome> {
        let cfg = &self.config;
        cfg.trainer_config().validate()?;
        if cfg.inputs.is_empty() {
            anyhow::bail!("No input files given");
        }

        // ── Step 1: Load scenes ───────────────────────────────────────────────
        let loader = SceneLoader::new(cfg.inputs.iter().map(PathBuf::from).collect())
            .with_builder(cfg.search_space.clone());
        let scenes = loader.load_all()?;
        tracing::info!("Loaded {} scenes", scenes.len());

        // ── Step 2: Scrape examples ──────────────────────────────────────────
        let (examples, scrape) = scrape_scenes(&scenes);
        tracing::info!(
            "Scraped {} examples ({} true) from {} scenes",
            scrape.examples,
            scrape.true_labels,
            scenes.len()
        );

        // ── Step 3: Hold-out split ───────────────────────────────────────────
        let (train_set, holdout_set) = split_holdout(examples, cfg.train_fraction, cfg.seed);

        // ── Step 4: Model ─────────────────────────────────────────────────────
        let mut model = self.initial_model()?;
        tracing::info!("Model has {} weights", model.weights().len());

        // ── Step 5: Save config ───────────────────────────────────────────────
        let store = ModelStore::new(&cfg.output_dir);
        store.save_config(cfg)?;

        // ── Step 6: Train ─────────────────────────────────────────────────────
        tracing::info!("training with {} examples", train_set.len());
        let metrics = MetricsLogger::new(&cfg.output_dir)?;
        let mut trainer = Trainer::new(&model, &train_set, cfg.trainer_config())
            .context("Cannot start training")?;
        let training = trainer
            .train_with_observer(&mut model, |m| {
                if let Err(e) = metrics.log(m) {
                    tracing::warn!("Cannot record iteration {}: {e:#}", m.iteration);
                }
            })
            .context("Training failed")?;

        // ── Step 7: Evaluate ──────────────────────────────────────────────────
        let train_eval = evaluate(&model, &train_set, cfg.threshold)?;
        tracing::info!("Training set: {}", train_eval);
        let holdout = if holdout_set.is_empty() {
            None
        } else {
            let report = evaluate(&model, &holdout_set, cfg.threshold)?;
            tracing::info!("Hold-out set: {}", report);
            Some(report)
        };

        // ── Step 8: Export ────────────────────────────────────────────────────
        store.save_model(&model)?;

        Ok(TrainOutcome {
            scrape,
            training,
            train_eval,
            holdout,
            model_path: store.model_path(),
        })
    }

    /// An imported model wins over a feature set; with neither, the
    /// standard set for the configured search-space vocabulary.
    fn initial_model(&self) -> Result<Llm> {
        let cfg = &self.config;
        if let Some(path) = &cfg.initial_model {
            if cfg.feature_set.is_some() {
                tracing::warn!("Both an initial model and a feature set given; using the model's features");
            }
            return load_model_file(path);
        }

        let features = match &cfg.feature_set {
            Some(path) => FeatureSet::load(path)?,
            None => FeatureSet::standard(
                &cfg.search_space.region_types,
                &cfg.search_space.constraint_types,
            ),
        };
        Ok(Llm::new(Arc::new(features)))
    }
}
