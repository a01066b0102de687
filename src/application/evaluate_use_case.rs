// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores scenes with an exported model, without training:
//
//   Step 1: Import the model      (Layer 6 - infra)
//   Step 2: Load scene files      (Layer 4 - data)
//   Step 3: Scrape examples       (Layer 4 - data)
//   Step 4: Evaluate              (Layer 5 - ml)

use anyhow::Result;
use std::path::PathBuf;

use crate::data::{
    loader::SceneLoader,
    scraper::{scrape_scenes, ScrapeStats},
    search_builder::SearchSpaceBuilder,
};
use crate::domain::traits::SceneSource;
use crate::infra::model_store::load_model_file;
use crate::ml::evaluator::{evaluate, EvaluationReport};

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub model:        String,
    pub inputs:       Vec<String>,
    pub threshold:    f64,
    pub search_space: SearchSpaceBuilder,
}

#[derive(Debug, Clone)]
pub struct EvaluateOutcome {
    pub scrape: ScrapeStats,
    pub report: EvaluationReport,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EvaluateOutcome> {
        let cfg = &self.config;
        let model = load_model_file(&cfg.model)?;

        let loader = SceneLoader::new(cfg.inputs.iter().map(PathBuf::from).collect())
            .with_builder(cfg.search_space.clone());
        let scenes = loader.load_all()?;

        let (examples, scrape) = scrape_scenes(&scenes);
        tracing::info!("Evaluating {} examples from {} scenes", examples.len(), scenes.len());

        let report = evaluate(&model, &examples, cfg.threshold)?;
        tracing::info!("{}", report);
        Ok(EvaluateOutcome { scrape, report })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{tests::write_scenes, TrainConfig, TrainUseCase};

    #[test]
    fn test_evaluation_matches_training_report() {
        let dir = tempfile::tempdir().unwrap();
        let search_space = SearchSpaceBuilder {
            region_types:     vec!["near".into(), "far".into()],
            constraint_types: Vec::new(),
        };
        let train = TrainConfig {
            inputs:       write_scenes(dir.path()),
            output_dir:   dir.path().join("out").to_string_lossy().into_owned(),
            search_space: search_space.clone(),
            ..TrainConfig::default()
        };
        let trained = TrainUseCase::new(train.clone()).execute().unwrap();

        let outcome = EvaluateUseCase::new(EvaluateConfig {
            model:     trained.model_path.to_string_lossy().into_owned(),
            inputs:    train.inputs,
            threshold: train.threshold,
            search_space,
        })
        .execute()
        .unwrap();

        assert_eq!(outcome.scrape, trained.scrape);
        assert_eq!(outcome.report, trained.train_eval);
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = EvaluateUseCase::new(EvaluateConfig {
            model:        dir.path().join("model.json").to_string_lossy().into_owned(),
            inputs:       write_scenes(dir.path()),
            threshold:    0.75,
            search_space: SearchSpaceBuilder::default(),
        })
        .execute();
        assert!(result.is_err());
    }
}
