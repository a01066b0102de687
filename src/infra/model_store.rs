// ============================================================
// Layer 6 — Model Store
// ============================================================
// Exports and imports a trained model so it can be evaluated or
// warm-started without retraining.
//
// What gets saved:
//   1. model.json        — the feature set and the weight vector
//                          it is bound to
//   2. train_config.json — the configuration the run used
//
// The feature set travels with the weights: a weight vector is
// meaningless without the exact ordered feature list it was fit
// to. Loading rejects a file whose weight count disagrees with
// its feature count.
//
// File layout:
//   output/
//     model.json
//     train_config.json
//     metrics.csv          ← written by MetricsLogger
//
// Reference: Rust Book §9 (Error Handling)
//            serde_json documentation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::{features::FeatureSet, model::Llm};

/// On-disk form of an `Llm`
#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    features: FeatureSet,
    weights:  Vec<f64>,
}

pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join("model.json")
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create output directory '{}'", self.dir.display()))
    }

    pub fn save_model(&self, model: &Llm) -> Result<()> {
        self.ensure_dir()?;
        let file = ModelFile {
            features: model.features().as_ref().clone(),
            weights:  model.weights().to_vec(),
        };
        let path = self.model_path();
        fs::write(&path, serde_json::to_string_pretty(&file)?)
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        tracing::info!("Saved model ({} weights) to '{}'", file.weights.len(), path.display());
        Ok(())
    }

    pub fn load_model(&self) -> Result<Llm> {
        load_model_file(self.model_path())
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join("train_config.json");
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' first.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Read an exported model from any path.
pub fn load_model_file(path: impl AsRef<Path>) -> Result<Llm> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).with_context(|| {
        format!("Cannot load model '{}'. Have you trained a model first?", path.display())
    })?;
    let file: ModelFile = serde_json::from_str(&json)
        .with_context(|| format!("Cannot parse model '{}'", path.display()))?;

    let model = Llm::with_weights(Arc::new(file.features), file.weights)
        .with_context(|| format!("Model '{}' does not match its feature set", path.display()))?;
    tracing::info!("Loaded model '{}' ({} weights)", path.display(), model.weights().len());
    Ok(model)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cv::Cv;
    use crate::ml::features::Feature;

    fn model() -> Llm {
        let features = FeatureSet::new(vec![
            Feature::Bias { cv: Cv::True },
            Feature::RegionType { cv: Cv::False, region_type: "near".into() },
        ]);
        Llm::with_weights(Arc::new(features), vec![0.5, -2.25]).unwrap()
    }

    #[test]
    fn test_model_survives_export_and_import() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("out"));
        let saved = model();
        store.save_model(&saved).unwrap();

        let loaded = store.load_model().unwrap();
        assert_eq!(loaded.weights(), saved.weights());
        assert_eq!(loaded.features().as_ref(), saved.features().as_ref());
    }

    #[test]
    fn test_weight_count_must_match_features() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, r#"{"features":{"features":[{"feature":"bias","cv":"true"}]},"weights":[1.0,2.0]}"#)
            .unwrap();
        let err = load_model_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Dimension mismatch"));
    }

    #[test]
    fn test_missing_model_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ModelStore::new(dir.path()).load_model().is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let cfg   = TrainConfig { threads: 3, ..TrainConfig::default() };
        store.save_config(&cfg).unwrap();
        assert_eq!(store.load_config().unwrap(), cfg);
    }
}
