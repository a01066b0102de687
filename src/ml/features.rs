// ============================================================
// Layer 5 — Feature Set
// ============================================================
// Maps a (label, example) pair to a fixed-length numeric vector.
// The model never looks inside a feature; it only needs the
// vector length to match its weight vector.
//
// Every feature in this library is an indicator gated on the
// label being scored:
//
//   f(cv', x) = 1  if cv' == feature.cv and the test holds
//               0  otherwise
//
// so the same test can carry a different weight for True and
// for False.
//
// A feature set is loaded once and shared read-only by every
// trainer thread (it is Send + Sync by construction).
//
// Reference: Berger et al. (1996) A Maximum Entropy Approach to NLP

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, fs};

use crate::data::example::ExampleContext;
use crate::domain::cv::Cv;
use crate::domain::grounding::{Grounding, GroundingKind};
use crate::domain::traits::Persistable;

/// Anything that can turn a labelled context into a feature vector.
pub trait FeatureExtractor: Send + Sync {
    /// Length of every vector `extract` returns
    fn dimension(&self) -> usize;

    fn extract(&self, cv: Cv, x: &ExampleContext<'_>) -> Vec<f64>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "feature", rename_all = "snake_case")]
pub enum Feature {
    /// Always on for its label
    Bias { cv: Cv },
    /// Candidate is of the given variant
    GroundingKind { cv: Cv, kind: GroundingKind },
    /// Candidate is a region of the given type
    RegionType { cv: Cv, region_type: String },
    /// Candidate is a constraint of the given type
    ConstraintType { cv: Cv, constraint_type: String },
    /// Some object the candidate refers to has the given type
    ObjectType { cv: Cv, object_type: String },
    /// The phrase has the given type
    PhraseType { cv: Cv, phrase_type: String },
    /// The phrase contains the given word
    PhraseWord { cv: Cv, word: String },
    /// The phrase names the candidate's region type
    WordMatchesRegionType { cv: Cv },
    /// The phrase names the type of an object the candidate refers to
    WordMatchesObjectType { cv: Cv },
    /// The candidate refers to an object that a child grounding refers to
    ChildOverlap { cv: Cv },
}

impl Feature {
    pub fn cv(&self) -> Cv {
        match self {
            Feature::Bias { cv }
            | Feature::GroundingKind { cv, .. }
            | Feature::RegionType { cv, .. }
            | Feature::ConstraintType { cv, .. }
            | Feature::ObjectType { cv, .. }
            | Feature::PhraseType { cv, .. }
            | Feature::PhraseWord { cv, .. }
            | Feature::WordMatchesRegionType { cv }
            | Feature::WordMatchesObjectType { cv }
            | Feature::ChildOverlap { cv } => *cv,
        }
    }

    pub fn value(&self, cv: Cv, x: &ExampleContext<'_>) -> f64 {
        if cv != self.cv() {
            return 0.0;
        }
        if self.holds(x) { 1.0 } else { 0.0 }
    }

    fn holds(&self, x: &ExampleContext<'_>) -> bool {
        match self {
            Feature::Bias { .. } => true,
            Feature::GroundingKind { kind, .. } => x.grounding.kind() == *kind,
            Feature::RegionType { region_type, .. } => {
                matches!(x.grounding, Grounding::Region(r) if &r.region_type == region_type)
            }
            Feature::ConstraintType { constraint_type, .. } => {
                matches!(x.grounding, Grounding::Constraint(c) if &c.constraint_type == constraint_type)
            }
            Feature::ObjectType { object_type, .. } => {
                x.grounding.objects().iter().any(|o| &o.object_type == object_type)
            }
            Feature::PhraseType { phrase_type, .. } => &x.phrase.phrase_type == phrase_type,
            Feature::PhraseWord { word, .. } => {
                let word = word.to_lowercase();
                x.phrase.words().any(|w| w == word)
            }
            Feature::WordMatchesRegionType { .. } => {
                let region_type = match x.grounding {
                    Grounding::Region(r)     => &r.region_type,
                    Grounding::Constraint(c) => &c.child.region_type,
                    _ => return false,
                };
                let region_type = region_type.to_lowercase();
                x.phrase.words().any(|w| w == region_type)
            }
            Feature::WordMatchesObjectType { .. } => {
                let types: Vec<String> = x
                    .grounding
                    .objects()
                    .iter()
                    .map(|o| o.object_type.to_lowercase())
                    .collect();
                x.phrase.words().any(|w| types.contains(&w))
            }
            Feature::ChildOverlap { .. } => {
                let own = x.grounding.objects();
                x.children
                    .iter()
                    .flat_map(|g| g.objects())
                    .any(|o| own.contains(&o))
            }
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cv = self.cv();
        match self {
            Feature::Bias { .. }                       => write!(f, "bias(cv={cv})"),
            Feature::GroundingKind { kind, .. }        => write!(f, "grounding_kind(cv={cv},kind={kind:?})"),
            Feature::RegionType { region_type, .. }    => write!(f, "region_type(cv={cv},type={region_type})"),
            Feature::ConstraintType { constraint_type, .. } => {
                write!(f, "constraint_type(cv={cv},type={constraint_type})")
            }
            Feature::ObjectType { object_type, .. }    => write!(f, "object_type(cv={cv},type={object_type})"),
            Feature::PhraseType { phrase_type, .. }    => write!(f, "phrase_type(cv={cv},type={phrase_type})"),
            Feature::PhraseWord { word, .. }           => write!(f, "phrase_word(cv={cv},word={word})"),
            Feature::WordMatchesRegionType { .. }      => write!(f, "word_matches_region_type(cv={cv})"),
            Feature::WordMatchesObjectType { .. }      => write!(f, "word_matches_object_type(cv={cv})"),
            Feature::ChildOverlap { .. }               => write!(f, "child_overlap(cv={cv})"),
        }
    }
}

/// Ordered feature list; its length is the weight-vector dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// A general-purpose set for the given region and constraint
    /// vocabularies, mirrored for both binary labels.
    pub fn standard(region_types: &[String], constraint_types: &[String]) -> Self {
        let mut features = Vec::new();
        for cv in Cv::BINARY {
            features.push(Feature::Bias { cv });
            features.push(Feature::GroundingKind { cv, kind: GroundingKind::Region });
            features.push(Feature::GroundingKind { cv, kind: GroundingKind::Constraint });
            for region_type in region_types {
                features.push(Feature::RegionType { cv, region_type: region_type.clone() });
            }
            for constraint_type in constraint_types {
                features.push(Feature::ConstraintType {
                    cv,
                    constraint_type: constraint_type.clone(),
                });
            }
            features.push(Feature::WordMatchesRegionType { cv });
            features.push(Feature::WordMatchesObjectType { cv });
            features.push(Feature::ChildOverlap { cv });
        }
        Self { features }
    }
}

impl FeatureExtractor for FeatureSet {
    fn dimension(&self) -> usize {
        self.features.len()
    }

    fn extract(&self, cv: Cv, x: &ExampleContext<'_>) -> Vec<f64> {
        self.features.iter().map(|f| f.value(cv, x)).collect()
    }
}

impl Persistable for FeatureSet {
    fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Cannot write feature set to '{path}'"))?;
        Ok(())
    }

    fn load(path: &str) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read feature set from '{path}'"))?;
        let set: FeatureSet = serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse feature set '{path}'"))?;
        tracing::info!("Loaded feature set '{}' ({} features)", path, set.len());
        Ok(set)
    }
}
