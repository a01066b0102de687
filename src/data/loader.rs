// ============================================================
// Layer 4 — Scene Loader
// ============================================================
// Loads annotated scenes from JSON files.
//
// Scene file layout:
//   {
//     "world":  { "objects": [ { "name", "object_type", "position" } ] },
//     "phrase": {
//       "phrase_type": "VP",
//       "text":        "go near the box",
//       "grounding":   { "type": "set", "groundings": [ ... ] },
//       "children":    [ { ...same shape... } ]
//     },
//     "search_space": {                 ← optional
//       "candidates":     [ grounding, ... ],
//       "correspondence": [ ["false", "true"] ],
//       "shared":         [ { "cv_index": 0, "candidate": 0 } ],
//       "per_phrase":     [ { "phrase": 2, "entries": [ ... ] } ]
//     }
//   }
//
// The nested phrase is flattened into the arena in pre-order, so
// the `phrase` numbers in "per_phrase" are pre-order positions
// (root = 0). Without "shared", every candidate is shared with
// correspondence row 0. Without "search_space" at all, the
// SearchSpaceBuilder fills one from the world.
//
// One unreadable or malformed file fails the whole load, before
// any scraping starts.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::data::search_builder::SearchSpaceBuilder;
use crate::domain::cv::Cv;
use crate::domain::grounding::Grounding;
use crate::domain::phrase::{Phrase, PhraseId, PhraseTree};
use crate::domain::scene::Scene;
use crate::domain::search_space::{
    CandidatePool, CorrespondenceTable, SearchSpace, SearchSpaceEntry,
};
use crate::domain::traits::SceneSource;
use crate::domain::world::World;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse '{path}': {source}")]
    Parse {
        path:   PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct SceneFile {
    #[serde(default)]
    world:        World,
    phrase:       PhraseNode,
    #[serde(default)]
    search_space: Option<SearchSpaceFile>,
}

#[derive(Debug, Deserialize)]
struct PhraseNode {
    phrase_type: String,
    #[serde(default)]
    text:        String,
    #[serde(default)]
    grounding:   Option<Grounding>,
    #[serde(default)]
    children:    Vec<PhraseNode>,
}

impl PhraseNode {
    fn into_phrase(self) -> (Phrase, Vec<PhraseNode>) {
        let mut phrase = Phrase::new(self.phrase_type, self.text);
        phrase.grounding = self.grounding;
        (phrase, self.children)
    }
}

#[derive(Debug, Deserialize)]
struct SearchSpaceFile {
    candidates:     Vec<Grounding>,
    #[serde(default = "binary_rows")]
    correspondence: Vec<Vec<Cv>>,
    #[serde(default)]
    shared:         Option<Vec<SearchSpaceEntry>>,
    #[serde(default)]
    per_phrase:     Vec<PhraseEntries>,
}

#[derive(Debug, Deserialize)]
struct PhraseEntries {
    phrase:  usize,
    entries: Vec<SearchSpaceEntry>,
}

fn binary_rows() -> Vec<Vec<Cv>> {
    vec![Cv::BINARY.to_vec()]
}

/// Loads a fixed list of scene files.
/// Implements the SceneSource trait from Layer 3.
pub struct SceneLoader {
    paths:   Vec<PathBuf>,
    builder: SearchSpaceBuilder,
}

impl SceneLoader {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths, builder: SearchSpaceBuilder::default() }
    }

    pub fn with_builder(mut self, builder: SearchSpaceBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn load_scene(&self, path: &Path) -> Result<Scene, LoadError> {
        let json = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_scene(&path.display().to_string(), &json, &self.builder).map_err(|source| {
            LoadError::Parse { path: path.to_path_buf(), source }
        })
    }
}

impl SceneSource for SceneLoader {
    fn load_all(&self) -> anyhow::Result<Vec<Scene>> {
        let mut scenes = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            tracing::info!("Reading file {}", path.display());
            let scene = self.load_scene(path)?;
            tracing::debug!(
                "Loaded: {} ({} phrases, {} objects, {} candidates)",
                scene.source,
                scene.tree.len(),
                scene.world.objects.len(),
                scene.search_space.pool.len()
            );
            scenes.push(scene);
        }
        Ok(scenes)
    }
}

/// Parse one scene document. `source` becomes the scene's source id.
pub fn parse_scene(
    source:  &str,
    json:    &str,
    builder: &SearchSpaceBuilder,
) -> Result<Scene, serde_json::Error> {
    let file: SceneFile = serde_json::from_str(json)?;
    let tree = build_tree(file.phrase);

    let (search_space, correspondence) = match file.search_space {
        Some(explicit) => explicit_search_space(explicit),
        None => builder.fill(&file.world),
    };

    Ok(Scene {
        source: source.to_string(),
        world: file.world,
        tree,
        search_space,
        correspondence,
    })
}

fn build_tree(root: PhraseNode) -> PhraseTree {
    let (phrase, children) = root.into_phrase();
    let mut tree = PhraseTree::new(phrase);
    let root_id = tree.root();
    for child in children {
        attach(&mut tree, root_id, child);
    }
    tree
}

// Recursing before the next sibling is attached is what makes
// arena ids equal to pre-order positions.
fn attach(tree: &mut PhraseTree, parent: PhraseId, node: PhraseNode) {
    let (phrase, children) = node.into_phrase();
    let id = tree.add_child(parent, phrase);
    for child in children {
        attach(tree, id, child);
    }
}

fn explicit_search_space(file: SearchSpaceFile) -> (SearchSpace, CorrespondenceTable) {
    let mut pool = CandidatePool::new();
    let ids: Vec<_> = file.candidates.into_iter().map(|g| pool.push(g)).collect();

    let mut space = SearchSpace::new(pool);
    match file.shared {
        Some(entries) => entries.into_iter().for_each(|e| space.push_shared(e)),
        None => ids
            .into_iter()
            .for_each(|candidate| space.push_shared(SearchSpaceEntry { cv_index: 0, candidate })),
    }
    for PhraseEntries { phrase, entries } in file.per_phrase {
        for entry in entries {
            space.push_for(PhraseId(phrase), entry);
        }
    }

    (space, CorrespondenceTable::new(file.correspondence))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search_space::CandidateId;

    const SCENE: &str = r#"{
        "world": { "objects": [ { "name": "box1", "object_type": "box" } ] },
        "phrase": {
            "phrase_type": "PP",
            "text": "near the box",
            "grounding": { "type": "set", "groundings": [
                { "type": "region", "region_type": "near",
                  "object": { "name": "box1", "object_type": "box" } }
            ] },
            "children": [
                { "phrase_type": "IN", "text": "near",
                  "children": [ { "phrase_type": "X", "text": "x" } ] },
                { "phrase_type": "NP", "text": "the box" }
            ]
        }
    }"#;

    #[test]
    fn test_tree_ids_are_preorder() {
        let scene = parse_scene("s.json", SCENE, &SearchSpaceBuilder::default()).unwrap();
        let texts: Vec<&str> = (0..scene.tree.len())
            .map(|i| scene.tree.get(PhraseId(i)).unwrap().text.as_str())
            .collect();
        assert_eq!(texts, vec!["near the box", "near", "x", "the box"]);
        assert_eq!(scene.source, "s.json");
    }

    #[test]
    fn test_missing_search_space_is_filled_from_world() {
        let scene = parse_scene("s.json", SCENE, &SearchSpaceBuilder::default()).unwrap();
        // 1 object × 6 region types, 6 × 5 ordered pairs × 2 constraint types
        assert_eq!(scene.search_space.pool.len(), 6 + 60);
        assert_eq!(scene.correspondence.row(0), Some(&Cv::BINARY[..]));
    }

    #[test]
    fn test_explicit_search_space() {
        let json = r#"{
            "phrase": { "phrase_type": "NP", "text": "box",
                        "children": [ { "phrase_type": "NN", "text": "box" } ] },
            "search_space": {
                "candidates": [
                    { "type": "object", "name": "box1", "object_type": "box" },
                    { "type": "region", "region_type": "near",
                      "object": { "name": "box1", "object_type": "box" } }
                ],
                "per_phrase": [ { "phrase": 1, "entries": [ { "cv_index": 0, "candidate": 1 } ] } ]
            }
        }"#;
        let scene = parse_scene("s", json, &SearchSpaceBuilder::default()).unwrap();
        assert_eq!(scene.search_space.entries_for(PhraseId(0)).len(), 2);
        assert_eq!(
            scene.search_space.entries_for(PhraseId(1)),
            &[SearchSpaceEntry { cv_index: 0, candidate: CandidateId(1) }]
        );
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let loader = SceneLoader::new(vec![PathBuf::from("/definitely/not/here.json")]);
        let err = loader.load_all().unwrap_err();
        assert!(err.downcast_ref::<LoadError>().is_some());
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let loader = SceneLoader::new(vec![path.clone()]);
        match loader.load_scene(&path) {
            Err(LoadError::Parse { .. }) => {}
            other => panic!("expected a parse error, got {other:?}"),
        }
    }
}
