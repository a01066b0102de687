// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training pipeline is written against these traits rather
// than concrete loaders, so the input format can change without
// touching the scraper or the trainer:
//   - SceneLoader implements SceneSource (JSON scene files)
//   - FeatureSet implements Persistable (JSON feature lists)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::scene::Scene;

// ─── SceneSource ─────────────────────────────────────────────────────────────
/// Any component that can produce annotated scenes.
pub trait SceneSource {
    /// Load every scene. A single unreadable input fails the whole
    /// call; training must not start on a partial corpus.
    fn load_all(&self) -> Result<Vec<Scene>>;
}

// ─── Persistable ──────────────────────────────────────────────────────────────
/// Any component whose state can be saved and restored from disk.
pub trait Persistable: Sized {
    /// Save this component's state to the given path
    fn save(&self, path: &str) -> Result<()>;

    /// Load a component's state from the given path.
    fn load(path: &str) -> Result<Self>;
}
