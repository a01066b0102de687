// ============================================================
// Layer 3 — Scene Domain Type
// ============================================================
// One annotated training input: the world, the phrase tree with
// its ground truth, and the search space filled for that world.
// Everything the scraper reads for one source lives here, so
// examples can borrow from a scene for the whole training run.

use crate::domain::phrase::PhraseTree;
use crate::domain::search_space::{CorrespondenceTable, SearchSpace};
use crate::domain::world::World;

#[derive(Debug, Clone)]
pub struct Scene {
    /// Filename or path, reported with low-confidence examples
    pub source:         String,
    pub world:          World,
    pub tree:           PhraseTree,
    pub search_space:   SearchSpace,
    pub correspondence: CorrespondenceTable,
}
