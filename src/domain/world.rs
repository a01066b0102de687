// ============================================================
// Layer 3 — World Model
// ============================================================
// The world is opaque context for training: it is only read,
// by the search-space builder and by feature functions.

use serde::{Deserialize, Serialize};

use crate::domain::grounding::Object;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
    #[serde(default)]
    pub objects: Vec<Object>,
}

impl World {
    pub fn new(objects: Vec<Object>) -> Self {
        Self { objects }
    }

    pub fn object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|o| o.name == name)
    }
}
