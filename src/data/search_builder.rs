// ============================================================
// Layer 4 — Search Space Builder
// ============================================================
// Fills a search space from a world when a scene file does not
// carry one of its own. Enumeration order is fixed, so the same
// world always yields the same candidate order:
//
//   for each object, for each region type:
//       Region(region type, object)
//   for each constraint type, for each ordered pair (p, c) of
//   distinct regions from the first step:
//       Constraint(constraint type, p, c)
//
// Every candidate is shared by all phrases and uses
// correspondence row 0, the binary {False, True} label set.

use serde::{Deserialize, Serialize};

use crate::domain::grounding::{Constraint, Grounding, Region};
use crate::domain::search_space::{CandidatePool, CorrespondenceTable, SearchSpace, SearchSpaceEntry};
use crate::domain::world::World;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpaceBuilder {
    pub region_types:     Vec<String>,
    pub constraint_types: Vec<String>,
}

impl Default for SearchSpaceBuilder {
    fn default() -> Self {
        Self {
            region_types: ["near", "far", "left", "right", "front", "back"]
                .into_iter()
                .map(String::from)
                .collect(),
            constraint_types: ["inside", "outside"].into_iter().map(String::from).collect(),
        }
    }
}

impl SearchSpaceBuilder {
    pub fn fill(&self, world: &World) -> (SearchSpace, CorrespondenceTable) {
        let regions: Vec<Region> = world
            .objects
            .iter()
            .flat_map(|object| {
                self.region_types
                    .iter()
                    .map(move |region_type| Region::new(region_type.clone(), object.clone()))
            })
            .collect();

        let mut pool = CandidatePool::new();
        let mut ids  = Vec::new();
        for region in &regions {
            ids.push(pool.push(Grounding::Region(region.clone())));
        }
        for constraint_type in &self.constraint_types {
            for (i, parent) in regions.iter().enumerate() {
                for (j, child) in regions.iter().enumerate() {
                    if i == j {
                        continue;
                    }
                    ids.push(pool.push(Grounding::Constraint(Constraint::new(
                        constraint_type.clone(),
                        parent.clone(),
                        child.clone(),
                    ))));
                }
            }
        }

        let mut space = SearchSpace::new(pool);
        for candidate in ids {
            space.push_shared(SearchSpaceEntry { cv_index: 0, candidate });
        }

        tracing::debug!(
            "Filled search space: {} candidates from {} objects",
            space.pool.len(),
            world.objects.len()
        );
        (space, CorrespondenceTable::default())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grounding::Object;
    use crate::domain::phrase::PhraseId;

    #[test]
    fn test_candidate_counts() {
        let world = World::new(vec![Object::new("a", "box"), Object::new("b", "crate")]);
        let builder = SearchSpaceBuilder {
            region_types:     vec!["near".into(), "far".into()],
            constraint_types: vec!["inside".into()],
        };
        let (space, table) = builder.fill(&world);

        // 2 objects × 2 region types = 4 regions; 4 × 3 ordered pairs = 12 constraints
        assert_eq!(space.pool.len(), 16);
        assert_eq!(space.entries_for(PhraseId(5)).len(), 16);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_regions_come_first_in_world_order() {
        let world = World::new(vec![Object::new("a", "box"), Object::new("b", "crate")]);
        let (space, _) = SearchSpaceBuilder::default().fill(&world);
        let first = space.entries_for(PhraseId(0))[0];
        match space.pool.get(first.candidate) {
            Some(Grounding::Region(r)) => {
                assert_eq!(r.region_type, "near");
                assert_eq!(r.object.name, "a");
            }
            other => panic!("expected a region, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_world_has_no_candidates() {
        let (space, _) = SearchSpaceBuilder::default().fill(&World::default());
        assert!(space.pool.is_empty());
    }
}
