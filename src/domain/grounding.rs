// ============================================================
// Layer 3 — Grounding Domain Types
// ============================================================
// A grounding is a structured interpretation of a phrase
// against the world model. Every variant is a plain value:
//
//   Object     — a thing in the world ("the box")
//   Region     — a place relative to an object ("near the box")
//   Constraint — a relation between two regions
//                ("from near the box to the left of the crate")
//   Set        — an ordered collection of groundings; this is
//                how the annotated ground truth of a phrase is held
//
// Grounding is a sum type, so every comparison rule is a
// `match` over the variants. Two groundings are only ever
// compared when they are the same variant.
//
// Reference: Rust Book §6 (Enums and Pattern Matching)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::cv::Cv;

/// A physical object in the world model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub name:        String,
    pub object_type: String,
    #[serde(default)]
    pub position:    [f64; 3],
}

impl Object {
    pub fn new(name: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            name:        name.into(),
            object_type: object_type.into(),
            position:    [0.0; 3],
        }
    }

    pub fn at(mut self, position: [f64; 3]) -> Self {
        self.position = position;
        self
    }
}

/// A spatial region anchored on one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub region_type: String,
    pub object:      Object,
}

impl Region {
    pub fn new(region_type: impl Into<String>, object: Object) -> Self {
        Self { region_type: region_type.into(), object }
    }
}

/// A spatial constraint between a parent and a child region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub constraint_type: String,
    pub parent:          Region,
    pub child:           Region,
}

impl Constraint {
    pub fn new(constraint_type: impl Into<String>, parent: Region, child: Region) -> Self {
        Self { constraint_type: constraint_type.into(), parent, child }
    }
}

/// Ordered collection of groundings (the ground truth at a phrase)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingSet {
    pub groundings: Vec<Grounding>,
}

impl GroundingSet {
    pub fn new(groundings: Vec<Grounding>) -> Self {
        Self { groundings }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Grounding> {
        self.groundings.iter()
    }

    pub fn len(&self) -> usize {
        self.groundings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groundings.is_empty()
    }
}

/// The variant tag of a grounding, used by feature functions
/// and diagnostics without touching the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundingKind {
    Object,
    Region,
    Constraint,
    Set,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Grounding {
    Object(Object),
    Region(Region),
    Constraint(Constraint),
    Set(GroundingSet),
}

impl Grounding {
    pub fn kind(&self) -> GroundingKind {
        match self {
            Grounding::Object(_)     => GroundingKind::Object,
            Grounding::Region(_)     => GroundingKind::Region,
            Grounding::Constraint(_) => GroundingKind::Constraint,
            Grounding::Set(_)        => GroundingKind::Set,
        }
    }

    /// Only a `Set` can carry the ground truth of a phrase
    pub fn as_set(&self) -> Option<&GroundingSet> {
        match self {
            Grounding::Set(set) => Some(set),
            _ => None,
        }
    }

    /// Objects this grounding refers to, outermost first
    pub fn objects(&self) -> Vec<&Object> {
        match self {
            Grounding::Object(o)     => vec![o],
            Grounding::Region(r)     => vec![&r.object],
            Grounding::Constraint(c) => vec![&c.parent.object, &c.child.object],
            Grounding::Set(s)        => s.iter().flat_map(|g| g.objects()).collect(),
        }
    }
}

/// Label `candidate` against the ground truth of a phrase.
///
/// Region and Constraint candidates are compared only against
/// members of the same variant; the label is True on the first
/// match and False otherwise. Any other candidate variant has no
/// correspondence rule and is labelled Unknown.
pub fn cv_for(candidate: &Grounding, truth: &GroundingSet) -> Cv {
    match candidate {
        Grounding::Region(region) => {
            let hit = truth.iter().any(|g| matches!(g, Grounding::Region(r) if r == region));
            if hit { Cv::True } else { Cv::False }
        }
        Grounding::Constraint(constraint) => {
            let hit = truth
                .iter()
                .any(|g| matches!(g, Grounding::Constraint(c) if c == constraint));
            if hit { Cv::True } else { Cv::False }
        }
        Grounding::Object(_) | Grounding::Set(_) => Cv::Unknown,
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "object(name=\"{}\",type=\"{}\",position=({:.2},{:.2},{:.2}))",
            self.name, self.object_type, self.position[0], self.position[1], self.position[2]
        )
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region(type=\"{}\",{})", self.region_type, self.object)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "constraint(type=\"{}\",parent={},child={})",
            self.constraint_type, self.parent, self.child
        )
    }
}

impl fmt::Display for Grounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grounding::Object(o)     => write!(f, "{o}"),
            Grounding::Region(r)     => write!(f, "{r}"),
            Grounding::Constraint(c) => write!(f, "{c}"),
            Grounding::Set(s) => {
                write!(f, "grounding_set[")?;
                for (i, g) in s.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{g}")?;
                }
                write!(f, "]")
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn near(name: &str) -> Region {
        Region::new("near", Object::new(name, "box"))
    }

    #[test]
    fn test_region_matches_same_value() {
        let truth = GroundingSet::new(vec![Grounding::Region(near("box1"))]);
        assert_eq!(cv_for(&Grounding::Region(near("box1")), &truth), Cv::True);
        assert_eq!(cv_for(&Grounding::Region(near("box2")), &truth), Cv::False);
    }

    #[test]
    fn test_comparison_stays_within_variant() {
        // A constraint whose parent is the region in the truth set
        // must not match that region.
        let constraint = Constraint::new("inside", near("box1"), near("box2"));
        let truth = GroundingSet::new(vec![Grounding::Region(near("box1"))]);
        assert_eq!(cv_for(&Grounding::Constraint(constraint.clone()), &truth), Cv::False);

        let truth = GroundingSet::new(vec![
            Grounding::Region(near("box1")),
            Grounding::Constraint(constraint.clone()),
        ]);
        assert_eq!(cv_for(&Grounding::Constraint(constraint), &truth), Cv::True);
    }

    #[test]
    fn test_variants_without_rule_are_unknown() {
        let truth = GroundingSet::new(vec![Grounding::Object(Object::new("box1", "box"))]);
        assert_eq!(cv_for(&Grounding::Object(Object::new("box1", "box")), &truth), Cv::Unknown);
        assert_eq!(cv_for(&Grounding::Set(truth.clone()), &truth), Cv::Unknown);
    }

    #[test]
    fn test_region_equality_includes_object_position() {
        let a = Region::new("near", Object::new("box1", "box").at([1.0, 0.0, 0.0]));
        let b = Region::new("near", Object::new("box1", "box").at([2.0, 0.0, 0.0]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_serde_tagged_format() {
        let g = Grounding::Region(near("box1"));
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["type"], "region");
        assert_eq!(json["region_type"], "near");
        let back: Grounding = serde_json::from_value(json).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn test_display_set() {
        let set = Grounding::Set(GroundingSet::new(vec![Grounding::Region(near("b"))]));
        let text = set.to_string();
        assert!(text.starts_with("grounding_set[region(type=\"near\""));
    }
}
