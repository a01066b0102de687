// ============================================================
// Layer 3 — Phrase Tree
// ============================================================
// A parsed natural-language phrase is a tree. Each node carries
// the phrase type, its text (used only for diagnostics) and the
// annotated ground-truth grounding for that span.
//
// The tree owns all of its nodes in one arena (a Vec), and
// children are referenced by `PhraseId`. This gives each phrase
// a stable identity that search spaces can be keyed on, without
// any shared ownership between parent and child.
//
//   PhraseTree
//     nodes[0]  ← root
//       children: [1, 3]
//     nodes[1]
//       children: [2]
//     ...
//
// Reference: Rust Book §8 (Vectors)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::grounding::Grounding;

/// Index of a phrase inside its `PhraseTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PhraseId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    pub phrase_type: String,
    pub text:        String,
    pub grounding:   Option<Grounding>,
    children:        Vec<PhraseId>,
}

impl Phrase {
    pub fn new(phrase_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            phrase_type: phrase_type.into(),
            text:        text.into(),
            grounding:   None,
            children:    Vec::new(),
        }
    }

    pub fn with_grounding(mut self, grounding: Grounding) -> Self {
        self.grounding = Some(grounding);
        self
    }

    /// Child ids in left-to-right order
    pub fn children(&self) -> &[PhraseId] {
        &self.children
    }

    /// Lower-cased words of the phrase text
    pub fn words(&self) -> impl Iterator<Item = String> + '_ {
        self.text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
    }
}

impl fmt::Display for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(\"{}\")", self.phrase_type, self.text)
    }
}

/// Arena-owned phrase tree. Node 0 is always the root.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseTree {
    nodes: Vec<Phrase>,
}

impl PhraseTree {
    pub fn new(root: Phrase) -> Self {
        Self { nodes: vec![Phrase { children: Vec::new(), ..root }] }
    }

    pub fn root(&self) -> PhraseId {
        PhraseId(0)
    }

    /// Append `phrase` as the last child of `parent`.
    ///
    /// Panics if `parent` does not belong to this tree, the same way
    /// slice indexing panics on an out-of-range index.
    pub fn add_child(&mut self, parent: PhraseId, phrase: Phrase) -> PhraseId {
        let id = PhraseId(self.nodes.len());
        self.nodes.push(Phrase { children: Vec::new(), ..phrase });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn get(&self, id: PhraseId) -> Option<&Phrase> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids in depth-first pre-order (parent before children,
    /// children left to right)
    pub fn preorder(&self) -> Vec<PhraseId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.get(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_keep_insertion_order() {
        let mut tree = PhraseTree::new(Phrase::new("VP", "go near the box"));
        let a = tree.add_child(tree.root(), Phrase::new("VB", "go"));
        let b = tree.add_child(tree.root(), Phrase::new("PP", "near the box"));
        let c = tree.add_child(b, Phrase::new("NP", "the box"));

        assert_eq!(tree.get(tree.root()).unwrap().children(), &[a, b]);
        assert_eq!(tree.preorder(), vec![PhraseId(0), a, b, c]);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_new_root_drops_foreign_children() {
        let mut other = PhraseTree::new(Phrase::new("NP", "x"));
        other.add_child(other.root(), Phrase::new("NN", "x"));
        let root = other.get(other.root()).unwrap().clone();

        let tree = PhraseTree::new(root);
        assert!(tree.get(tree.root()).unwrap().children().is_empty());
    }

    #[test]
    fn test_words_are_lowercased() {
        let p = Phrase::new("PP", "Near the Red-Box");
        let words: Vec<String> = p.words().collect();
        assert_eq!(words, vec!["near", "the", "red", "box"]);
        assert_eq!(p.to_string(), "PP(\"Near the Red-Box\")");
    }
}
