// ============================================================
// Layer 4 — Labelled Training Example
// ============================================================
// One scraped example is a (label, context) pair:
//
//   label   — the correspondence variable of the candidate
//   context — everything a feature function may look at:
//               • the candidate grounding
//               • the phrase it is scored against
//               • the world
//               • the candidate label set (correspondence row)
//               • the source the phrase came from
//               • the ground-truth groundings of the phrase's
//                 children (auxiliary context only)
//
// Examples borrow from the scenes they were scraped from, so the
// scenes must outlive training and evaluation. Nothing in an
// example is mutated after the scraper builds it.

use crate::domain::cv::Cv;
use crate::domain::grounding::Grounding;
use crate::domain::phrase::Phrase;
use crate::domain::world::World;

#[derive(Debug, Clone, PartialEq)]
pub struct ExampleContext<'a> {
    pub grounding: &'a Grounding,
    pub phrase:    &'a Phrase,
    pub world:     &'a World,
    pub cvs:       &'a [Cv],
    pub source:    &'a str,
    pub children:  Vec<&'a Grounding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExample<'a> {
    pub label:   Cv,
    pub context: ExampleContext<'a>,
}

impl<'a> LabeledExample<'a> {
    pub fn new(label: Cv, context: ExampleContext<'a>) -> Self {
        Self { label, context }
    }
}
