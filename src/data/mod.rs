// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From scene files on disk to labelled training examples:
//
//   scene .json files
//       │
//       ▼
//   SceneLoader        → parses the world, the phrase tree and
//       │                the search space (or fills one with
//       │                SearchSpaceBuilder)
//       ▼
//   ExampleScraper     → walks every phrase tree and pairs each
//       │                phrase with each candidate, labelled by
//       │                the phrase's ground truth
//       ▼
//   split_holdout      → optional seeded hold-out set
//       │
//       ▼
//   Vec<LabeledExample> → handed to the trainer and evaluator
//
// Examples borrow from the loaded scenes; nothing here copies a
// grounding or a phrase.
//
// Reference: Rust Book §10.3 (Lifetimes)
//            Rust Book §13 (Iterators and Closures)

/// Labelled example and the context features look at
pub mod example;

/// Reads scene files into domain scenes
pub mod loader;

/// Fills a search space from a world
pub mod search_builder;

/// Turns scenes into labelled examples
pub mod scraper;

/// Seeded train / hold-out split
pub mod splitter;
