// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums, and traits that define what the
// system talks about: groundings, phrases, worlds, and the
// search spaces that connect them.
//
// Rules for this layer:
//   - NO file I/O
//   - NO model or optimiser code
//   - Only plain data types, their equality rules, and traits
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

// Correspondence-variable labels
pub mod cv;

// Object / Region / Constraint / GroundingSet sum type
pub mod grounding;

// Arena-owned phrase tree
pub mod phrase;

// World model passed through to feature functions
pub mod world;

// Candidate pool, per-phrase search space, correspondence table
pub mod search_space;

// One annotated input (world + phrase tree + search space)
pub mod scene;

// Core abstractions (traits) that other layers implement
pub mod traits;
