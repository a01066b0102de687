// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File output shared by the use cases:
//
//   model_store.rs — Model export and import
//                    Writes the feature set and weights as one
//                    JSON document, plus the TrainConfig of the
//                    run. Importing checks that the two agree.
//
//   metrics.rs     — Training metrics logging
//                    Appends one CSV row per optimiser
//                    iteration for plotting convergence.
//
// Reference: Rust Book §9 (Error Handling with anyhow)

/// Model and config persistence
pub mod model_store;

/// Per-iteration metrics CSV logger
pub mod metrics;
