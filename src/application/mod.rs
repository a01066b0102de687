// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal per use case (training, or evaluating an exported model).
//
// Rules for this layer:
//   - No model math here (that's Layer 5)
//   - No printing here (that's Layer 1)
//   - No direct file parsing (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Scoring scenes with an exported model
pub mod evaluate_use_case;
