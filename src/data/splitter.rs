// ============================================================
// Layer 4 — Train/Hold-out Splitter
// ============================================================
// Optionally holds back a random share of the scraped examples
// so the evaluator can report accuracy on data the trainer never
// saw.
//
//   train_fraction = 1.0 → everything is trained on, nothing is
//                          held out, order untouched
//   train_fraction < 1.0 → a seeded shuffle picks the hold-out
//
// Both halves keep the scrape order of their members, so the
// example indices in a report still follow the phrase trees.
// The RNG is seeded (StdRng), so the same seed always holds out
// the same examples.
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Split `items` into (train, held_out).
///
/// # Arguments
/// * `items`          - All scraped examples (consumed by this function)
/// * `train_fraction` - Proportion kept for training, clamped to [0, 1]
/// * `seed`           - Seed for the shuffle that chooses the hold-out
pub fn split_holdout<T>(items: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let total = items.len();
    let fraction = train_fraction.clamp(0.0, 1.0);
    if fraction >= 1.0 {
        return (items, Vec::new());
    }

    let split_at = ((total as f64) * fraction).round() as usize;
    let split_at = split_at.min(total);

    // Shuffle positions, not items, so each half can be put back
    // into scrape order afterwards.
    let mut order: Vec<usize> = (0..total).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let mut in_train = vec![false; total];
    for &i in &order[..split_at] {
        in_train[i] = true;
    }

    let mut train    = Vec::with_capacity(split_at);
    let mut held_out = Vec::with_capacity(total - split_at);
    for (item, keep) in items.into_iter().zip(in_train) {
        if keep {
            train.push(item);
        } else {
            held_out.push(item);
        }
    }

    tracing::debug!(
        "Dataset split: {} training, {} held out ({}% / {}%)",
        train.len(),
        held_out.len(),
        (train.len() * 100) / total.max(1),
        (held_out.len() * 100) / total.max(1),
    );

    (train, held_out)
}
