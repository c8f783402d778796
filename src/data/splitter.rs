// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles records and splits them into training and validation
// sets. The split happens on raw records, before encoding, so a
// question's positive sample and its negatives always land on
// the same side.
//
// The RNG is passed in so a run is reproducible from its seed.

use rand::{seq::SliceRandom, Rng};

/// Shuffle `items` and split off `validation_fraction` of them.
///
/// Returns (train, validation).
pub fn split_train_val<T, R: Rng>(
    mut items:           Vec<T>,
    validation_fraction: f64,
    rng:                 &mut R,
) -> (Vec<T>, Vec<T>) {
    items.shuffle(rng);

    let total    = items.len();
    let n_val    = ((total as f64) * validation_fraction.clamp(0.0, 1.0)).round() as usize;
    let split_at = total - n_val.min(total);

    let val = items.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        items.len(),
        val.len(),
    );

    (items, val)
}
