// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Turns a raw question into word tokens and pads token index
// sequences into rectangular batches.
//
// Tokenisation steps (applied in order):
//   1. Lowercase
//   2. Replace punctuation, tab and newline with a space
//      (apostrophes survive, so "who's" stays one token)
//   3. Split on spaces, dropping empty pieces
//
// Padding is "post": real tokens first, zeros after. Index 0 is
// the padding row of every embedding table, so padded positions
// never collide with a real word.

/// Characters removed before splitting
const FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Split a question into lowercase word tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .map(|c| if FILTERS.contains(c) { ' ' } else { c })
            .collect();

        cleaned
            .split(' ')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Pad every sequence with `value` up to the longest one.
///
/// Returns the padded rows and their common length. The length is
/// at least 1 so a batch of empty questions still forms a tensor.
pub fn pad_sequences(sequences: &[&[u32]], value: u32) -> (Vec<Vec<u32>>, usize) {
    let max_len = sequences.iter().map(|s| s.len()).max().unwrap_or(0).max(1);

    let padded = sequences
        .iter()
        .map(|s| {
            let mut row = s.to_vec();
            row.resize(max_len, value);
            row
        })
        .collect();

    (padded, max_len)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        let p = Preprocessor::new();
        assert_eq!(
            p.tokenize("Who is the Mayor of Berlin?"),
            vec!["who", "is", "the", "mayor", "of", "berlin"]
        );
    }

    #[test]
    fn test_keeps_apostrophes() {
        let p = Preprocessor::new();
        assert_eq!(p.tokenize("What's up,\tdoc"), vec!["what's", "up", "doc"]);
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert!(p.tokenize("  ?! ").is_empty());
    }

    #[test]
    fn test_pads_post_to_batch_max() {
        let a: &[u32] = &[5];
        let b: &[u32] = &[1, 2, 3];
        let c: &[u32] = &[];
        let (rows, len) = pad_sequences(&[a, b, c], 0);
        assert_eq!(len, 3);
        assert_eq!(rows, vec![vec![5, 0, 0], vec![1, 2, 3], vec![0, 0, 0]]);
    }

    #[test]
    fn test_all_empty_pads_to_one() {
        let e: &[u32] = &[];
        let (rows, len) = pad_sequences(&[e, e], 0);
        assert_eq!(len, 1);
        assert_eq!(rows, vec![vec![0], vec![0]]);
    }
}
