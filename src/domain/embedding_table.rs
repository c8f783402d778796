// ============================================================
// Layer 3 — EmbeddingTable Domain Type
// ============================================================
// A pre-trained embedding vocabulary: either words (GloVe-style)
// or knowledge-graph entities (RDF2vec-style).
//
// Storage is three parallel structures:
//   labels  — index → label        (Vec, position 0 is padding)
//   index   — label → index        (HashMap)
//   vectors — index → vector       (flat row-major Vec<f32>)
//
// Index 0 is reserved for padding / masking. Its label is the
// empty string and its vector is all zeros, so the flat matrix
// can be handed straight to the model as an embedding weight
// of shape [len + 1, dim].
//
// The table is built once at start-up and never mutated.

use std::collections::HashMap;

/// Index reserved for padding. No real label ever maps to it.
pub const PAD_INDEX: usize = 0;

#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    labels:  Vec<String>,
    index:   HashMap<String, usize>,
    vectors: Vec<f32>,
    dim:     usize,
}

impl EmbeddingTable {
    /// An empty table of the given dimensionality (padding row only).
    pub fn with_dim(dim: usize) -> Self {
        Self {
            labels:  vec![String::new()],
            index:   HashMap::new(),
            vectors: vec![0.0; dim],
            dim,
        }
    }

    /// Build a table from (label, vector) pairs in order.
    #[cfg(test)]
    /// Vectors of the wrong length and duplicate labels are ignored.
    pub fn from_entries<I, S>(dim: usize, entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut table = Self::with_dim(dim);
        for (label, vector) in entries {
            table.insert(label, &vector);
        }
        table
    }

    /// Append a new row and return its index.
    /// Returns None when the label already exists or the dimension is wrong.
    pub fn insert(&mut self, label: impl Into<String>, vector: &[f32]) -> Option<usize> {
        let label = label.into();
        if vector.len() != self.dim || self.index.contains_key(&label) {
            return None;
        }
        let idx = self.labels.len();
        self.index.insert(label.clone(), idx);
        self.labels.push(label);
        self.vectors.extend_from_slice(vector);
        Some(idx)
    }

    /// Number of real entries (excluding the padding row)
    pub fn len(&self) -> usize {
        self.labels.len() - 1
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows in the dense matrix, padding row included
    pub fn rows(&self) -> usize {
        self.labels.len()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Label at `idx`; None for padding or out of range.
    #[cfg(test)]
    pub fn label(&self, idx: usize) -> Option<&str> {
        if idx == PAD_INDEX {
            return None;
        }
        self.labels.get(idx).map(String::as_str)
    }

    /// Vector at `idx`. The padding row is a valid all-zero vector.
    pub fn vector(&self, idx: usize) -> Option<&[f32]> {
        if idx >= self.rows() {
            return None;
        }
        Some(&self.vectors[idx * self.dim..(idx + 1) * self.dim])
    }

    /// Dense row-major matrix of shape [rows(), dim()]
    pub fn matrix(&self) -> &[f32] {
        &self.vectors
    }

    /// Collect the rows shared by `self` and `other` (matched on label).
    ///
    /// Returns (self_rows, other_rows, count), each flat row-major,
    /// in the order the labels appear in `self`.
    pub fn aligned_rows(&self, other: &EmbeddingTable) -> (Vec<f32>, Vec<f32>, usize) {
        let mut mine   = Vec::new();
        let mut theirs = Vec::new();
        let mut count  = 0usize;

        for (idx, label) in self.labels.iter().enumerate().skip(1) {
            if let Some(other_idx) = other.index_of(label) {
                mine.extend_from_slice(&self.vectors[idx * self.dim..(idx + 1) * self.dim]);
                if let Some(v) = other.vector(other_idx) {
                    theirs.extend_from_slice(v);
                }
                count += 1;
            }
        }

        (mine, theirs, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_row_is_reserved() {
        let t = EmbeddingTable::from_entries(2, vec![("a", vec![1.0, 2.0])]);
        assert_eq!(t.index_of("a"), Some(1));
        assert_eq!(t.label(PAD_INDEX), None);
        assert_eq!(t.vector(PAD_INDEX), Some(&[0.0, 0.0][..]));
        assert_eq!(t.rows(), 2);
        assert_eq!(t.matrix(), &[0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_duplicates_and_bad_dims_rejected() {
        let mut t = EmbeddingTable::with_dim(2);
        assert_eq!(t.insert("x", &[1.0, 1.0]), Some(1));
        assert_eq!(t.insert("x", &[2.0, 2.0]), None);
        assert_eq!(t.insert("y", &[1.0]), None);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_aligned_rows_follow_own_order() {
        let words = EmbeddingTable::from_entries(1, vec![
            ("b", vec![2.0]),
            ("a", vec![1.0]),
            ("z", vec![9.0]),
        ]);
        let kg = EmbeddingTable::from_entries(2, vec![
            ("a", vec![10.0, 11.0]),
            ("b", vec![20.0, 21.0]),
        ]);
        let (w, r, n) = words.aligned_rows(&kg);
        assert_eq!(n, 2);
        assert_eq!(w, vec![2.0, 1.0]);
        assert_eq!(r, vec![20.0, 21.0, 10.0, 11.0]);
    }
}
