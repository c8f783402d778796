// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer loads its inputs through these traits
// so it never depends on a concrete file format:
//   - EmbeddingFileLoader implements EmbeddingSource
//   - JsonDatasetLoader   implements QaSource

use anyhow::Result;

use crate::domain::embedding_table::EmbeddingTable;
use crate::domain::qa_record::QaRecord;

// ─── EmbeddingSource ──────────────────────────────────────────────────────────
/// Anything that can produce a pre-trained embedding table.
pub trait EmbeddingSource {
    fn load_table(&self) -> Result<EmbeddingTable>;
}

// ─── QaSource ─────────────────────────────────────────────────────────────────
/// Anything that can produce question/answer records.
pub trait QaSource {
    fn load_all(&self) -> Result<Vec<QaRecord>>;
}
