// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing what the system works with:
// embedding vocabularies and question/answer records.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs and traits

// Pre-trained word or KG entity embeddings with index mappings
pub mod embedding_table;

// A question and the labels of its answer entities
pub mod qa_record;

// Source abstractions that the data layer implements
pub mod traits;
