// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from files on disk to tensor batches:
//
//   embedding .txt files        dataset .json
//       │                            │
//       ▼                            ▼
//   EmbeddingFileLoader         JsonDatasetLoader
//       │                            │
//       └──────────┬─────────────────┘
//                  ▼
//   split_train_val   → shuffles records into train / validation
//                  ▼
//   DatasetEncoder    → tokenises questions, encodes answers
//                  ▼
//   KbqaDataset       → implements Burn's Dataset trait
//                  ▼
//   Sample/QuestionBatcher → pads and stacks into tensors
//                  ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Parses pre-trained word / KG embedding text files
pub mod embeddings;

/// Reads question/answer datasets from JSON
pub mod loader;

/// Tokenisation and sequence padding
pub mod preprocessor;

/// Turns records into contrastive samples or answer-set items
pub mod encoder;

/// Implements Burn's Dataset trait for encoded items
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits records into train/validation sets
pub mod splitter;
