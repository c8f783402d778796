// ============================================================
// Layer 2 — KnowledgeBase
// ============================================================
// The pre-trained tables every run works against:
//
//   words    — word embeddings (question tokens)
//   entities — KG embeddings (answer space)
//   linking  — optional word-space vectors of KG items, used by
//              the entity linking layer
//
// `train` and `test` both load the same files, named in the
// saved run config, so indices line up between the two.

use anyhow::{Context, Result};

use crate::application::train_use_case::KbqaConfig;
use crate::data::embeddings::EmbeddingFileLoader;
use crate::domain::{embedding_table::EmbeddingTable, traits::EmbeddingSource};
use crate::ml::model::PretrainedTables;

pub struct KnowledgeBase {
    pub words:    EmbeddingTable,
    pub entities: EmbeddingTable,
    pub linking:  Option<EmbeddingTable>,
}

impl KnowledgeBase {
    pub fn load(cfg: &KbqaConfig) -> Result<Self> {
        tracing::info!("Loading word embeddings from '{}'", cfg.word_embeddings);
        let words = EmbeddingFileLoader::new(&cfg.word_embeddings)
            .load_table()
            .context("Word embeddings")?;

        tracing::info!("Loading KG embeddings from '{}'", cfg.kg_embeddings);
        let entities = EmbeddingFileLoader::new(&cfg.kg_embeddings)
            .load_table()
            .context("KG embeddings")?;

        let linking = match &cfg.linking_embeddings {
            Some(path) => {
                tracing::info!("Loading entity linking embeddings from '{}'", path);
                Some(EmbeddingFileLoader::new(path).load_table().context("Linking embeddings")?)
            }
            None => None,
        };

        Ok(Self { words, entities, linking })
    }

    pub fn tables(&self) -> PretrainedTables<'_> {
        PretrainedTables {
            words:    &self.words,
            entities: &self.entities,
            linking:  self.linking.as_ref(),
        }
    }
}
