use burn::{
    module::Param,
    nn::{
        gru::{Gru, GruConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
    },
    prelude::*,
};

use crate::data::batcher::{QuestionBatch, SampleBatch};
use crate::domain::embedding_table::EmbeddingTable;
use crate::ml::loss::{multi_hot_loss, samples_loss};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct KbqaModelConfig {
    /// Word table rows, padding included
    pub vocab_size:    usize,
    pub word_dim:      usize,
    /// Hidden size of the intermediate GRU layers
    pub rnn_units:     usize,
    /// Number of intermediate GRU layers before the KG-sized one
    pub encoder_depth: usize,
    /// KG embedding dimension; the final GRU outputs this size
    pub kg_dim:        usize,
    /// Score the hidden vector against every entity (multi-hot variant)
    pub score_entities: bool,
    #[config(default = 0.0)]
    pub dropout:       f64,
    #[config(default = true)]
    pub train_word_embeddings: bool,
}

/// Pre-trained tables the model is initialised from.
pub struct PretrainedTables<'a> {
    pub words:    &'a EmbeddingTable,
    pub entities: &'a EmbeddingTable,
    /// Word-space vectors of KG items, enabling the entity linking layer
    pub linking:  Option<&'a EmbeddingTable>,
}

impl KbqaModelConfig {
    pub fn init<B: Backend>(&self, tables: &PretrainedTables, device: &B::Device) -> KbqaModel<B> {
        let mut word_embedding = EmbeddingConfig::new(self.vocab_size, self.word_dim).init(device);
        word_embedding.weight = Param::from_tensor(matrix_tensor(
            tables.words.matrix(), tables.words.rows(), tables.words.dim(), device,
        ));
        if !self.train_word_embeddings {
            word_embedding = word_embedding.no_grad();
        }

        let linking = tables.linking.and_then(|l| {
            if l.dim() != self.word_dim {
                tracing::warn!(
                    "Entity linking disabled: linking vectors have {} dimensions, words have {}",
                    l.dim(),
                    self.word_dim
                );
                return None;
            }
            EntityLinking::from_tables(l, tables.entities, device)
        });
        let input_dim = if linking.is_some() { self.kg_dim } else { self.word_dim };

        // rnn_units × encoder_depth, then one layer of kg_dim
        let mut encoder = Vec::with_capacity(self.encoder_depth + 1);
        let mut d_in = input_dim;
        for _ in 0..self.encoder_depth {
            encoder.push(GruConfig::new(d_in, self.rnn_units, true).init(device));
            d_in = self.rnn_units;
        }
        encoder.push(GruConfig::new(d_in, self.kg_dim, true).init(device));

        let projection = self
            .score_entities
            .then(|| KgProjection::from_table(tables.entities, device));

        KbqaModel {
            word_embedding,
            linking,
            encoder,
            dropout: DropoutConfig::new(self.dropout).init(),
            projection,
        }
    }
}

fn matrix_tensor<B: Backend>(values: &[f32], rows: usize, cols: usize, device: &B::Device) -> Tensor<B, 2> {
    Tensor::from_data(TensorData::new(values.to_vec(), [rows, cols]), device)
}

// ─── EntityLinking ────────────────────────────────────────────────────────────
/// Fixed map from word space into KG space: Wᵀ·R, where W holds the
/// word-space vectors of KG items and R their KG vectors.
#[derive(Module, Debug)]
pub struct EntityLinking<B: Backend> {
    /// [word_dim, kg_dim]
    pub kernel: Param<Tensor<B, 2>>,
}

impl<B: Backend> EntityLinking<B> {
    /// None when the two tables share no label.
    pub fn from_tables(
        word_space: &EmbeddingTable,
        kg_space:   &EmbeddingTable,
        device:     &B::Device,
    ) -> Option<Self> {
        let (w, r, shared) = word_space.aligned_rows(kg_space);
        if shared == 0 {
            tracing::warn!("Entity linking disabled: no labels shared with the KG table");
            return None;
        }
        tracing::info!("Entity linking over {} shared KG items", shared);

        let w = matrix_tensor::<B>(&w, shared, word_space.dim(), device);
        let r = matrix_tensor::<B>(&r, shared, kg_space.dim(), device);
        let kernel = w.transpose().matmul(r);

        Some(Self { kernel: Param::from_tensor(kernel) }.no_grad())
    }

    /// [batch, seq, word_dim] → [batch, seq, kg_dim]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq, word_dim] = x.dims();
        let kernel = self.kernel.val();
        let [_, kg_dim] = kernel.dims();
        x.reshape([batch * seq, word_dim])
            .matmul(kernel)
            .reshape([batch, seq, kg_dim])
    }
}

// ─── KgProjection ─────────────────────────────────────────────────────────────
/// Fixed projection onto the KG embedding matrix: h·Eᵀ scores a hidden
/// vector against every entity (column 0 is the zero padding row).
#[derive(Module, Debug)]
pub struct KgProjection<B: Backend> {
    /// [kg_dim, num_entities + 1]
    pub weight: Param<Tensor<B, 2>>,
}

impl<B: Backend> KgProjection<B> {
    pub fn from_table(entities: &EmbeddingTable, device: &B::Device) -> Self {
        let e = matrix_tensor::<B>(entities.matrix(), entities.rows(), entities.dim(), device);
        Self { weight: Param::from_tensor(e.transpose()) }.no_grad()
    }

    /// [batch, kg_dim] → [batch, num_entities + 1]
    pub fn forward(&self, hidden: Tensor<B, 2>) -> Tensor<B, 2> {
        hidden.matmul(self.weight.val())
    }
}

// ─── KbqaModel ────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct KbqaModel<B: Backend> {
    pub word_embedding: Embedding<B>,
    pub linking:        Option<EntityLinking<B>>,
    pub encoder:        Vec<Gru<B>>,
    pub dropout:        Dropout,
    pub projection:     Option<KgProjection<B>>,
}

impl<B: Backend> KbqaModel<B> {
    /// questions: [batch, seq_len], last_step: [batch, seq_len] → [batch, kg_dim]
    pub fn encode(&self, questions: Tensor<B, 2, Int>, last_step: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, seq_len] = questions.dims();

        let mut x = self.word_embedding.forward(questions);
        if let Some(linking) = &self.linking {
            x = linking.forward(x);
        }
        for layer in &self.encoder {
            x = layer.forward(x, None);
        }

        // Keep only the output at each question's last real token
        let [_, _, hidden] = x.dims();
        let selected = (x * last_step.reshape([batch, seq_len, 1]))
            .sum_dim(1)
            .reshape([batch, hidden]);

        self.dropout.forward(selected)
    }

    /// Hidden vector, or entity scores when the projection is present.
    pub fn forward(&self, questions: Tensor<B, 2, Int>, last_step: Tensor<B, 2>) -> Tensor<B, 2> {
        let hidden = self.encode(questions, last_step);
        match &self.projection {
            Some(projection) => projection.forward(hidden),
            None => hidden,
        }
    }

    /// Per-sample contrastive loss — [batch]
    pub fn forward_samples(&self, batch: SampleBatch<B>) -> Tensor<B, 1> {
        let predicted = self.encode(batch.questions, batch.last_step);
        samples_loss(predicted, batch.targets, batch.indicators)
    }

    /// Per-question multi-hot loss — [batch]
    pub fn forward_multi_hot(&self, batch: QuestionBatch<B>) -> Tensor<B, 1> {
        let scores = self.forward(batch.questions, batch.last_step);
        multi_hot_loss(scores, batch.answers)
    }

    pub fn scores_entities(&self) -> bool {
        self.projection.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tables() -> (EmbeddingTable, EmbeddingTable) {
        let words = EmbeddingTable::from_entries(4, vec![
            ("who", vec![0.1, 0.2, 0.3, 0.4]),
            ("is",  vec![0.5, 0.1, 0.0, 0.2]),
        ]);
        let entities = EmbeddingTable::from_entries(3, vec![
            ("e:a", vec![1.0, 0.0, 0.0]),
            ("e:b", vec![0.0, 1.0, 0.0]),
        ]);
        (words, entities)
    }

    fn config(score_entities: bool) -> KbqaModelConfig {
        KbqaModelConfig::new(3, 4, 5, 2, 3, score_entities)
    }

    fn inputs(device: &<TestBackend as Backend>::Device) -> (Tensor<TestBackend, 2, Int>, Tensor<TestBackend, 2>) {
        let q = Tensor::from_data(TensorData::new(vec![1i64, 2, 0, 2, 0, 0], [2, 3]), device);
        let m = Tensor::from_data(TensorData::new(vec![0.0f32, 1.0, 0.0, 1.0, 0.0, 0.0], [2, 3]), device);
        (q, m)
    }

    #[test]
    fn test_hidden_vector_has_kg_dim() {
        let device = Default::default();
        let (words, entities) = tables();
        let pre = PretrainedTables { words: &words, entities: &entities, linking: None };
        let model: KbqaModel<TestBackend> = config(false).init(&pre, &device);

        let (q, m) = inputs(&device);
        assert_eq!(model.forward(q, m).dims(), [2, 3]);
        assert!(!model.scores_entities());
    }

    #[test]
    fn test_projection_scores_every_entity_row() {
        let device = Default::default();
        let (words, entities) = tables();
        let pre = PretrainedTables { words: &words, entities: &entities, linking: None };
        let model: KbqaModel<TestBackend> = config(true).init(&pre, &device);

        let (q, m) = inputs(&device);
        let scores = model.forward(q, m);
        assert_eq!(scores.dims(), [2, entities.rows()]);

        // Padding column scores against a zero vector
        let values: Vec<f32> = scores.into_data().to_vec().unwrap();
        assert_eq!(values[0], 0.0);
        assert_eq!(values[entities.rows()], 0.0);
    }

    #[test]
    fn test_word_embedding_starts_from_pretrained_vectors() {
        let device = Default::default();
        let (words, entities) = tables();
        let pre = PretrainedTables { words: &words, entities: &entities, linking: None };
        let model: KbqaModel<TestBackend> = config(false).init(&pre, &device);

        let weights: Vec<f32> = model.word_embedding.weight.val().into_data().to_vec().unwrap();
        assert_eq!(weights, words.matrix().to_vec());
    }

    #[test]
    fn test_entity_linking_kernel() {
        let device = Default::default();
        // Two KG items described in a 2-dim word space
        let word_space = EmbeddingTable::from_entries(2, vec![
            ("e:a", vec![1.0, 0.0]),
            ("e:b", vec![0.0, 2.0]),
        ]);
        let (_, entities) = tables();

        let linking = EntityLinking::<TestBackend>::from_tables(&word_space, &entities, &device).unwrap();
        // Wᵀ·R = [[1,0,0],[0,2,0]]
        let kernel: Vec<f32> = linking.kernel.val().into_data().to_vec().unwrap();
        assert_eq!(kernel, vec![1.0, 0.0, 0.0, 0.0, 2.0, 0.0]);

        let x = Tensor::<TestBackend, 3>::from_data(TensorData::new(vec![1.0f32, 1.0], [1, 1, 2]), &device);
        let out: Vec<f32> = linking.forward(x).into_data().to_vec().unwrap();
        assert_eq!(out, vec![1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_entity_linking_requires_shared_labels() {
        let device = Default::default();
        let word_space = EmbeddingTable::from_entries(2, vec![("e:zzz", vec![1.0, 0.0])]);
        let (_, entities) = tables();
        assert!(EntityLinking::<TestBackend>::from_tables(&word_space, &entities, &device).is_none());
    }

    #[test]
    fn test_linking_layer_feeds_kg_dim_into_encoder() {
        let device = Default::default();
        let word_space = EmbeddingTable::from_entries(4, vec![("e:a", vec![1.0, 0.0, 0.0, 0.0])]);
        let (words, entities) = tables();
        let pre = PretrainedTables { words: &words, entities: &entities, linking: Some(&word_space) };
        let model: KbqaModel<TestBackend> = config(false).init(&pre, &device);

        assert!(model.linking.is_some());
        let (q, m) = inputs(&device);
        assert_eq!(model.forward(q, m).dims(), [2, 3]);
    }
}
