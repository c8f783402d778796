use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One contrastive training sample: a question paired with a
/// target entity vector and a +1 (positive) / -1 (negative) indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleItem {
    pub question:  Vec<u32>,
    pub target:    Vec<f32>,
    pub indicator: f32,
}

/// A question with the indices of all its answer entities.
/// Used for multi-hot training and for evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionItem {
    pub question: Vec<u32>,
    pub answers:  Vec<usize>,
}

/// In-memory dataset over any encoded item type.
pub struct KbqaDataset<I> {
    items: Vec<I>,
}

impl<I> KbqaDataset<I> {
    pub fn new(items: Vec<I>) -> Self { Self { items } }
}

impl<I: Clone + Send + Sync> Dataset<I> for KbqaDataset<I> {
    fn get(&self, index: usize) -> Option<I> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
