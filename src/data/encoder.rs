// ============================================================
// Layer 4 — Dataset Encoder
// ============================================================
// Converts QaRecords into numeric items the batchers understand.
//
// Questions become word index sequences (OOV words dropped).
// Answers are encoded differently depending on what they feed:
//
//   encode_samples         — contrastive training
//       first answer only; 1 positive + K random negatives
//       that all share the same question sequence
//
//   encode_multi_hot       — multi-answer training
//       all in-table answers, question kept only if it has
//       between 1 and max_answers of them
//
//   encode_for_evaluation  — testing
//       all in-table answers, every question kept (a question
//       without any known answer simply counts as a miss)
//
// Negatives are drawn uniformly from the whole entity table and
// independently of the question, so a negative can coincide with
// the positive. Sequences are left unpadded; the batcher pads each
// batch to its own longest question.

use std::collections::BTreeMap;

use rand::Rng;

use crate::data::dataset::{QuestionItem, SampleItem};
use crate::data::preprocessor::Preprocessor;
use crate::domain::embedding_table::EmbeddingTable;
use crate::domain::qa_record::QaRecord;

pub struct DatasetEncoder<'a> {
    words:        &'a EmbeddingTable,
    entities:     &'a EmbeddingTable,
    preprocessor: Preprocessor,
}

impl<'a> DatasetEncoder<'a> {
    pub fn new(words: &'a EmbeddingTable, entities: &'a EmbeddingTable) -> Self {
        Self { words, entities, preprocessor: Preprocessor::new() }
    }

    /// Word indices of the question; OOV words are dropped.
    pub fn encode_question(&self, text: &str) -> Vec<u32> {
        self.preprocessor
            .tokenize(text)
            .iter()
            .filter_map(|w| self.words.index_of(w))
            .map(|idx| idx as u32)
            .collect()
    }

    /// Indices of the answers that have a KG embedding.
    pub fn encode_answers(&self, answers: &[String]) -> Vec<usize> {
        answers.iter().filter_map(|a| self.entities.index_of(a)).collect()
    }

    /// Positive + `negatives` negative samples per question.
    pub fn encode_samples<R: Rng>(
        &self,
        records:   &[QaRecord],
        negatives: usize,
        rng:       &mut R,
    ) -> Vec<SampleItem> {
        let mut items     = Vec::with_capacity(records.len() * (negatives + 1));
        let mut not_found = 0usize;

        for record in records {
            let Some(positive) = record.first_answer().and_then(|a| self.entities.index_of(a)) else {
                not_found += 1;
                continue;
            };
            let question = self.encode_question(&record.question);

            items.push(SampleItem {
                question:  question.clone(),
                target:    self.entity_vector(positive),
                indicator: 1.0,
            });

            for _ in 0..negatives {
                let random_entity = rng.gen_range(1..=self.entities.len());
                items.push(SampleItem {
                    question:  question.clone(),
                    target:    self.entity_vector(random_entity),
                    indicator: -1.0,
                });
            }
        }

        tracing::info!(
            "Encoded {} samples ({} questions dropped: first answer has no KG embedding)",
            items.len(),
            not_found
        );
        items
    }

    /// Questions with 1..=max_answers known answers, for multi-hot training.
    pub fn encode_multi_hot(&self, records: &[QaRecord], max_answers: usize) -> Vec<QuestionItem> {
        let mut items = Vec::new();
        let mut answers_per_question: BTreeMap<usize, usize> = BTreeMap::new();

        for record in records {
            let answers = self.encode_answers(&record.answers);
            if answers.is_empty() || answers.len() > max_answers {
                continue;
            }
            *answers_per_question.entry(answers.len()).or_insert(0) += 1;
            items.push(QuestionItem {
                question: self.encode_question(&record.question),
                answers,
            });
        }

        tracing::info!("Encoded {} of {} questions", items.len(), records.len());
        tracing::debug!("Answers per question: {:?}", answers_per_question);
        items
    }

    /// Every question with all of its known answers.
    pub fn encode_for_evaluation(&self, records: &[QaRecord]) -> Vec<QuestionItem> {
        let items: Vec<QuestionItem> = records
            .iter()
            .map(|r| QuestionItem {
                question: self.encode_question(&r.question),
                answers:  self.encode_answers(&r.answers),
            })
            .collect();

        let unanswerable = items.iter().filter(|i| i.answers.is_empty()).count();
        if unanswerable > 0 {
            tracing::warn!("{} test questions have no answer with a KG embedding", unanswerable);
        }
        items
    }

    fn entity_vector(&self, idx: usize) -> Vec<f32> {
        self.entities
            .vector(idx)
            .map(<[f32]>::to_vec)
            .unwrap_or_else(|| vec![0.0; self.entities.dim()])
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn tables() -> (EmbeddingTable, EmbeddingTable) {
        let words = EmbeddingTable::from_entries(2, vec![
            ("who", vec![0.1, 0.1]),
            ("founded", vec![0.2, 0.2]),
            ("berlin", vec![0.3, 0.3]),
        ]);
        let entities = EmbeddingTable::from_entries(3, vec![
            ("e:a", vec![1.0, 0.0, 0.0]),
            ("e:b", vec![0.0, 1.0, 0.0]),
            ("e:c", vec![0.0, 0.0, 1.0]),
        ]);
        (words, entities)
    }

    #[test]
    fn test_oov_words_are_dropped() {
        let (words, entities) = tables();
        let enc = DatasetEncoder::new(&words, &entities);
        assert_eq!(enc.encode_question("Who founded Zanzibar?"), vec![1, 2]);
    }

    #[test]
    fn test_train_samples_share_question() {
        let (words, entities) = tables();
        let enc     = DatasetEncoder::new(&words, &entities);
        let records = vec![QaRecord::new("who founded berlin", vec!["e:b", "e:a"])];
        let mut rng = StdRng::seed_from_u64(7);

        let k     = 4;
        let items = enc.encode_samples(&records, k, &mut rng);

        assert_eq!(items.len(), k + 1);
        assert!(items.iter().all(|i| i.question == vec![1, 2, 3]));

        let indicators: Vec<f32> = items.iter().map(|i| i.indicator).collect();
        let mut expected = vec![1.0];
        expected.extend(std::iter::repeat(-1.0).take(k));
        assert_eq!(indicators, expected);

        // Positive target is the first answer's vector
        assert_eq!(items[0].target, vec![0.0, 1.0, 0.0]);
        // Negatives are real entity vectors, never the padding row
        assert!(items[1..].iter().all(|i| i.target.iter().sum::<f32>() == 1.0));
    }

    #[test]
    fn test_unknown_first_answer_drops_question() {
        let (words, entities) = tables();
        let enc     = DatasetEncoder::new(&words, &entities);
        let records = vec![
            QaRecord::new("who", vec!["e:unknown", "e:a"]),
            QaRecord::new("who", Vec::<String>::new()),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        assert!(enc.encode_samples(&records, 2, &mut rng).is_empty());
    }

    #[test]
    fn test_multi_hot_filters_by_answer_count() {
        let (words, entities) = tables();
        let enc     = DatasetEncoder::new(&words, &entities);
        let records = vec![
            QaRecord::new("who", vec!["e:a"]),
            QaRecord::new("who", vec!["e:a", "e:b", "e:c"]),
            QaRecord::new("who", vec!["e:missing"]),
        ];
        let items = enc.encode_multi_hot(&records, 2);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].answers, vec![1]);
    }

    #[test]
    fn test_evaluation_retains_unanswerable_questions() {
        let (words, entities) = tables();
        let enc     = DatasetEncoder::new(&words, &entities);
        let records = vec![
            QaRecord::new("who founded berlin", vec!["e:missing"]),
            QaRecord::new("who", vec!["e:c", "e:missing", "e:a"]),
        ];
        let items = enc.encode_for_evaluation(&records);
        assert_eq!(items.len(), 2);
        assert!(items[0].answers.is_empty());
        assert_eq!(items[0].question, vec![1, 2, 3]);
        assert_eq!(items[1].answers, vec![3, 1]);
    }
}
