// ============================================================
// Layer 3 — QaRecord Domain Type
// ============================================================
// One raw question with its set of answer entities, exactly as
// stored in the dataset JSON:
//
//   { "question": "Who founded ...?", "answers": ["http://dbpedia.org/resource/X"] }
//
// Answers are KG entity labels. Some of them may have no
// pre-trained embedding; the encoder decides what to do with those.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRecord {
    /// The natural language question
    pub question: String,

    /// Labels of all entities that answer the question
    #[serde(default)]
    pub answers: Vec<String>,
}

impl QaRecord {
    #[cfg(test)]
    pub fn new<S: Into<String>>(question: impl Into<String>, answers: Vec<S>) -> Self {
        Self {
            question: question.into(),
            answers:  answers.into_iter().map(Into::into).collect(),
        }
    }

    /// The answer used as the positive target in contrastive training
    pub fn first_answer(&self) -> Option<&str> {
        self.answers.first().map(String::as_str)
    }
}
