// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Reads a question/answer dataset stored as a JSON array:
//
//   [
//     { "question": "Who is the mayor of Berlin?",
//       "answers":  ["http://dbpedia.org/resource/Michael_Müller"] },
//     ...
//   ]
//
// Unlike the embedding loader there is nothing to skip here:
// a missing or malformed file is a hard error, because training
// on a silently truncated dataset would be worse than stopping.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::qa_record::QaRecord;
use crate::domain::traits::QaSource;

pub struct JsonDatasetLoader {
    path: PathBuf,
}

impl JsonDatasetLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl QaSource for JsonDatasetLoader {
    fn load_all(&self) -> Result<Vec<QaRecord>> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read dataset '{}'", self.path.display()))?;

        let records: Vec<QaRecord> = serde_json::from_str(&json)
            .with_context(|| format!("Malformed dataset JSON in '{}'", self.path.display()))?;

        tracing::info!("Loaded {} questions from '{}'", records.len(), self.path.display());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loads_records() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"[{{"question": "Who?", "answers": ["a", "b"]}}, {{"question": "What?", "answers": []}}]"#
        )
        .unwrap();

        let records = JsonDatasetLoader::new(f.path()).load_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], QaRecord::new("Who?", vec!["a", "b"]));
        assert!(records[1].answers.is_empty());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{{not json").unwrap();
        assert!(JsonDatasetLoader::new(f.path()).load_all().is_err());
    }
}
