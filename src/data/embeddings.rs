// ============================================================
// Layer 4 — Embedding File Loader
// ============================================================
// Parses pre-trained embeddings stored as plain text, one entry
// per line:
//
//   <http://dbpedia.org/resource/Berlin> 0.12 -0.40 ... 0.07
//   berlin 0.31 0.02 ... -0.11
//
// The label is everything before the first whitespace. KG dumps
// wrap entity IRIs in angle brackets; those are stripped so the
// labels match the answer strings in the dataset JSON.
//
// Bad lines never abort the load. They are reported with
// tracing::warn! and skipped:
//   - a label with no vector
//   - a value that does not parse as f32
//   - a vector whose length differs from the first good line
//   - a label seen before (the first occurrence wins)
//
// A missing file, or a file with no usable line at all, is an error.

use anyhow::{bail, Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use crate::domain::embedding_table::EmbeddingTable;
use crate::domain::traits::EmbeddingSource;

/// Loads an embedding table from a whitespace-delimited text file.
pub struct EmbeddingFileLoader {
    path: PathBuf,
}

impl EmbeddingFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl EmbeddingSource for EmbeddingFileLoader {
    fn load_table(&self) -> Result<EmbeddingTable> {
        tracing::info!("Loading embeddings from '{}'", self.path.display());
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open embeddings file '{}'", self.path.display()))?;
        parse_embeddings(BufReader::new(file))
            .with_context(|| format!("Cannot load embeddings from '{}'", self.path.display()))
    }
}

/// Parse embeddings from any buffered reader.
pub fn parse_embeddings<R: BufRead>(reader: R) -> Result<EmbeddingTable> {
    let mut table: Option<EmbeddingTable> = None;
    let mut skipped = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Read error at line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let (label, vector) = match parse_line(&line) {
            Ok(entry) => entry,
            Err(reason) => {
                tracing::warn!("Skipping embedding line {}: {}", line_no + 1, reason);
                skipped += 1;
                continue;
            }
        };

        // The first good line fixes the dimensionality
        let table = table.get_or_insert_with(|| EmbeddingTable::with_dim(vector.len()));

        if vector.len() != table.dim() {
            tracing::warn!(
                "Skipping embedding line {}: expected {} dimensions, found {}",
                line_no + 1,
                table.dim(),
                vector.len()
            );
            skipped += 1;
            continue;
        }

        if table.insert(label, &vector).is_none() {
            tracing::warn!("Skipping embedding line {}: duplicate label '{}'", line_no + 1, label);
            skipped += 1;
        }
    }

    let Some(table) = table else {
        bail!("no valid embedding lines ({} skipped)", skipped);
    };

    tracing::info!(
        "Loaded {} embeddings with {} dimensions ({} lines skipped)",
        table.len(),
        table.dim(),
        skipped
    );
    Ok(table)
}

/// Split one line into its (bracket-stripped) label and vector.
fn parse_line(line: &str) -> std::result::Result<(&str, Vec<f32>), String> {
    let mut fields = line.split_whitespace();
    let raw_label  = fields.next().ok_or_else(|| "empty line".to_string())?;
    let label      = strip_brackets(raw_label);

    let vector = fields
        .map(|v| v.parse::<f32>().map_err(|e| format!("bad value '{v}': {e}")))
        .collect::<std::result::Result<Vec<f32>, String>>()?;

    if vector.is_empty() {
        return Err(format!("label '{label}' has no vector"));
    }
    if label.is_empty() {
        return Err("empty label".to_string());
    }
    Ok((label, vector))
}

/// `<http://x>` → `http://x`; labels without both brackets are left alone.
pub fn strip_brackets(label: &str) -> &str {
    label
        .strip_prefix('<')
        .and_then(|l| l.strip_suffix('>'))
        .unwrap_or(label)
}
