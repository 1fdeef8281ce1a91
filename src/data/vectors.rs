// ============================================================
// Layer 4 — Pretrained Word Vectors
// ============================================================
// Reads a GloVe-format text file ("word v1 v2 … vD" per line)
// and lays the vectors out in vocabulary id order. Vocabulary
// items missing from the file keep all-zero rows.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::data::error::CorpusError;

/// Row-major [vocab_size, dim] matrix ready for the embedding table.
#[derive(Debug, Clone)]
pub struct EmbeddingMatrix {
    pub rows:   usize,
    pub dim:    usize,
    pub values: Vec<f32>,
    /// How many vocabulary items were found in the file.
    pub hits:   usize,
}

impl EmbeddingMatrix {
    #[cfg(test)]
    pub fn row(&self, id: usize) -> &[f32] {
        &self.values[id * self.dim..(id + 1) * self.dim]
    }
}

/// Load `path` for the given vocabulary (tokens in id order).
pub fn load_vectors(
    path:   &Path,
    dim:    usize,
    tokens: &[String],
) -> Result<EmbeddingMatrix, CorpusError> {
    if !path.exists() {
        return Err(CorpusError::MissingFile { path: path.display().to_string() });
    }
    let reader = BufReader::new(File::open(path)?);
    read_vectors(reader, &path.display().to_string(), dim, tokens)
}

pub fn read_vectors<R: BufRead>(
    reader: R,
    source: &str,
    dim:    usize,
    tokens: &[String],
) -> Result<EmbeddingMatrix, CorpusError> {
    let index: HashMap<&str, usize> = tokens
        .iter()
        .enumerate()
        .map(|(id, t)| (t.as_str(), id))
        .collect();

    let mut values = vec![0.0f32; tokens.len() * dim];
    let mut hits   = 0usize;

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let mut parts = line.trim_end().split(' ');
        let word = match parts.next() {
            Some(w) if !w.is_empty() => w,
            _ => continue,
        };
        let components: Vec<&str> = parts.collect();
        if components.len() != dim {
            return Err(CorpusError::VectorWidth {
                path:     source.to_string(),
                line:     n + 1,
                token:    word.to_string(),
                expected: dim,
                found:    components.len(),
            });
        }

        let Some(&id) = index.get(word) else { continue };
        let row = &mut values[id * dim..(id + 1) * dim];
        for (slot, raw) in row.iter_mut().zip(components) {
            *slot = raw.parse::<f32>().map_err(|_| CorpusError::VectorValue {
                path:  source.to_string(),
                line:  n + 1,
                value: raw.to_string(),
            })?;
        }
        hits += 1;
    }

    Ok(EmbeddingMatrix { rows: tokens.len(), dim, values, hits })
}
