// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Builds the word-level vocabulary from the corpus texts and
// persists it in HuggingFace tokenizer JSON, so the evaluation
// run encodes text with exactly the ids the checkpoint saw.
//
// The JSON is written by hand (WordLevel model, Lowercase
// normalizer, WhitespaceSplit pre-tokenizer) and read back with
// Tokenizer::from_file.

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use tokenizers::Tokenizer;

use crate::data::vocab::{ordered_tokens, Vocabulary, SPECIAL_TOKENS, UNK_TOKEN};

pub struct VocabStore {
    path: PathBuf,
}

impl VocabStore {
    /// Stores `<dir>/<model_name>.tokenizer.json`.
    pub fn new(dir: impl Into<PathBuf>, model_name: &str) -> Self {
        Self { path: dir.into().join(format!("{model_name}.tokenizer.json")) }
    }

    /// Load the saved vocabulary, or build it from `texts` if none exists.
    pub fn load_or_build<'a, I>(&self, texts: I) -> Result<Vocabulary>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.path.exists() {
            tracing::info!("Loading vocabulary from '{}'", self.path.display());
            self.load()
        } else {
            self.build_and_save(texts)
        }
    }

    pub fn load(&self) -> Result<Vocabulary> {
        let tokenizer = Tokenizer::from_file(&self.path).map_err(|e| {
            anyhow!("Cannot load vocabulary from '{}': {}", self.path.display(), e)
        })?;
        Vocabulary::from_tokenizer(tokenizer)
    }

    /// Count tokens, assign ids, write the tokenizer JSON and reload it.
    pub fn build_and_save<'a, I>(&self, texts: I) -> Result<Vocabulary>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let words = ordered_tokens(texts);

        let mut vocab = serde_json::Map::new();
        for (id, token) in SPECIAL_TOKENS.iter().enumerate() {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        for (offset, word) in words.iter().enumerate() {
            vocab.insert(word.clone(), serde_json::json!(SPECIAL_TOKENS.len() + offset));
        }

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .enumerate()
            .map(|(id, token)| {
                serde_json::json!({
                    "id": id, "content": token, "single_word": false,
                    "lstrip": false, "rstrip": false, "normalized": false, "special": true
                })
            })
            .collect();

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": { "type": "Lowercase" },
            "pre_tokenizer": { "type": "WhitespaceSplit" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        std::fs::write(&self.path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write vocabulary to '{}'", self.path.display()))?;

        tracing::info!(
            "Vocabulary built with {} tokens, saved to '{}'",
            words.len() + SPECIAL_TOKENS.len(),
            self.path.display()
        );

        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::vocab::{BOS_ID, EOS_ID};

    #[test]
    fn test_build_assigns_ids_by_frequency() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path(), "BiLSTMNetwork");
        let vocab = store
            .build_and_save(["Paris is big", "paris is old", "PARIS"])
            .unwrap();

        assert!(dir.path().join("BiLSTMNetwork.tokenizer.json").exists());
        assert_eq!(vocab.len(), 4 + 4);
        assert_eq!(&vocab.tokens()[..6], ["<unk>", "<pad>", "<bos>", "<eos>", "paris", "is"]);

        let ids = vocab.encode("PARIS is unknownword").unwrap();
        assert_eq!(ids, vec![BOS_ID, 4, 5, 0, EOS_ID]);
    }

    #[test]
    fn test_load_or_build_reuses_saved_file() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path(), "m");
        store.build_and_save(["alpha beta beta"]).unwrap();

        // A different corpus must not change the stored ids.
        let vocab = store.load_or_build(["gamma gamma gamma"]).unwrap();
        assert_eq!(vocab.tokens()[4], "beta");
        assert_eq!(vocab.encode("gamma").unwrap()[1], 0);
    }

    #[test]
    fn test_counting_and_encoding_lowercase_alike() {
        let dir   = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path(), "m");
        let vocab = store.build_and_save(["ΟΔΟΣ"]).unwrap();
        assert_eq!(vocab.encode("ΟΔΟΣ").unwrap(), vec![BOS_ID, 4, EOS_ID]);
    }
}
