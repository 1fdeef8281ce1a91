// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// Word-level vocabulary over lower-cased, whitespace-split text.
//
// Id layout:
//   0 <unk>   1 <pad>   2 <bos>   3 <eos>
//   4..       corpus tokens, most frequent first, ties A→Z
//
// The lookup itself is a `tokenizers` WordLevel model (built and
// persisted by infra::vocab_store); this type wraps it with the
// boundary tokens and the id → token table the embedding needs.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use tokenizers::Tokenizer;

pub const UNK_TOKEN: &str = "<unk>";
pub const PAD_TOKEN: &str = "<pad>";
pub const BOS_TOKEN: &str = "<bos>";
pub const EOS_TOKEN: &str = "<eos>";

/// Reserved tokens in id order.
pub const SPECIAL_TOKENS: [&str; 4] = [UNK_TOKEN, PAD_TOKEN, BOS_TOKEN, EOS_TOKEN];

pub const PAD_ID: u32 = 1;
pub const BOS_ID: u32 = 2;
pub const EOS_ID: u32 = 3;

/// Immutable once built; shared by every batch.
pub struct Vocabulary {
    tokenizer: Tokenizer,
    itos:      Vec<String>,
}

impl Vocabulary {
    /// Wrap a word-level tokenizer, checking the reserved ids.
    pub fn from_tokenizer(tokenizer: Tokenizer) -> Result<Self> {
        let vocab = tokenizer.get_vocab(true);
        for (id, token) in SPECIAL_TOKENS.iter().enumerate() {
            match vocab.get(*token) {
                Some(&got) if got as usize == id => {}
                other => {
                    return Err(anyhow!(
                        "tokenizer maps {token} to {other:?}, expected id {id}"
                    ))
                }
            }
        }

        let mut itos = vec![String::new(); vocab.len()];
        for (token, id) in vocab {
            let slot = itos
                .get_mut(id as usize)
                .ok_or_else(|| anyhow!("tokenizer ids are not contiguous (id {id})"))?;
            *slot = token;
        }

        Ok(Self { tokenizer, itos })
    }

    /// `<bos> token ids… <eos>`
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;

        let mut ids = Vec::with_capacity(encoding.len() + 2);
        ids.push(BOS_ID);
        ids.extend_from_slice(encoding.get_ids());
        ids.push(EOS_ID);
        Ok(ids)
    }

    pub fn len(&self) -> usize {
        self.itos.len()
    }

    /// Token for each id, in id order.
    pub fn tokens(&self) -> &[String] {
        &self.itos
    }
}

/// Corpus tokens ordered the way ids are assigned: descending
/// frequency, then alphabetical. Reserved tokens are excluded.
pub fn ordered_tokens<'a, I>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut freq: HashMap<String, usize> = HashMap::new();
    for text in texts {
        // Char by char, as the tokenizer's Lowercase normalizer does.
        let lowered: String = text.chars().flat_map(char::to_lowercase).collect();
        for word in lowered.split_whitespace() {
            *freq.entry(word.to_string()).or_insert(0) += 1;
        }
    }
    for special in SPECIAL_TOKENS {
        freq.remove(special);
    }

    let mut words: Vec<(String, usize)> = freq.into_iter().collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    words.into_iter().map(|(w, _)| w).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_then_alphabetical() {
        let texts = ["b a c", "A b", "c B d"];
        assert_eq!(ordered_tokens(texts.iter().copied()), ["b", "a", "c", "d"]);
    }

    #[test]
    fn test_lowercasing_is_per_char() {
        // str::to_lowercase would turn a word-final Σ into ς.
        assert_eq!(ordered_tokens(["ΟΔΟΣ"]), ["οδοσ"]);
    }

    #[test]
    fn test_special_tokens_never_counted() {
        let texts = ["<pad> x <unk>"];
        assert_eq!(ordered_tokens(texts.iter().copied()), ["x"]);
    }
}
