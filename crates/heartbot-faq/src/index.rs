//! [`EmbeddingIndex`] – FAQ questions and their embedding vectors.
//!
//! The index holds the shared static corpus followed by any entries appended
//! during a session. Entries and vectors are index-aligned at all times:
//! every append re-encodes the full question list.

use std::sync::Arc;

use heartbot_types::FaqEntry;
use tracing::debug;

use crate::encoder::Encoder;
use crate::matcher::{SimilarityResult, best_match};

pub struct EmbeddingIndex {
    entries: Vec<FaqEntry>,
    static_len: usize,
    vectors: Vec<Vec<f32>>,
    encoder: Arc<dyn Encoder>,
}

impl EmbeddingIndex {
    /// Encode `base` with `encoder` and return the ready index.
    pub fn build(base: &[FaqEntry], encoder: Arc<dyn Encoder>) -> Self {
        let mut index = Self {
            entries: base.to_vec(),
            static_len: base.len(),
            vectors: Vec::new(),
            encoder,
        };
        index.rebuild();
        index
    }

    /// Re-encode every question in the index.
    pub fn rebuild(&mut self) {
        let vectors = self.encoder.encode(&self.questions());
        self.vectors = vectors;
        debug!(
            entries = self.entries.len(),
            dimension = self.encoder.dimension(),
            "faq index rebuilt"
        );
    }

    /// Append a dynamic entry and rebuild. Returns the new corpus length.
    pub fn push(&mut self, entry: FaqEntry) -> usize {
        self.entries.push(entry);
        self.rebuild();
        self.entries.len()
    }

    /// Encode a query with the index's encoder.
    pub fn encode_query(&self, text: &str) -> Vec<f32> {
        self.encoder.encode_one(text)
    }

    /// Nearest entry to `query` by cosine similarity.
    pub fn nearest(&self, query: &[f32]) -> Option<SimilarityResult> {
        best_match(query, &self.vectors)
    }

    pub fn questions(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.question.as_str()).collect()
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&FaqEntry> {
        self.entries.get(index)
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Entries appended after construction, in insertion order.
    pub fn dynamic_entries(&self) -> &[FaqEntry] {
        &self.entries[self.static_len..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::default_corpus;
    use crate::encoder::HashedEncoder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Encoder double that counts how many texts it has encoded.
    struct CountingEncoder {
        calls: AtomicUsize,
    }

    impl Encoder for CountingEncoder {
        fn dimension(&self) -> usize {
            2
        }
        fn encode_one(&self, text: &str) -> Vec<f32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            vec![text.len() as f32, 1.0]
        }
    }

    fn small_base() -> Vec<FaqEntry> {
        vec![
            FaqEntry::new("Hello!", "Hey there!"),
            FaqEntry::new("What is bpm?", "Beats per minute."),
        ]
    }

    #[test]
    fn build_aligns_entries_and_vectors() {
        let index = EmbeddingIndex::build(&default_corpus(), Arc::new(HashedEncoder::default()));
        assert_eq!(index.len(), index.vectors().len());
        assert_eq!(index.len(), index.questions().len());
        assert!(index.dynamic_entries().is_empty());
    }

    #[test]
    fn push_grows_by_one_and_keeps_prior_text() {
        let mut index = EmbeddingIndex::build(&small_base(), Arc::new(HashedEncoder::default()));
        let before: Vec<FaqEntry> = index.entries().to_vec();

        let len = index.push(FaqEntry::new("new question here", "fallback"));

        assert_eq!(len, before.len() + 1);
        assert_eq!(index.vectors().len(), len);
        assert_eq!(&index.entries()[..before.len()], before.as_slice());
        assert_eq!(index.dynamic_entries().len(), 1);
        assert_eq!(index.dynamic_entries()[0].question, "new question here");
    }

    #[test]
    fn push_re_encodes_the_full_corpus() {
        let encoder = Arc::new(CountingEncoder {
            calls: AtomicUsize::new(0),
        });
        let mut index = EmbeddingIndex::build(&small_base(), encoder.clone());
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 2);

        index.push(FaqEntry::new("third", "answer"));
        // 2 from build + 3 from the full rebuild.
        assert_eq!(encoder.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn nearest_finds_exact_question() {
        let index = EmbeddingIndex::build(&small_base(), Arc::new(HashedEncoder::default()));
        let query = index.encode_query("bpm");
        let result = index.nearest(&query).unwrap();
        assert_eq!(result.index, 1);
        assert!((result.score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_index_has_no_nearest() {
        let index = EmbeddingIndex::build(&[], Arc::new(HashedEncoder::default()));
        assert!(index.is_empty());
        assert!(index.nearest(&index.encode_query("bpm")).is_none());
    }
}
