//! Pretrained sentence-embedding encoder.
//!
//! [`FastEmbedEncoder`] runs the all-MiniLM-L6-v2 sentence transformer through
//! `fastembed` (ONNX runtime) and produces 384-dimensional vectors whose
//! cosine similarity tracks meaning rather than shared words, so paraphrases
//! such as "What does beats per minute mean?" land on "What is bpm?".
//!
//! The model is downloaded and cached on first use. [`default_encoder`] picks
//! it when it loads and drops back to the offline [`HashedEncoder`] when it
//! does not (no network, missing cache) or when `HEARTBOT_OFFLINE_ENCODER=1`.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{info, warn};

use crate::encoder::{Encoder, HashedEncoder};

/// Output dimension of all-MiniLM-L6-v2.
pub const MODEL_DIMENSION: usize = 384;

/// Environment switch forcing the offline encoder.
pub const OFFLINE_ENV: &str = "HEARTBOT_OFFLINE_ENCODER";

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("embedding model unavailable: {0}")]
    ModelLoad(String),
}

/// all-MiniLM-L6-v2 behind the [`Encoder`] seam.
///
/// `TextEmbedding::embed` needs `&mut self`, so the model sits in a `Mutex`
/// to keep the encoder shareable across sessions.
pub struct FastEmbedEncoder {
    model: Mutex<fastembed::TextEmbedding>,
}

impl FastEmbedEncoder {
    /// Load (downloading on first use) the all-MiniLM-L6-v2 model.
    pub fn try_new() -> Result<Self, EncoderError> {
        let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false);
        let model = fastembed::TextEmbedding::try_new(options)
            .map_err(|e| EncoderError::ModelLoad(e.to_string()))?;
        info!(dimension = MODEL_DIMENSION, "all-MiniLM-L6-v2 loaded");
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl std::fmt::Debug for FastEmbedEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedEncoder")
            .field("model", &"all-MiniLM-L6-v2")
            .finish()
    }
}

impl Encoder for FastEmbedEncoder {
    fn dimension(&self) -> usize {
        MODEL_DIMENSION
    }

    fn encode_one(&self, text: &str) -> Vec<f32> {
        self.encode(&[text]).pop().unwrap_or_else(|| vec![0.0; MODEL_DIMENSION])
    }

    /// A failed inference yields zero vectors, which score 0.0 against
    /// everything and so fall through to the fallback reply.
    fn encode(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        if texts.is_empty() {
            return Vec::new();
        }
        // A panic inside another encode leaves the model itself intact.
        let mut model = self.model.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match model.embed(texts.to_vec(), None) {
            Ok(embeddings) => embeddings
                .into_iter()
                .map(|mut v| {
                    v.resize(MODEL_DIMENSION, 0.0);
                    v
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, count = texts.len(), "sentence embedding failed");
                vec![vec![0.0; MODEL_DIMENSION]; texts.len()]
            }
        }
    }
}

/// The encoder new services use: the sentence model when it loads, the
/// hashing encoder otherwise.
pub fn default_encoder() -> Arc<dyn Encoder> {
    if offline_requested(std::env::var(OFFLINE_ENV).ok().as_deref()) {
        info!("offline encoder active ({OFFLINE_ENV}=1)");
        return Arc::new(HashedEncoder::default());
    }
    match FastEmbedEncoder::try_new() {
        Ok(encoder) => Arc::new(encoder),
        Err(e) => {
            warn!(error = %e, "falling back to the offline hashing encoder");
            Arc::new(HashedEncoder::default())
        }
    }
}

fn offline_requested(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1") | Some("true"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::default_corpus;
    use crate::index::EmbeddingIndex;
    use crate::responder::{FaqResponder, MatchConfig, MatchOutcome};

    #[test]
    fn offline_switch_values() {
        assert!(offline_requested(Some("1")));
        assert!(offline_requested(Some(" true ")));
        assert!(!offline_requested(Some("0")));
        assert!(!offline_requested(Some("")));
        assert!(!offline_requested(None));
    }

    fn model_responder() -> FaqResponder {
        let encoder = FastEmbedEncoder::try_new().expect("model loads");
        let index = EmbeddingIndex::build(&default_corpus(), Arc::new(encoder));
        FaqResponder::new(index, MatchConfig::default())
    }

    fn nearest_index(r: &mut FaqResponder, text: &str) -> (usize, f32) {
        let answer = r.answer(text, "");
        let result = match answer.outcome {
            MatchOutcome::Matched(result) => result,
            MatchOutcome::FollowUp { matched, .. } => matched,
            MatchOutcome::Fallback { best: Some(result), .. } => result,
            other => panic!("no candidate for {text:?}: {other:?}"),
        };
        (result.index, result.score)
    }

    #[test]
    #[ignore = "downloads the all-MiniLM-L6-v2 model"]
    fn model_vectors_are_unit_length_and_sized() {
        let encoder = FastEmbedEncoder::try_new().expect("model loads");
        let v = encoder.encode_one("What is normal BPM?");
        assert_eq!(v.len(), MODEL_DIMENSION);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }

    #[test]
    #[ignore = "downloads the all-MiniLM-L6-v2 model"]
    fn paraphrases_reach_the_right_entry() {
        let mut r = model_responder();

        let (index, score) = nearest_index(&mut r, "What does beats per minute mean?");
        assert!([5, 6].contains(&index), "got entry {index}");
        assert!(score >= 0.5, "score {score}");

        let (index, score) = nearest_index(&mut r, "What are the symptoms of a heart attack?");
        assert!([24, 25].contains(&index), "got entry {index}");
        assert!(score >= 0.5, "score {score}");

        let (index, _) = nearest_index(&mut r, "How do I slow down a racing heart?");
        assert!([9, 10, 13].contains(&index), "got entry {index}");
    }

    #[test]
    #[ignore = "downloads the all-MiniLM-L6-v2 model"]
    fn greetings_land_on_greetings() {
        let mut r = model_responder();
        let (index, _) = nearest_index(&mut r, "Hey there");
        assert!(index <= 4, "greeting matched entry {index}");
    }
}
