//! Sentence encoders that map text onto fixed-length vectors.
//!
//! The [`Encoder`] trait is the seam between the FAQ matcher and whatever
//! model produces the embeddings. Implementations must be deterministic: the
//! same text always encodes to the same vector.
//!
//! The production encoder is the sentence model in [`crate::model`].
//! [`HashedEncoder`] is the offline stand-in used in tests and when the model
//! cannot be loaded. It is a bag of normalized terms projected into a fixed
//! number of signed buckets with the hashing trick, then L2-normalized, so
//! two texts sharing their content lemmas land close together regardless of
//! stopwords or plural forms. It has no notion of synonyms.

use crate::normalizer::normalize;

/// Default output dimension of [`HashedEncoder`].
///
/// Wide enough that no two lemmas of the curated corpus share a bucket, so
/// an unrelated word cannot collide its way into a match.
pub const DEFAULT_DIMENSION: usize = 4096;

/// Maps text to dense fixed-length vectors.
pub trait Encoder: Send + Sync {
    /// Length of every vector this encoder produces.
    fn dimension(&self) -> usize;

    /// Encode a single text.
    fn encode_one(&self, text: &str) -> Vec<f32>;

    /// Encode a batch of texts, preserving order.
    fn encode(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.encode_one(t)).collect()
    }
}

/// Feature-hashing encoder over normalized lemmas.
#[derive(Debug, Clone)]
pub struct HashedEncoder {
    dimension: usize,
}

impl HashedEncoder {
    /// Create an encoder producing vectors of `dimension` floats.
    ///
    /// A zero dimension is bumped to one.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for HashedEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl Encoder for HashedEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for term in normalize(text).split(' ').filter(|t| !t.is_empty()) {
            let hash = fnv1a(term.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            // Top bit picks the sign so colliding terms tend to cancel
            // rather than pile up.
            let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
            vector[bucket] += sign;
        }
        l2_normalize(&mut vector);
        vector
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ b as u64).wrapping_mul(PRIME))
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}
