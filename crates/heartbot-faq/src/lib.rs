//! `heartbot-faq` – the FAQ chatbot engine.
//!
//! Answers free-text heart-health questions by nearest-neighbour lookup over
//! a curated FAQ corpus.
//!
//! # Modules
//!
//! - [`normalizer`] – lowercasing, tokenization, stopword removal and noun
//!   lemmatization of free text.
//! - [`encoder`] – the [`Encoder`][encoder::Encoder] seam and the offline
//!   [`HashedEncoder`][encoder::HashedEncoder].
//! - [`model`] – [`FastEmbedEncoder`][model::FastEmbedEncoder]: the
//!   all-MiniLM-L6-v2 sentence model, and [`default_encoder`][model::default_encoder].
//! - [`index`] – [`EmbeddingIndex`][index::EmbeddingIndex]: the static corpus
//!   plus per-session learned entries, with index-aligned vectors.
//! - [`matcher`] – cosine similarity and first-maximum nearest neighbour.
//! - [`responder`] – [`FaqResponder`][responder::FaqResponder]: threshold
//!   acceptance, fallback learning and follow-up rules.
//! - [`conversation`] – [`ConversationSession`][conversation::ConversationSession]:
//!   the per-user transcript and last-topic context.
//! - [`corpus`] – the curated FAQ entries and canned replies.

pub mod conversation;
pub mod corpus;
pub mod encoder;
pub mod index;
pub mod matcher;
pub mod model;
pub mod normalizer;
pub mod responder;

pub use conversation::{ConversationSession, Exchange};
pub use corpus::{FALLBACK_REPLY, default_corpus};
pub use encoder::{Encoder, HashedEncoder};
pub use index::EmbeddingIndex;
pub use matcher::{SimilarityResult, best_match, cosine_similarity};
pub use model::{EncoderError, FastEmbedEncoder, default_encoder};
pub use normalizer::normalize;
pub use responder::{Answer, FaqResponder, FollowUpRule, MatchConfig, MatchOutcome};
