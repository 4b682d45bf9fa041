//! [`FaqResponder`] – turns a free-text question into a reply.
//!
//! # Acceptance policy
//!
//! The question is normalized, encoded and matched against every entry of
//! the session's [`EmbeddingIndex`]:
//!
//! * `score >= threshold` – the matched entry's answer is returned, unless a
//!   [`FollowUpRule`] fires for the previous context.
//! * `score < threshold` – the fallback reply is returned. When learning is
//!   enabled and the normalized question is longer than `min_learn_len`
//!   characters, the raw question is appended to the index with the
//!   fallback as its answer, so the same question later matches that entry.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use heartbot_types::FaqEntry;

use crate::corpus::{FALLBACK_REPLY, HIGH_BPM_FOLLOW_UP};
use crate::index::EmbeddingIndex;
use crate::matcher::SimilarityResult;
use crate::normalizer::normalize;

/// Tunables for the acceptance policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Minimum cosine similarity for a confident match.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Unmatched questions are learned only when their normalized form is
    /// longer than this many characters.
    #[serde(default = "default_min_learn_len")]
    pub min_learn_len: usize,
    /// Append unmatched questions to the session index.
    #[serde(default = "default_learn_unmatched")]
    pub learn_unmatched: bool,
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

fn default_threshold() -> f32 {
    0.5
}
fn default_min_learn_len() -> usize {
    10
}
fn default_learn_unmatched() -> bool {
    true
}
fn default_fallback_reply() -> String {
    FALLBACK_REPLY.to_string()
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            min_learn_len: default_min_learn_len(),
            learn_unmatched: default_learn_unmatched(),
            fallback_reply: default_fallback_reply(),
        }
    }
}

/// Overrides a confident answer when the previous topic and the current
/// question each contain a given token.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUpRule {
    pub context_token: String,
    pub query_token: String,
    pub reply: String,
}

impl FollowUpRule {
    pub fn new(
        context_token: impl Into<String>,
        query_token: impl Into<String>,
        reply: impl Into<String>,
    ) -> Self {
        Self {
            context_token: context_token.into(),
            query_token: query_token.into(),
            reply: reply.into(),
        }
    }

    /// Both arguments are normalized strings.
    pub fn applies(&self, query: &str, context: &str) -> bool {
        has_token(query, &self.query_token) && has_token(context, &self.context_token)
    }
}

fn has_token(normalized: &str, token: &str) -> bool {
    normalized.split_whitespace().any(|t| t == token)
}

/// The rules every responder starts with: a BPM question right after a
/// high-heart-rate topic gets hydration and relaxation advice.
pub fn default_follow_up_rules() -> Vec<FollowUpRule> {
    vec![FollowUpRule::new("high", "bpm", HIGH_BPM_FOLLOW_UP)]
}

/// How a reply was chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// A corpus entry scored at or above the threshold.
    Matched(SimilarityResult),
    /// A confident match was overridden by the follow-up rule at `rule`.
    FollowUp {
        rule: usize,
        matched: SimilarityResult,
    },
    /// Nothing scored high enough. `best` is `None` for an empty corpus.
    Fallback {
        best: Option<SimilarityResult>,
        learned: bool,
    },
}

impl MatchOutcome {
    /// `true` when the reply came from a confident match.
    pub fn is_confident(&self) -> bool {
        !matches!(self, MatchOutcome::Fallback { .. })
    }
}

/// A reply together with how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub reply: String,
    /// The normalized form of the question.
    pub normalized: String,
    pub outcome: MatchOutcome,
}

/// Answers questions from a per-session FAQ index.
pub struct FaqResponder {
    index: EmbeddingIndex,
    config: MatchConfig,
    rules: Vec<FollowUpRule>,
}

impl FaqResponder {
    /// Create a responder with the default follow-up rules.
    pub fn new(index: EmbeddingIndex, config: MatchConfig) -> Self {
        Self {
            index,
            config,
            rules: default_follow_up_rules(),
        }
    }

    /// Replace the follow-up rules.
    pub fn with_rules(mut self, rules: Vec<FollowUpRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Answer `text`, given the normalized topic of the last confident match.
    pub fn answer(&mut self, text: &str, context: &str) -> Answer {
        let normalized = normalize(text);
        let query = self.index.encode_query(&normalized);
        let best = self.index.nearest(&query);

        let confident = best.filter(|r| r.score >= self.config.threshold);
        let Some(matched) = confident else {
            let learned = self.learn(text, &normalized);
            debug!(
                score = best.map(|r| r.score),
                learned,
                "no confident faq match"
            );
            return Answer {
                reply: self.config.fallback_reply.clone(),
                normalized,
                outcome: MatchOutcome::Fallback { best, learned },
            };
        };

        if let Some(rule) = self.rules.iter().position(|r| r.applies(&normalized, context)) {
            debug!(rule, context, "follow-up rule applied");
            return Answer {
                reply: self.rules[rule].reply.clone(),
                normalized,
                outcome: MatchOutcome::FollowUp { rule, matched },
            };
        }

        // `nearest` only returns indices inside the corpus.
        let reply = self
            .index
            .entry(matched.index)
            .map(|e| e.answer.clone())
            .unwrap_or_else(|| self.config.fallback_reply.clone());
        debug!(index = matched.index, score = matched.score, "faq matched");
        Answer {
            reply,
            normalized,
            outcome: MatchOutcome::Matched(matched),
        }
    }

    fn learn(&mut self, text: &str, normalized: &str) -> bool {
        if !self.config.learn_unmatched || normalized.chars().count() <= self.config.min_learn_len {
            return false;
        }
        let len = self
            .index
            .push(FaqEntry::new(text, self.config.fallback_reply.clone()));
        info!(corpus_len = len, "learned unmatched question");
        true
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }
}
