//! Free-text normalization for FAQ matching.
//!
//! [`normalize`] lowercases its input, splits it into word-like tokens, drops
//! stopwords and anything that is not purely alphanumeric, reduces each
//! surviving token to its noun lemma and joins the result with single spaces.
//!
//! ```rust
//! use heartbot_faq::normalizer::normalize;
//!
//! assert_eq!(normalize("What is bpm?"), "bpm");
//! assert_eq!(normalize("Why does my heart beat fast sometimes?"), "heart beat fast sometime");
//! ```
//!
//! The transform is deterministic and idempotent: `normalize(normalize(s))`
//! equals `normalize(s)` for every input.

use std::collections::HashSet;
use std::sync::LazyLock;

/// English stopword list (the NLTK corpus).
const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

static STOPWORD_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS.iter().copied().collect());

/// Irregular plural nouns that suffix rules cannot recover.
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("people", "person"),
    ("geese", "goose"),
];

/// Suffixes whose trailing `es` is dropped (`boxes` → `box`).
const ES_SUFFIXES: &[&str] = &["sses", "xes", "zes", "ches", "shes"];

/// Singular endings that must not lose their final `s`.
const KEEP_S_SUFFIXES: &[&str] = &["ss", "us", "is"];

/// Returns `true` if `token` is in the English stopword set.
pub fn is_stopword(token: &str) -> bool {
    STOPWORD_SET.contains(token)
}

/// Split lowercased text into word-like tokens.
///
/// Chunks are separated on whitespace, stripped of surrounding punctuation,
/// and split at apostrophes so contractions yield their parts (`i'm` →
/// `i`, `m`). Tokens may still contain inner punctuation (`72.5`); callers
/// decide whether to keep them.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split_whitespace()
        .map(|chunk| chunk.trim_matches(|c: char| !c.is_alphanumeric()))
        .flat_map(|chunk| chunk.split(['\'', '\u{2019}']))
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reduce a lowercase token to its noun lemma.
///
/// Numbers and tokens shorter than four characters are returned unchanged.
pub fn lemmatize(token: &str) -> String {
    if let Some((_, lemma)) = IRREGULAR_PLURALS.iter().find(|(plural, _)| *plural == token) {
        return (*lemma).to_string();
    }
    if token.chars().count() < 4 || !token.chars().all(char::is_alphabetic) {
        return token.to_string();
    }
    if let Some(stem) = token.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if ES_SUFFIXES.iter().any(|suffix| token.ends_with(suffix)) {
        return token[..token.len() - 2].to_string();
    }
    if KEEP_S_SUFFIXES.iter().any(|suffix| token.ends_with(suffix)) {
        return token.to_string();
    }
    match token.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => token.to_string(),
    }
}

/// Normalize free text into a space-separated sequence of content lemmas.
pub fn normalize(text: &str) -> String {
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().all(char::is_alphanumeric) && !is_stopword(t))
        .map(|t| lemmatize(&t))
        // A lemma can itself be a stopword (`outs` → `out`).
        .filter(|lemma| !is_stopword(lemma))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n"), "");
    }

    #[test]
    fn drops_stopwords_and_punctuation() {
        assert_eq!(normalize("What is bpm?"), "bpm");
        assert_eq!(normalize("Hello!"), "hello");
        assert_eq!(normalize("What should I do if my heart rate is too high?"), "heart rate high");
    }

    #[test]
    fn contractions_split_into_stopwords() {
        assert_eq!(normalize("I'm scared"), "scared");
        assert_eq!(normalize("Don't panic"), "panic");
    }

    #[test]
    fn tokens_with_inner_punctuation_are_dropped() {
        assert_eq!(normalize("BPM: 72.5"), "bpm");
        assert_eq!(normalize("heart-rate"), "");
    }

    #[test]
    fn plural_nouns_are_lemmatized() {
        assert_eq!(normalize("What causes irregular heartbeats?"), "cause irregular heartbeat");
        assert_eq!(normalize("climbing stairs"), "climbing stair");
        assert_eq!(normalize("What are signs of a heart attack?"), "sign heart attack");
    }

    #[test]
    fn lemmatize_rules() {
        assert_eq!(lemmatize("arteries"), "artery");
        assert_eq!(lemmatize("boxes"), "box");
        assert_eq!(lemmatize("classes"), "class");
        assert_eq!(lemmatize("stress"), "stress");
        assert_eq!(lemmatize("virus"), "virus");
        assert_eq!(lemmatize("diagnosis"), "diagnosis");
        assert_eq!(lemmatize("children"), "child");
        assert_eq!(lemmatize("bus"), "bus");
        assert_eq!(lemmatize("120"), "120");
    }

    #[test]
    fn lemma_that_is_a_stopword_is_dropped() {
        assert_eq!(normalize("outs"), "");
    }

    #[test]
    fn normalization_is_deterministic_and_idempotent() {
        let inputs = [
            "Why does my heart race when I'm scared?",
            "Can dehydration cause fast heart rate?",
            "My heart rate is 120, is that bad?",
            "asdkjashdkj",
            "Classes of arteries, boxes and buses!",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(once, normalize(input));
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn tokenize_keeps_inner_punctuation() {
        assert_eq!(tokenize("BPM: 72.5!"), vec!["bpm", "72.5"]);
        assert_eq!(tokenize("I'm ok"), vec!["i", "m", "ok"]);
    }
}
