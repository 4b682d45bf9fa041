//! Curated heart-health FAQ shipped with HeartBot.

use heartbot_types::FaqEntry;

/// Reply used when no FAQ entry is a confident match.
pub const FALLBACK_REPLY: &str =
    "I'm not sure about that, but it sounds important! Can you tell me more?";

/// Follow-up reply for a BPM question asked right after a high-heart-rate topic.
pub const HIGH_BPM_FOLLOW_UP: &str = "Since your heart rate has been running high, drink some water, \
sit somewhere quiet and take slow, deep breaths. If your BPM stays above 100 while resting, talk to a doctor.";

const STATIC_FAQ: &[(&str, &str)] = &[
    (
        "Hello!",
        "Hey there! Welcome to HeartBot, your AI heart health buddy. How can I help you today?",
    ),
    (
        "Hi!",
        "Hi! Glad you're here with HeartBot. What's on your mind about your heart?",
    ),
    (
        "Good morning!",
        "Good morning! Nice to see you. How can HeartBot assist you with your heart health today?",
    ),
    (
        "Good afternoon!",
        "Good afternoon! I'm HeartBot, here to help. What would you like to know about your heart?",
    ),
    (
        "Good evening!",
        "Good evening! Welcome to HeartBot. How can I support your heart health tonight?",
    ),
    (
        "What is normal BPM?",
        "A normal heart rate is between 60 and 100 BPM when you're resting.",
    ),
    (
        "What is bpm?",
        "BPM means 'beats per minute': how many times your heart beats in one minute.",
    ),
    (
        "My heart rate is 120, is that bad?",
        "120 BPM is a bit high if you're resting. Try sitting calmly and taking deep breaths. If it stays high, you should talk to a doctor.",
    ),
    (
        "What happens if my bpm is too low?",
        "If your BPM is below 60 and you feel dizzy or tired, you should get it checked. But some fit people naturally have low BPM.",
    ),
    (
        "Why does my heart beat fast sometimes?",
        "It can happen due to stress, fear, exercise, or caffeine. Usually it's normal if it slows down after some rest.",
    ),
    (
        "How can I calm my heart rate?",
        "Sit down, relax, take slow deep breaths, and drink some water. Avoid stress or caffeine.",
    ),
    (
        "Does coffee increase bpm?",
        "Yes! Coffee has caffeine, which can make your heart beat faster for a while.",
    ),
    (
        "Why does my heart race when I'm scared?",
        "That's normal! Your body releases adrenaline when you're scared, making your heart beat faster.",
    ),
    (
        "What should I do if my heart rate is too high?",
        "Sit quietly, breathe slowly, and relax. If it doesn't come down or you feel unwell, contact a doctor.",
    ),
    (
        "Is 70 bpm good?",
        "Yes! 70 BPM is perfectly normal for most people.",
    ),
    (
        "What is a healthy heart rate for adults?",
        "Most adults have a healthy resting heart rate between 60 and 100 BPM.",
    ),
    (
        "Can emotions change heart rate?",
        "Yes! Happiness, anger, or fear can make your heart beat faster or slower.",
    ),
    (
        "Does exercise increase bpm?",
        "Yes. When you exercise, your heart beats faster to send oxygen to your muscles.",
    ),
    (
        "Why does my heart beat fast after climbing stairs?",
        "That's normal! Your body needs more oxygen, so your heart beats faster to keep up.",
    ),
    (
        "Can dehydration cause fast heart rate?",
        "Yes, if you're dehydrated your heart works harder to pump blood, so BPM can go up.",
    ),
    (
        "Can I check my bpm with my finger?",
        "Yes, you can feel your pulse on your wrist or neck and count beats for 60 seconds.",
    ),
    (
        "What causes irregular heartbeats?",
        "Irregular heartbeats can be caused by stress, lack of sleep, alcohol, or medical conditions like arrhythmia. Consult a doctor if it persists.",
    ),
    (
        "Is it normal to feel my heart pounding?",
        "Yes, if you're active or excited, but if it happens at rest or with dizziness, see a doctor.",
    ),
    (
        "How can I improve my heart health?",
        "Eat a balanced diet, exercise regularly, avoid smoking, and manage stress for better heart health.",
    ),
    (
        "What is a heart attack?",
        "A heart attack occurs when blood flow to the heart is blocked. Symptoms include chest pain, shortness of breath. Seek emergency help immediately.",
    ),
    (
        "What are signs of a heart attack?",
        "Look for chest pain, shortness of breath, arm or jaw discomfort, or nausea. Call emergency services (e.g., 108 in India) right away if you notice these.",
    ),
    (
        "Should I exercise if my heart rate is high?",
        "No, rest and hydrate. If it doesn't normalize, contact a doctor or emergency services.",
    ),
    (
        "What to do if I feel chest pain?",
        "Stop what you're doing, sit down, and call emergency services (e.g., 108 in India) if the pain lasts more than a few minutes or worsens.",
    ),
];

/// The static FAQ corpus, in its fixed order.
pub fn default_corpus() -> Vec<FaqEntry> {
    STATIC_FAQ
        .iter()
        .map(|(question, answer)| FaqEntry::new(*question, *answer))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;

    #[test]
    fn corpus_has_all_curated_entries() {
        let corpus = default_corpus();
        assert_eq!(corpus.len(), 28);
        assert_eq!(corpus[0].question, "Hello!");
        assert_eq!(corpus[6].question, "What is bpm?");
    }

    #[test]
    fn every_question_has_content_after_normalization() {
        for entry in default_corpus() {
            assert!(!normalize(&entry.question).is_empty(), "{:?}", entry.question);
            assert!(!entry.answer.is_empty());
        }
    }
}
