use crate::db::types::SubmissionType;

pub(crate) const WRITING_TOPICS: [&str; 3] = [
    "Describe your favorite holiday destination and explain why you enjoy it.",
    "What are the advantages and disadvantages of working from home?",
    "Discuss the impact of social media on modern communication.",
];

pub(crate) const LISTENING_TOPICS: [&str; 3] = [
    "Describe a memorable experience from your childhood.",
    "Talk about your career goals and how you plan to achieve them.",
    "Explain the importance of learning a foreign language.",
];

pub(crate) fn topics(exam_type: SubmissionType) -> &'static [&'static str] {
    match exam_type {
        SubmissionType::Writing => &WRITING_TOPICS,
        SubmissionType::Listening => &LISTENING_TOPICS,
    }
}

/// Topic at `index`, or the first topic when the index is out of range.
pub(crate) fn select_topic(exam_type: SubmissionType, index: i64) -> &'static str {
    let topics = topics(exam_type);
    usize::try_from(index).ok().and_then(|i| topics.get(i)).copied().unwrap_or(topics[0])
}
