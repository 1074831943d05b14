//! Rule-based intent classification

use std::fmt::Debug;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::IntentTag;
use crate::domain::DomainError;

static VISION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(image|photo|picture|screenshot|video|frame|face|selfie|visual)s?\b")
        .expect("vision pattern compiles")
});

static CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)```|\b(code|function|compile|compiler|stack ?trace|regex|sql|python|rust|javascript|typescript|bug|exception|refactor)s?\b",
    )
    .expect("code pattern compiles")
});

static REASONING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(why|analy[sz]e|explain|deepfake|fraud|scam|compare|evaluate|assess|investigate|reason|risk)s?\b|\bis (this|it|that)\b",
    )
    .expect("reasoning pattern compiles")
});

/// Requests longer than this are treated as reasoning work
const LONG_REQUEST_CHARS: usize = 400;

/// Maps request text to an intent tag
#[async_trait]
pub trait IntentClassifier: Send + Sync + Debug {
    async fn classify(&self, text: &str) -> Result<IntentTag, DomainError>;
}

/// Deterministic keyword classifier
///
/// Checks vision, then code, then reasoning cues, defaulting to fast Q&A.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify_text(&self, text: &str) -> IntentTag {
        if VISION_PATTERN.is_match(text) {
            IntentTag::Vision
        } else if CODE_PATTERN.is_match(text) {
            IntentTag::Code
        } else if REASONING_PATTERN.is_match(text) || text.chars().count() > LONG_REQUEST_CHARS {
            IntentTag::Reasoning
        } else {
            IntentTag::FastQa
        }
    }
}

#[async_trait]
impl IntentClassifier for RuleBasedClassifier {
    async fn classify(&self, text: &str) -> Result<IntentTag, DomainError> {
        Ok(self.classify_text(text))
    }
}
