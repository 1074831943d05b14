//! Intent tags shared by classification and model capabilities

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Closed set of request intents, also used as model capability tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentTag {
    Reasoning,
    Vision,
    Code,
    FastQa,
}

impl IntentTag {
    pub const ALL: [IntentTag; 4] = [Self::Reasoning, Self::Vision, Self::Code, Self::FastQa];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reasoning => "reasoning",
            Self::Vision => "vision",
            Self::Code => "code",
            Self::FastQa => "fast-qa",
        }
    }

    /// Intents whose candidates are ordered most capable first
    pub fn prefers_high_tier(&self) -> bool {
        matches!(self, Self::Reasoning)
    }
}

impl fmt::Display for IntentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentTag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "reasoning" => Ok(Self::Reasoning),
            "vision" => Ok(Self::Vision),
            "code" => Ok(Self::Code),
            "fast-qa" | "fastqa" => Ok(Self::FastQa),
            other => Err(DomainError::validation(format!("Unknown intent tag: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for tag in IntentTag::ALL {
            assert_eq!(tag.to_string().parse::<IntentTag>().unwrap(), tag);
        }
        assert_eq!("fast_qa".parse::<IntentTag>().unwrap(), IntentTag::FastQa);
        assert!("poetry".parse::<IntentTag>().is_err());
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let json = serde_json::to_string(&IntentTag::FastQa).unwrap();
        assert_eq!(json, "\"fast-qa\"");
    }
}
