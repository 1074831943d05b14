//! Semantic cache endpoint types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct CacheQueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheInvalidateRequest {
    /// Substring of the normalized query; `*` or absent clears everything
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheInvalidateResponse {
    pub invalidated: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarmupEntry {
    pub query: String,
    pub response: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheWarmupRequest {
    pub entries: Vec<WarmupEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheWarmupResponse {
    pub stored: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidate_pattern_is_optional() {
        let request: CacheInvalidateRequest = serde_json::from_str("{}").unwrap();
        assert!(request.pattern.is_none());
    }

    #[test]
    fn test_warmup_accepts_structured_responses() {
        let request: CacheWarmupRequest = serde_json::from_str(
            r#"{"entries": [{"query": "q", "response": {"response": "a", "cached": false}}]}"#,
        )
        .unwrap();

        assert_eq!(request.entries.len(), 1);
        assert!(request.entries[0].response.is_object());
    }
}
