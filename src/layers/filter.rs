//! Reverse-pass content filter.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::config::FilterConfig;
use crate::error::ConfigError;
use crate::message::ResponseMessage;
use crate::pipeline::{Layer, ReverseOutcome};

/// Metadata flag set on replaced responses.
pub const META_FILTERED: &str = "filtered";

// Credential-shaped output no capability should be echoing back.
static BUILTIN_DENY: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\bsk-[A-Za-z0-9]{16,}\b").unwrap(),
        Regex::new(r"\bAKIA[0-9A-Z]{16}\b").unwrap(),
        Regex::new(r"(?i)api[_-]?key\s*[:=]\s*\S+").unwrap(),
    ]
});

/// Replaces disallowed response content with a canned refusal.
///
/// Runs on the reverse pass only; the forward pass is untouched. A match
/// replaces the whole content rather than redacting in place, and marks the
/// response metadata so downstream observers can tell.
pub struct ResponseFilterLayer {
    deny: Vec<Regex>,
    refusal: String,
}

impl ResponseFilterLayer {
    pub fn new(deny: Vec<Regex>, refusal: impl Into<String>) -> Self {
        Self {
            deny,
            refusal: refusal.into(),
        }
    }

    /// Filter with the built-in credential patterns.
    pub fn with_builtin_patterns() -> Self {
        Self::new(BUILTIN_DENY.clone(), FilterConfig::default().refusal_message)
    }

    /// Compile a filter from configuration.
    pub fn from_config(config: &FilterConfig) -> Result<Self, ConfigError> {
        let mut deny = Vec::with_capacity(config.deny_patterns.len());
        for pattern in &config.deny_patterns {
            let compiled = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            deny.push(compiled);
        }
        Ok(Self::new(deny, config.refusal_message.clone()))
    }
}

#[async_trait]
impl Layer for ResponseFilterLayer {
    fn name(&self) -> &str {
        "response_filter"
    }

    async fn respond(&self, mut response: ResponseMessage) -> ReverseOutcome {
        if self.deny.iter().any(|p| p.is_match(&response.content)) {
            log::warn!(
                "response to request {} matched a deny pattern, replacing",
                response.request_id()
            );
            response.content = self.refusal.clone();
            response.metadata.insert(META_FILTERED.to_string(), json!(true));
            ReverseOutcome::Replace(response)
        } else {
            ReverseOutcome::Pass(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{RequestMessage, ResponseStatus};

    #[tokio::test]
    async fn clean_content_passes_untouched() {
        let layer = ResponseFilterLayer::with_builtin_patterns();
        let request = RequestMessage::new("console", "hello");
        let response = ResponseMessage::reply(&request, "all good");

        match layer.respond(response).await {
            ReverseOutcome::Pass(passed) => assert_eq!(passed.content, "all good"),
            ReverseOutcome::Replace(_) => panic!("clean content must pass"),
        }
    }

    #[tokio::test]
    async fn leaked_credential_is_replaced_with_refusal() {
        let layer = ResponseFilterLayer::with_builtin_patterns();
        let request = RequestMessage::new("console", "hello");
        let response =
            ResponseMessage::reply(&request, "your key is sk-abcdef0123456789ABCD");

        match layer.respond(response).await {
            ReverseOutcome::Replace(replaced) => {
                assert_eq!(replaced.content, "I can't share that.");
                assert_eq!(replaced.metadata[META_FILTERED], json!(true));
                // status and request reference survive the replacement
                assert_eq!(replaced.status, ResponseStatus::Success);
                assert_eq!(replaced.request_id(), request.id());
            }
            ReverseOutcome::Pass(_) => panic!("credential must be filtered"),
        }
    }

    #[tokio::test]
    async fn configured_patterns_apply() {
        let config = FilterConfig {
            deny_patterns: vec!["(?i)forbidden".to_string()],
            refusal_message: "redacted".to_string(),
        };
        let layer = ResponseFilterLayer::from_config(&config).unwrap();
        let request = RequestMessage::new("console", "hello");
        let response = ResponseMessage::reply(&request, "this is FORBIDDEN knowledge");

        match layer.respond(response).await {
            ReverseOutcome::Replace(replaced) => assert_eq!(replaced.content, "redacted"),
            ReverseOutcome::Pass(_) => panic!("configured pattern must filter"),
        }
    }

    #[test]
    fn invalid_configured_pattern_is_a_config_error() {
        let config = FilterConfig {
            deny_patterns: vec!["(unclosed".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            ResponseFilterLayer::from_config(&config),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }
}
