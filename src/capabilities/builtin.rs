//! Reference capabilities shipped with the router.
//!
//! [`PatternCapability`] is the simple-pattern-matcher family from the
//! capability contract: it scores by regex match and replies from a
//! template. [`FallbackChatCapability`] deliberately scores low and exists
//! to be picked by the arbiter when nothing matches confidently. Both are
//! useful as-is in small deployments and as registration fodder in tests.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use super::capability::{Capability, CheckOutcome, Score};
use crate::message::{RequestMessage, ResponseMessage};

// ---------------------------------------------------------------------------
// PatternCapability
// ---------------------------------------------------------------------------

/// Regex-matching capability.
///
/// `check` returns the configured match score when any pattern matches the
/// request content, [`Score::MIN`] otherwise (an explicit low score, not an
/// abstention: the capability did assess the request). The reply template
/// may reference `{content}`, replaced with the request content.
pub struct PatternCapability {
    id: String,
    description: String,
    patterns: Vec<Regex>,
    match_score: Score,
    reply_template: String,
}

impl PatternCapability {
    /// Start building a pattern capability.
    pub fn builder(id: impl Into<String>) -> PatternCapabilityBuilder {
        PatternCapabilityBuilder {
            id: id.into(),
            description: String::new(),
            patterns: Vec::new(),
            match_score: Score::new(0.9),
            reply_template: String::new(),
        }
    }
}

#[async_trait]
impl Capability for PatternCapability {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn check(&self, request: &RequestMessage) -> CheckOutcome {
        if self.patterns.iter().any(|p| p.is_match(&request.content)) {
            CheckOutcome::Score(self.match_score)
        } else {
            CheckOutcome::Score(Score::MIN)
        }
    }

    async fn execute(&self, request: &RequestMessage) -> Result<ResponseMessage, anyhow::Error> {
        let content = self.reply_template.replace("{content}", &request.content);
        Ok(ResponseMessage::reply(request, content))
    }
}

/// Builder for [`PatternCapability`].
pub struct PatternCapabilityBuilder {
    id: String,
    description: String,
    patterns: Vec<Regex>,
    match_score: Score,
    reply_template: String,
}

impl PatternCapabilityBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a pattern. Invalid regexes are rejected at build time, not at
    /// request time.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.patterns.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Score reported when a pattern matches (clamped, default 0.9).
    pub fn match_score(mut self, value: f64) -> Self {
        self.match_score = Score::new(value);
        self
    }

    pub fn reply(mut self, template: impl Into<String>) -> Self {
        self.reply_template = template.into();
        self
    }

    pub fn build(self) -> Arc<PatternCapability> {
        Arc::new(PatternCapability {
            id: self.id,
            description: self.description,
            patterns: self.patterns,
            match_score: self.match_score,
            reply_template: self.reply_template,
        })
    }
}

// ---------------------------------------------------------------------------
// FallbackChatCapability
// ---------------------------------------------------------------------------

/// Response producer for [`FallbackChatCapability`].
pub type Responder = dyn Fn(&RequestMessage) -> String + Send + Sync;

/// Catch-all conversational capability.
///
/// Scores a constant 0.1 for every request: never accepted outright, always
/// a live candidate for the arbiter. The responder closure produces the
/// reply; the default echoes a generic acknowledgement.
pub struct FallbackChatCapability {
    id: String,
    description: String,
    score: Score,
    responder: Box<Responder>,
}

impl FallbackChatCapability {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            score: Score::new(0.1),
            responder: Box::new(|request: &RequestMessage| {
                format!("I heard: {}", request.content)
            }),
        }
    }

    /// Replace the response producer.
    pub fn with_responder(
        mut self,
        responder: impl Fn(&RequestMessage) -> String + Send + Sync + 'static,
    ) -> Self {
        self.responder = Box::new(responder);
        self
    }
}

#[async_trait]
impl Capability for FallbackChatCapability {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn check(&self, _request: &RequestMessage) -> CheckOutcome {
        CheckOutcome::Score(self.score)
    }

    async fn execute(&self, request: &RequestMessage) -> Result<ResponseMessage, anyhow::Error> {
        Ok(ResponseMessage::reply(request, (self.responder)(request)))
    }
}
