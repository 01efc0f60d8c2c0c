//! Request and response value types carried through the pipeline.
//!
//! A [`RequestMessage`] travels forward through the layer chain; the matching
//! [`ResponseMessage`] travels back through the same chain in reverse. One
//! traversal owns its messages exclusively: there is no shared per-request
//! state between concurrent traversals.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RequestMessage
// ---------------------------------------------------------------------------

/// One unit of user intent entering the system.
///
/// Identifier and originating session are fixed at construction and have no
/// setters: a layer may replace the content or grow the context map, but it
/// cannot re-identify the request mid-traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMessage {
    /// Unique identifier, assigned at ingress.
    id: Uuid,
    /// Identifier of the interface/session that produced the request.
    session: String,
    /// Raw content. Structured payloads ride in `context`.
    pub content: String,
    /// Open key/value context accumulated by layers (embeddings,
    /// authentication claims, ...).
    #[serde(default)]
    pub context: HashMap<String, Value>,
    /// Creation timestamp.
    created_at: DateTime<Utc>,
}

impl RequestMessage {
    /// Create a new request at the ingress boundary.
    pub fn new(session: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session: session.into(),
            content: content.into(),
            context: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// The immutable request identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The immutable originating session identifier.
    pub fn session(&self) -> &str {
        &self.session
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Insert a context value, returning the previous value if present.
    pub fn insert_context(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.context.insert(key.into(), value)
    }

    /// Look up a context value.
    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }
}

impl fmt::Display for RequestMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}@{}] {}", self.id, self.session, self.content)
    }
}

// ---------------------------------------------------------------------------
// ResponseMessage
// ---------------------------------------------------------------------------

/// Outcome code carried by every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// A capability produced the response.
    Success,
    /// A layer rejected the request on the forward pass.
    Rejected,
    /// Neither selection stage produced a capability.
    NoCapability,
    /// The selected capability failed or timed out.
    Error,
}

/// The outcome of handling one request.
///
/// Created by the selected capability, or synthesized by a layer that rejects
/// the request early. Always references the request it answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Identifier of the request this response answers.
    request_id: Uuid,
    /// Response payload.
    pub content: String,
    /// Outcome code.
    pub status: ResponseStatus,
    /// Open metadata map (timing, trace spans, producing capability, ...).
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl ResponseMessage {
    /// Create a response with an explicit status.
    pub fn new(request_id: Uuid, status: ResponseStatus, content: impl Into<String>) -> Self {
        Self {
            request_id,
            content: content.into(),
            status,
            metadata: HashMap::new(),
        }
    }

    /// Successful reply to `request`, the constructor capabilities use.
    pub fn reply(request: &RequestMessage, content: impl Into<String>) -> Self {
        Self::new(request.id(), ResponseStatus::Success, content)
    }

    /// Rejection synthesized by a forward-pass layer.
    pub fn rejected(request_id: Uuid, reason: impl Into<String>) -> Self {
        Self::new(request_id, ResponseStatus::Rejected, reason)
    }

    /// Terminal "no suitable capability" outcome.
    pub fn no_capability(request_id: Uuid, reason: impl Into<String>) -> Self {
        Self::new(request_id, ResponseStatus::NoCapability, reason)
    }

    /// Error-status response wrapping a failure message.
    pub fn error(request_id: Uuid, message: impl Into<String>) -> Self {
        Self::new(request_id, ResponseStatus::Error, message)
    }

    /// Identifier of the request this response answers.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Attach a metadata entry, builder-style.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl fmt::Display for ResponseMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content)
    }
}
