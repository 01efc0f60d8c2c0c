//! Authentication gate over an allow-list of sessions.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::json;

use crate::message::{RequestMessage, ResponseMessage};
use crate::pipeline::{ForwardOutcome, Layer};

/// Context key under which the gate records the authenticated principal.
pub const CONTEXT_PRINCIPAL: &str = "auth.principal";

/// Forward-pass gate rejecting requests from unknown sessions.
///
/// The session table is concurrent: sessions can be granted and revoked
/// while traversals are in flight. A known session has its principal
/// recorded into the request context for downstream layers and
/// capabilities; an unknown session is answered with a rejection and never
/// reaches the selector.
#[derive(Default)]
pub struct SessionGateLayer {
    sessions: DashMap<String, String>,
}

impl SessionGateLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow a session, associating it with a principal.
    pub fn allow(&self, session: impl Into<String>, principal: impl Into<String>) {
        self.sessions.insert(session.into(), principal.into());
    }

    /// Revoke a session. Returns whether it was present.
    pub fn revoke(&self, session: &str) -> bool {
        self.sessions.remove(session).is_some()
    }

    pub fn is_allowed(&self, session: &str) -> bool {
        self.sessions.contains_key(session)
    }
}

#[async_trait]
impl Layer for SessionGateLayer {
    fn name(&self) -> &str {
        "session_gate"
    }

    async fn tell(&self, mut request: RequestMessage) -> ForwardOutcome {
        let principal = self
            .sessions
            .get(request.session())
            .map(|entry| entry.value().clone());
        match principal {
            Some(principal) => {
                request.insert_context(CONTEXT_PRINCIPAL, json!(principal));
                ForwardOutcome::Next(request)
            }
            None => {
                log::warn!(
                    "rejecting request {} from unknown session '{}'",
                    request.id(),
                    request.session()
                );
                ForwardOutcome::Respond(ResponseMessage::rejected(
                    request.id(),
                    "unknown session",
                ))
            }
        }
    }
}
