//! The terminal layer: delegates to the capability selector.

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::capabilities::selector::META_CAPABILITY;
use crate::capabilities::CapabilitySelector;
use crate::error::SelectorError;
use crate::message::{RequestMessage, ResponseMessage};
use crate::pipeline::{ForwardOutcome, Layer};

/// Terminal pipeline layer wrapping capability selection and execution.
///
/// Always the last layer in the chain. Its forward hook answers every
/// request it sees, so no request passes beyond it; its reverse hook is the
/// default pass-through, since selection happens once on the way in.
/// Selector failures are folded into error-status responses here: the
/// reverse pass, and ultimately the handler, always observe a response.
pub struct SelectorLayer {
    selector: CapabilitySelector,
}

impl SelectorLayer {
    pub fn new(selector: CapabilitySelector) -> Self {
        Self { selector }
    }

    fn response_for(request_id: Uuid, error: SelectorError) -> ResponseMessage {
        match error {
            SelectorError::NoCapabilitySelected { reason } => {
                log::warn!("request {request_id}: no capability selected: {reason}");
                ResponseMessage::no_capability(
                    request_id,
                    format!("no suitable capability: {reason}"),
                )
            }
            SelectorError::ArbiterUnavailable { source } => {
                // same outcome as NoCapabilitySelected for the caller,
                // logged with the cause
                log::error!("request {request_id}: arbiter unavailable: {source:#}");
                ResponseMessage::no_capability(
                    request_id,
                    "no suitable capability: arbiter unavailable",
                )
            }
            SelectorError::CapabilityExecutionFailed { capability, source } => {
                log::error!(
                    "request {request_id}: capability '{capability}' failed: {source:#}"
                );
                ResponseMessage::error(
                    request_id,
                    format!("capability '{capability}' failed to handle the request"),
                )
                .with_metadata(META_CAPABILITY, json!(capability))
            }
            SelectorError::ExecutionTimeout {
                capability,
                timeout_ms,
            } => {
                log::error!(
                    "request {request_id}: capability '{capability}' timed out after {timeout_ms}ms"
                );
                ResponseMessage::error(
                    request_id,
                    format!("capability '{capability}' timed out"),
                )
                .with_metadata(META_CAPABILITY, json!(capability))
            }
        }
    }
}

#[async_trait]
impl Layer for SelectorLayer {
    fn name(&self) -> &str {
        "capability_selector"
    }

    async fn tell(&self, request: RequestMessage) -> ForwardOutcome {
        match self.selector.dispatch(&request).await {
            Ok(response) => ForwardOutcome::Respond(response),
            Err(error) => ForwardOutcome::Respond(Self::response_for(request.id(), error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{Capability, CapabilityRegistry, CheckOutcome};
    use crate::config::SelectorConfig;
    use crate::message::ResponseStatus;
    use std::sync::Arc;

    struct Confident;

    #[async_trait]
    impl Capability for Confident {
        fn id(&self) -> &str {
            "confident"
        }

        fn description(&self) -> &str {
            "always matches"
        }

        async fn check(&self, _request: &RequestMessage) -> CheckOutcome {
            CheckOutcome::score(0.9)
        }

        async fn execute(
            &self,
            request: &RequestMessage,
        ) -> Result<ResponseMessage, anyhow::Error> {
            Ok(ResponseMessage::reply(request, "handled"))
        }
    }

    struct Faulty;

    #[async_trait]
    impl Capability for Faulty {
        fn id(&self) -> &str {
            "faulty"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        async fn check(&self, _request: &RequestMessage) -> CheckOutcome {
            CheckOutcome::score(0.9)
        }

        async fn execute(
            &self,
            _request: &RequestMessage,
        ) -> Result<ResponseMessage, anyhow::Error> {
            anyhow::bail!("broken handler")
        }
    }

    fn layer_with(capability: Arc<dyn Capability>) -> SelectorLayer {
        let registry = Arc::new(CapabilityRegistry::new());
        registry.register(capability).unwrap();
        SelectorLayer::new(CapabilitySelector::new(registry, SelectorConfig::default()))
    }

    #[tokio::test]
    async fn successful_selection_answers_the_request() {
        let layer = layer_with(Arc::new(Confident));
        let request = RequestMessage::new("console", "hello");
        let id = request.id();

        match layer.tell(request).await {
            ForwardOutcome::Respond(response) => {
                assert_eq!(response.request_id(), id);
                assert_eq!(response.content, "handled");
            }
            ForwardOutcome::Next(_) => panic!("selector layer must answer"),
        }
    }

    #[tokio::test]
    async fn execution_failure_becomes_an_error_response() {
        let layer = layer_with(Arc::new(Faulty));
        let request = RequestMessage::new("console", "hello");

        match layer.tell(request).await {
            ForwardOutcome::Respond(response) => {
                assert_eq!(response.status, ResponseStatus::Error);
                assert_eq!(response.metadata[META_CAPABILITY], json!("faulty"));
            }
            ForwardOutcome::Next(_) => panic!("selector layer must answer"),
        }
    }

    #[tokio::test]
    async fn empty_registry_becomes_a_no_capability_response() {
        let registry = Arc::new(CapabilityRegistry::new());
        let layer =
            SelectorLayer::new(CapabilitySelector::new(registry, SelectorConfig::default()));
        let request = RequestMessage::new("console", "hello");

        match layer.tell(request).await {
            ForwardOutcome::Respond(response) => {
                assert_eq!(response.status, ResponseStatus::NoCapability);
            }
            ForwardOutcome::Next(_) => panic!("selector layer must answer"),
        }
    }
}
