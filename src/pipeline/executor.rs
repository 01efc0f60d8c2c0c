//! Pipeline executor: drives one request through the layer chain and back.
//!
//! The traversal is an explicit state machine over layer indices, not nested
//! calls: the forward loop records each index it reaches on a stack, and the
//! reverse loop pops that stack. Early rejection at index *i* therefore
//! reverses from *i* with no special casing, and the reverse-traversal
//! contract is testable on its own.

use std::sync::Arc;

use crate::message::{RequestMessage, ResponseMessage};

use super::layer::{ForwardOutcome, Layer, ReverseOutcome};

/// An ordered, immutable chain of layers.
///
/// Built once at configuration time; `handle` takes `&self`, so one pipeline
/// (usually behind an `Arc`) serves any number of concurrent traversals.
/// Reconfiguration is explicit: build a new `Pipeline` and swap the `Arc`,
/// never mutate a chain that in-flight requests may be traversing.
pub struct Pipeline {
    layers: Vec<Arc<dyn Layer>>,
}

impl Pipeline {
    /// Start building a pipeline.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder { layers: Vec::new() }
    }

    /// Number of layers in the chain.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Drive `request` forward through the chain, then the response back.
    ///
    /// Always resolves to exactly one `ResponseMessage` referencing the
    /// input request, whatever happens in between: every layer whose `tell`
    /// ran gets its `respond` called, in reverse order, exactly once.
    pub async fn handle(&self, request: RequestMessage) -> ResponseMessage {
        let request_id = request.id();
        log::debug!(
            "request {} entering pipeline ({} layers)",
            request_id,
            self.layers.len()
        );

        let mut traversed: Vec<usize> = Vec::with_capacity(self.layers.len());
        let mut current = request;
        let mut answered: Option<ResponseMessage> = None;

        for (index, layer) in self.layers.iter().enumerate() {
            traversed.push(index);
            match layer.tell(current).await {
                ForwardOutcome::Next(next) => current = next,
                ForwardOutcome::Respond(response) => {
                    log::debug!(
                        "request {} answered by layer '{}' at index {}",
                        request_id,
                        layer.name(),
                        index
                    );
                    answered = Some(response);
                    break;
                }
            }
        }

        // A chain that ran out of layers without anyone answering has no
        // terminal selector layer; resolve rather than panic.
        let mut response = answered.unwrap_or_else(|| {
            log::warn!(
                "request {} exhausted the layer chain without an answer",
                request_id
            );
            ResponseMessage::no_capability(request_id, "no layer produced a response")
        });

        while let Some(index) = traversed.pop() {
            let layer = &self.layers[index];
            response = match layer.respond(response).await {
                ReverseOutcome::Pass(passed) => passed,
                ReverseOutcome::Replace(replacement) => {
                    log::debug!(
                        "request {} response replaced by layer '{}'",
                        request_id,
                        layer.name()
                    );
                    replacement
                }
            };
        }

        response
    }
}

/// Builder assembling the layer chain in order.
pub struct PipelineBuilder {
    layers: Vec<Arc<dyn Layer>>,
}

impl PipelineBuilder {
    /// Append a layer to the chain.
    pub fn layer(mut self, layer: Arc<dyn Layer>) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            layers: self.layers,
        }
    }
}
