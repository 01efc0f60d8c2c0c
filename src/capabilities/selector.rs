//! Capability Selector: the two-stage selection algorithm.
//!
//! Stage one fans `check` out concurrently across a registry snapshot,
//! bounded per call, and combines the results deterministically: maximum
//! score wins, ties broken by registration order. A maximum strictly above
//! the acceptance threshold is selected immediately. Otherwise stage two
//! delegates the choice to the injected fallback arbiter over the candidates
//! that did not abstain. The chosen capability's `execute` runs exactly once;
//! there is no implicit retry with the next-best candidate.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde_json::json;
use tokio::time::timeout;

use super::capability::{CheckOutcome, Score};
use super::registry::{CapabilityRecord, CapabilityRegistry};
use crate::config::SelectorConfig;
use crate::error::SelectorError;
use crate::interfaces::{Arbiter, CandidateDescription};
use crate::message::{RequestMessage, ResponseMessage};

// Metadata keys stamped onto every selected response.
pub const META_CAPABILITY: &str = "capability";
pub const META_SELECTION_STAGE: &str = "selection_stage";
pub const META_SELECTION_SCORES: &str = "selection_scores";
pub const META_SELECTION_MS: &str = "selection_ms";

/// Which stage produced the choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectionStage {
    Score,
    Arbiter,
}

impl SelectionStage {
    fn as_str(self) -> &'static str {
        match self {
            Self::Score => "score",
            Self::Arbiter => "arbiter",
        }
    }
}

/// One capability's outcome within a scoring round.
///
/// Timed-out checks carry both flags: they rank and arbitrate like
/// abstentions but are logged as timeouts.
#[derive(Debug, Clone)]
struct ScoredCandidate {
    record: CapabilityRecord,
    score: Score,
    abstained: bool,
    timed_out: bool,
}

/// Picks and runs exactly one capability per request.
pub struct CapabilitySelector {
    registry: Arc<CapabilityRegistry>,
    arbiter: Option<Arc<dyn Arbiter>>,
    config: SelectorConfig,
}

impl CapabilitySelector {
    /// Create a selector without a fallback arbiter.
    ///
    /// Without an arbiter, any request that no capability scores above the
    /// threshold resolves to a no-capability outcome.
    pub fn new(registry: Arc<CapabilityRegistry>, config: SelectorConfig) -> Self {
        Self {
            registry,
            arbiter: None,
            config,
        }
    }

    /// Attach the fallback arbiter, builder-style.
    pub fn with_arbiter(mut self, arbiter: Arc<dyn Arbiter>) -> Self {
        self.arbiter = Some(arbiter);
        self
    }

    /// Select one capability for `request` and execute it.
    ///
    /// Works against a point-in-time registry snapshot; concurrent
    /// registration or removal does not affect a selection already under way.
    pub async fn dispatch(
        &self,
        request: &RequestMessage,
    ) -> Result<ResponseMessage, SelectorError> {
        let snapshot = self.registry.snapshot();
        if snapshot.is_empty() {
            return Err(SelectorError::NoCapabilitySelected {
                reason: "no capabilities registered".to_string(),
            });
        }

        let started = Instant::now();
        let scored = self.score_stage(request, snapshot).await;

        // Registration order is authoritative under ties: only a strictly
        // greater score displaces the current best.
        let mut best = &scored[0];
        for candidate in &scored[1..] {
            if candidate.score.value() > best.score.value() {
                best = candidate;
            }
        }

        let (chosen, stage) = if best.score.is_immediate_accept() {
            log::debug!(
                "request {}: '{}' selected by score {}",
                request.id(),
                best.record.id,
                best.score
            );
            (best.record.clone(), SelectionStage::Score)
        } else {
            let verdict = self.arbitrate(request, &scored).await?;
            match scored.iter().find(|c| c.record.id == verdict) {
                Some(candidate) => {
                    log::debug!(
                        "request {}: '{}' selected by arbiter",
                        request.id(),
                        candidate.record.id
                    );
                    (candidate.record.clone(), SelectionStage::Arbiter)
                }
                None => {
                    log::warn!(
                        "request {}: arbiter verdict '{}' matches no registered capability",
                        request.id(),
                        verdict
                    );
                    return Err(SelectorError::NoCapabilitySelected {
                        reason: format!("arbiter chose unknown capability '{verdict}'"),
                    });
                }
            }
        };

        let mut response = self.execute_chosen(&chosen, request).await?;
        response
            .metadata
            .insert(META_CAPABILITY.to_string(), json!(chosen.id));
        response
            .metadata
            .insert(META_SELECTION_STAGE.to_string(), json!(stage.as_str()));
        response.metadata.insert(
            META_SELECTION_SCORES.to_string(),
            scores_as_json(&scored),
        );
        response.metadata.insert(
            META_SELECTION_MS.to_string(),
            json!(started.elapsed().as_millis() as u64),
        );
        Ok(response)
    }

    /// Run `check` on every snapshot record concurrently, each bounded by
    /// the per-check timeout. Results come back in registration order.
    async fn score_stage(
        &self,
        request: &RequestMessage,
        snapshot: Vec<CapabilityRecord>,
    ) -> Vec<ScoredCandidate> {
        let check_timeout = self.config.check_timeout();
        let checks = snapshot.into_iter().map(|record| async move {
            let outcome = timeout(check_timeout, record.capability.check(request)).await;
            (record, outcome)
        });

        let mut scored = Vec::new();
        for (record, outcome) in join_all(checks).await {
            let candidate = match outcome {
                Ok(CheckOutcome::Score(score)) => ScoredCandidate {
                    record,
                    score,
                    abstained: false,
                    timed_out: false,
                },
                Ok(CheckOutcome::Abstain) => {
                    log::debug!("capability '{}' abstained from scoring", record.id);
                    ScoredCandidate {
                        record,
                        score: Score::MIN,
                        abstained: true,
                        timed_out: false,
                    }
                }
                Err(_) => {
                    log::warn!(
                        "capability '{}' check timed out after {}ms, treating as abstention",
                        record.id,
                        check_timeout.as_millis()
                    );
                    ScoredCandidate {
                        record,
                        score: Score::MIN,
                        abstained: true,
                        timed_out: true,
                    }
                }
            };
            scored.push(candidate);
        }
        scored
    }

    /// Stage two: ask the arbiter to pick among the non-abstaining
    /// candidates.
    async fn arbitrate(
        &self,
        request: &RequestMessage,
        scored: &[ScoredCandidate],
    ) -> Result<String, SelectorError> {
        let arbiter = self
            .arbiter
            .as_ref()
            .ok_or_else(|| SelectorError::NoCapabilitySelected {
                reason: "no score above threshold and no arbiter configured".to_string(),
            })?;

        let candidates: Vec<CandidateDescription> = scored
            .iter()
            .filter(|c| !c.abstained)
            .map(|c| CandidateDescription {
                id: c.record.id.clone(),
                description: c.record.description.clone(),
            })
            .collect();
        if candidates.is_empty() {
            return Err(SelectorError::NoCapabilitySelected {
                reason: "every capability abstained".to_string(),
            });
        }

        match timeout(
            self.config.arbiter_timeout(),
            arbiter.choose(&request.content, &candidates),
        )
        .await
        {
            Ok(Ok(verdict)) => Ok(verdict),
            Ok(Err(source)) => {
                log::error!("request {}: arbiter failed: {source:#}", request.id());
                Err(SelectorError::ArbiterUnavailable { source })
            }
            Err(_) => {
                let timeout_ms = self.config.arbiter_timeout_ms;
                log::error!(
                    "request {}: arbiter timed out after {timeout_ms}ms",
                    request.id()
                );
                Err(SelectorError::ArbiterUnavailable {
                    source: anyhow::anyhow!("arbiter timed out after {timeout_ms}ms"),
                })
            }
        }
    }

    /// Invoke the chosen capability's `execute`, exactly once, bounded by
    /// the execution timeout.
    async fn execute_chosen(
        &self,
        record: &CapabilityRecord,
        request: &RequestMessage,
    ) -> Result<ResponseMessage, SelectorError> {
        match timeout(
            self.config.execute_timeout(),
            record.capability.execute(request),
        )
        .await
        {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(source)) => Err(SelectorError::CapabilityExecutionFailed {
                capability: record.id.clone(),
                source,
            }),
            Err(_) => Err(SelectorError::ExecutionTimeout {
                capability: record.id.clone(),
                timeout_ms: self.config.execute_timeout_ms,
            }),
        }
    }
}

fn scores_as_json(scored: &[ScoredCandidate]) -> serde_json::Value {
    json!(scored
        .iter()
        .map(|c| {
            json!({
                "id": c.record.id,
                "score": c.score.value(),
                "abstained": c.abstained,
                "timed_out": c.timed_out,
            })
        })
        .collect::<Vec<_>>())
}
