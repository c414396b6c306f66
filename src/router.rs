//! The query router: classify each question, dispatch to structured
//! accessors or semantic search, and always come back with exactly one
//! decision.
//!
//! The classification policy is ordered and first-match-wins:
//! 1. a uniquely recognized structured intent answers from the employee
//!    context;
//! 2. a recognized but under-specified intent asks for clarification —
//!    it never falls through to document search;
//! 3. everything else goes to semantic search under the confidence
//!    policy;
//! 4. any internal error becomes the fail-safe answer.
//!
//! The router holds no state across calls; the index is read-only and
//! the provider is the only suspension point.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::context::{AccessorError, EmployeeContext};
use crate::employee::EmployeeInfo;
use crate::intent::{self, Intent, IntentDecision};
use crate::leave::LeaveInfo;
use crate::semantic::{
    search, DocumentIndex, EmbeddingError, EmbeddingProvider, IndexError, SearchError,
};

/// The guaranteed fallback answer. Always this literal text, never a
/// raw error.
pub const FAIL_SAFE_MESSAGE: &str =
    "No relevant policy found. Try rephrasing your question or contact HR.";

/// A passage surfaced to the user, with score and attribution metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageHit {
    pub text: String,
    pub score: f32,
    pub metadata: BTreeMap<String, String>,
}

/// The one-of-four outcome of routing a question. This is the entire
/// boundary contract: presentation layers consume nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum RoutingDecision {
    Structured(String),
    Document(Vec<PassageHit>),
    Clarify(String),
    Failsafe(String),
}

/// Internal error funnel. Nothing in here ever crosses the boundary;
/// `route` converts every variant into the fail-safe decision.
#[derive(Debug, thiserror::Error)]
enum RouteError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Accessor(#[from] AccessorError),
}

pub struct QueryRouter {
    provider: Arc<dyn EmbeddingProvider>,
    config: SearchConfig,
}

impl QueryRouter {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: SearchConfig) -> Self {
        Self { provider, config }
    }

    /// Route one question. Infallible by contract: every internal error
    /// is caught here and becomes a fail-safe answer.
    pub async fn route(
        &self,
        question: &str,
        ctx: &EmployeeContext,
        index: &DocumentIndex,
    ) -> RoutingDecision {
        match self.try_route(question, ctx, index).await {
            Ok(decision) => decision,
            Err(err) => {
                log::warn!("routing failed, answering with fail-safe: {err}");
                RoutingDecision::Failsafe(FAIL_SAFE_MESSAGE.to_string())
            }
        }
    }

    async fn try_route(
        &self,
        question: &str,
        ctx: &EmployeeContext,
        index: &DocumentIndex,
    ) -> Result<RoutingDecision, RouteError> {
        if let Some(decision) = self.structured(question, ctx)? {
            return Ok(decision);
        }
        self.semantic(question, index).await
    }

    /// Steps 1 and 2: structured dispatch or clarification. `None`
    /// means no intent was recognized and the semantic path applies.
    fn structured(
        &self,
        question: &str,
        ctx: &EmployeeContext,
    ) -> Result<Option<RoutingDecision>, RouteError> {
        let candidates = intent::classify(question);
        match intent::select(
            &candidates,
            self.config.intent_threshold,
            self.config.intent_margin,
        ) {
            IntentDecision::None => Ok(None),
            IntentDecision::Ambiguous(first, second) => {
                Ok(Some(RoutingDecision::Clarify(format!(
                    "Your question could be about {} or {}. Which one do you mean?",
                    first.name(),
                    second.name()
                ))))
            }
            IntentDecision::Selected(matched) => {
                log::debug!(
                    "structured intent {:?} (score {:.2})",
                    matched.intent,
                    matched.score
                );
                self.dispatch(matched.intent, question, ctx).map(Some)
            }
        }
    }

    /// Dispatch a recognized intent to its accessor. A missing or
    /// ambiguous leave-type slot asks for clarification instead of
    /// guessing or falling through to document search.
    fn dispatch(
        &self,
        intent: Intent,
        question: &str,
        ctx: &EmployeeContext,
    ) -> Result<RoutingDecision, RouteError> {
        let employee = EmployeeInfo::new(&ctx.employee);
        let leave = LeaveInfo::new(ctx)?;

        let mentioned = leave.detect_in_text(question);
        if mentioned.len() > 1 {
            let names: Vec<&str> = mentioned.iter().map(|lt| lt.desc.as_str()).collect();
            return Ok(RoutingDecision::Clarify(format!(
                "You mentioned several leave types ({}). Which one do you mean?",
                names.join(", ")
            )));
        }
        let named = mentioned.into_iter().next();

        let answer = match intent {
            Intent::Manager => employee.manager(),
            Intent::Probation => employee.probation_status(),
            Intent::Accommodation => employee.accommodation(),
            Intent::Shift => employee.shift(),
            Intent::RpNumber => employee.rp_number(),
            Intent::Department => employee.department(),
            Intent::JoiningDate => employee.joining_date(),
            Intent::Profile => serde_json::to_string_pretty(&employee.summary())
                .map_err(|e| AccessorError::Malformed(e.to_string()))?,

            Intent::LeaveBalance => match named.or_else(|| leave.sole_type()) {
                Some(lt) => leave.balance_of(lt),
                None if leave.type_count() == 0 => leave.balances_summary(),
                None => return Ok(self.which_leave_type(&leave)),
            },

            // Without a named type this lists every air-ticket leave,
            // which is itself a complete answer.
            Intent::AirTicket => match named {
                Some(lt) => leave.air_ticket_of(lt),
                None => leave.all_air_ticket_leaves(),
            },

            Intent::Workday => leave.workday_types(),

            Intent::CanApply | Intent::NextEligible | Intent::Attachment | Intent::SelfService => {
                match named.or_else(|| leave.sole_type()) {
                    Some(lt) => match intent {
                        Intent::CanApply => leave.can_apply(lt),
                        Intent::NextEligible => leave.next_eligible(lt),
                        Intent::Attachment => leave.attachment_of(lt),
                        _ => leave.self_service_of(lt),
                    },
                    None => return Ok(self.which_leave_type(&leave)),
                }
            }
        };

        Ok(RoutingDecision::Structured(answer))
    }

    fn which_leave_type(&self, leave: &LeaveInfo<'_>) -> RoutingDecision {
        RoutingDecision::Clarify(format!(
            "Which leave type do you mean? You have: {}.",
            leave.type_names().join(", ")
        ))
    }

    /// Step 3: embed the question and answer from the document index
    /// under the confidence policy.
    async fn semantic(
        &self,
        question: &str,
        index: &DocumentIndex,
    ) -> Result<RoutingDecision, RouteError> {
        index.ensure_model(self.provider.model_id())?;

        let query = self.provider.embed(question).await?;
        let hits = search(index, &query, self.config.top_k)?;

        let top_score = match hits.first() {
            Some(top) => top.score,
            None => return Ok(RoutingDecision::Failsafe(FAIL_SAFE_MESSAGE.to_string())),
        };

        if top_score < self.config.score_threshold {
            log::debug!(
                "top similarity {top_score:.3} below threshold {:.3}",
                self.config.score_threshold
            );
            return Ok(RoutingDecision::Failsafe(FAIL_SAFE_MESSAGE.to_string()));
        }

        // Near-tied top passages are all surfaced, not just one winner.
        let cutoff = top_score - self.config.tie_margin;
        let passages: Vec<PassageHit> = hits
            .iter()
            .take_while(|hit| hit.score >= cutoff)
            .filter_map(|hit| {
                index.get(hit.id).map(|passage| PassageHit {
                    text: passage.text.clone(),
                    score: hit.score,
                    metadata: passage.metadata.clone(),
                })
            })
            .collect();

        Ok(RoutingDecision::Document(passages))
    }
}
