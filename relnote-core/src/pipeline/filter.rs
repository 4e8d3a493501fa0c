//! Filter stage: tag tickets customer-worthy vs excluded
//!
//! Decision authority is fully delegated to the model; this module shapes
//! the prompt input and parses the structured response. Every fetched
//! ticket must come back with a decision - ungraded tickets never pass
//! through silently.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, info};

use crate::model::CompletionRequest;
use crate::pipeline::{parse, prompts, Pipeline, Stage};
use crate::ticket::Ticket;
use crate::{Error, Result};

/// A ticket with the model's stated reason for its disposition
#[derive(Debug, Clone)]
pub struct CategorizedTicket {
    pub ticket: Ticket,
    pub reason: String,
}

/// Output of the filter stage
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// New capabilities worth promoting
    pub features: Vec<CategorizedTicket>,
    /// Fixes and quality-of-life improvements
    pub fixes: Vec<CategorizedTicket>,
    /// Internal work, not customer-facing
    pub excluded: Vec<CategorizedTicket>,
}

impl FilterOutcome {
    /// Number of customer-worthy tickets (features + fixes)
    pub fn customer_worthy_count(&self) -> usize {
        self.features.len() + self.fixes.len()
    }

    /// Ids of all customer-worthy tickets
    pub fn customer_worthy_ids(&self) -> Vec<String> {
        self.features
            .iter()
            .chain(self.fixes.iter())
            .map(|c| c.ticket.id.clone())
            .collect()
    }
}

/// One per-ticket decision in the model's response
#[derive(Debug, Deserialize)]
struct Decision {
    id: String,
    decision: DecisionKind,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DecisionKind {
    Feature,
    Fix,
    Exclude,
}

impl<'a> Pipeline<'a> {
    /// Run the filter stage over all fetched tickets
    pub async fn filter(&self, tickets: &[Ticket]) -> Result<FilterOutcome> {
        if tickets.is_empty() {
            return Ok(FilterOutcome::default());
        }

        let prompt = prompts::filter_prompt(tickets);

        let outcome = self
            .retry()
            .run("filter stage", || async {
                let raw = self
                    .model()
                    .complete(CompletionRequest::new(prompt.clone()))
                    .await?;
                apply_decisions(tickets, &raw)
            })
            .await?;

        info!(
            features = outcome.features.len(),
            fixes = outcome.fixes.len(),
            excluded = outcome.excluded.len(),
            "Filter stage complete"
        );

        Ok(outcome)
    }
}

/// Parse the decision array and map every ticket to a disposition
fn apply_decisions(tickets: &[Ticket], raw: &str) -> Result<FilterOutcome> {
    let decisions: Vec<Decision> = parse::parse_array(Stage::Filter, raw)?;

    debug!(count = decisions.len(), "Parsed filter decisions");

    let mut by_id: HashMap<&str, &Decision> = HashMap::new();
    for decision in &decisions {
        if !tickets.iter().any(|t| t.id == decision.id) {
            return Err(Error::MalformedResponse {
                stage: Stage::Filter,
                raw: format!("decision references unknown ticket id {}: {}", decision.id, raw),
            });
        }
        by_id.insert(decision.id.as_str(), decision);
    }

    let mut outcome = FilterOutcome::default();
    for ticket in tickets {
        let decision = by_id.get(ticket.id.as_str()).ok_or_else(|| {
            Error::MalformedResponse {
                stage: Stage::Filter,
                raw: format!("no decision for ticket {}: {}", ticket.id, raw),
            }
        })?;

        let categorized = CategorizedTicket {
            ticket: ticket.clone(),
            reason: decision.reason.clone(),
        };

        match decision.decision {
            DecisionKind::Feature => outcome.features.push(categorized),
            DecisionKind::Fix => outcome.fixes.push(categorized),
            DecisionKind::Exclude => outcome.excluded.push(categorized),
        }
    }

    Ok(outcome)
}
