//! Draft stage: turn grouped entries into customer-facing text blocks
//!
//! The model returns one text block per summary entry, in entry order; the
//! surrounding document (section headers, bullet ordering) is assembled
//! deterministically in code so identical stage responses always produce
//! identical notes.

use std::collections::HashMap;

use tracing::info;

use crate::model::CompletionRequest;
use crate::pipeline::{
    parse, prompts, CategorizedTicket, EntryKind, FilterOutcome, Grouping, Pipeline, Stage,
};
use crate::ticket::Ticket;
use crate::{Error, Result};

/// A drafted summary entry
#[derive(Debug, Clone)]
pub struct SummaryEntry {
    /// Feature or fix
    pub kind: EntryKind,
    /// Capability name from the group stage
    pub name: String,
    /// One-sentence benefit from the group stage
    pub summary: String,
    /// Source ticket ids this entry summarizes
    pub ticket_ids: Vec<String>,
    /// Drafted customer-facing text
    pub text: String,
}

/// Final pipeline output
///
/// Entries are ordered features-then-fixes, matching the group stage's
/// ordering within each section. Excluded tickets are carried for
/// operator review.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub entries: Vec<SummaryEntry>,
    pub excluded: Vec<CategorizedTicket>,
}

impl PipelineResult {
    /// Result for a run where nothing was customer-worthy
    pub fn empty(outcome: FilterOutcome) -> Self {
        Self {
            entries: Vec::new(),
            excluded: outcome.excluded,
        }
    }

    /// Whether there is anything to publish
    pub fn has_entries(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// An entry awaiting drafted text
#[derive(Debug)]
pub(crate) struct PendingEntry<'a> {
    pub kind: EntryKind,
    pub name: String,
    pub summary: String,
    pub tickets: Vec<&'a Ticket>,
}

impl<'a> Pipeline<'a> {
    /// Run the draft stage over the grouped entries
    ///
    /// Consumes the filter outcome so excluded tickets ride along in the
    /// result.
    pub async fn draft(
        &self,
        outcome: FilterOutcome,
        grouping: &Grouping,
    ) -> Result<PipelineResult> {
        let pending = build_entries(&outcome, grouping)?;

        if pending.is_empty() {
            return Ok(PipelineResult::empty(outcome));
        }

        let prompt = prompts::draft_prompt(&pending);

        let blocks = self
            .retry()
            .run("draft stage", || async {
                let raw = self
                    .model()
                    .complete(CompletionRequest::new(prompt.clone()))
                    .await?;
                let blocks: Vec<String> = parse::parse_array(Stage::Draft, &raw)?;
                if blocks.len() != pending.len() {
                    return Err(Error::MalformedResponse {
                        stage: Stage::Draft,
                        raw: format!(
                            "expected {} text blocks, got {}: {}",
                            pending.len(),
                            blocks.len(),
                            raw
                        ),
                    });
                }
                Ok(blocks)
            })
            .await?;

        let entries = pending
            .into_iter()
            .zip(blocks)
            .map(|(entry, text)| SummaryEntry {
                kind: entry.kind,
                name: entry.name,
                summary: entry.summary,
                ticket_ids: entry.tickets.iter().map(|t| t.id.clone()).collect(),
                text: text.trim().to_string(),
            })
            .collect::<Vec<_>>();

        info!(entries = entries.len(), "Draft stage complete");

        Ok(PipelineResult {
            entries,
            excluded: outcome.excluded,
        })
    }
}

/// Order entries: groups first (features), then ungrouped fixes
///
/// The group stage has already verified exact coverage, so lookups here
/// cannot miss; a miss would be a programming error and is reported as
/// such rather than ignored.
fn build_entries<'t>(
    outcome: &'t FilterOutcome,
    grouping: &Grouping,
) -> Result<Vec<PendingEntry<'t>>> {
    let by_id: HashMap<&str, &Ticket> = outcome
        .features
        .iter()
        .chain(outcome.fixes.iter())
        .map(|c| (c.ticket.id.as_str(), &c.ticket))
        .collect();

    let lookup = |id: &str| -> Result<&'t Ticket> {
        by_id
            .get(id)
            .copied()
            .ok_or_else(|| Error::Other(format!("grouped ticket {} not in filter output", id)))
    };

    let mut entries = Vec::new();

    for group in &grouping.groups {
        let tickets = group
            .tickets
            .iter()
            .map(|id| lookup(id))
            .collect::<Result<Vec<_>>>()?;
        entries.push(PendingEntry {
            kind: EntryKind::Feature,
            name: group.name.clone(),
            summary: group.summary.clone(),
            tickets,
        });
    }

    for id in &grouping.ungrouped_fixes {
        let ticket = lookup(id)?;
        entries.push(PendingEntry {
            kind: EntryKind::Fix,
            name: ticket.title.clone(),
            summary: String::new(),
            tickets: vec![ticket],
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{ticket, ScriptedModel};
    use crate::pipeline::Group;
    use crate::retry::RetryPolicy;
    use std::time::Duration;

    fn outcome_and_grouping() -> (FilterOutcome, Grouping) {
        let outcome = FilterOutcome {
            features: vec![
                CategorizedTicket {
                    ticket: ticket("f1", "Export to PDF"),
                    reason: "new".into(),
                },
                CategorizedTicket {
                    ticket: ticket("f2", "Export to CSV"),
                    reason: "new".into(),
                },
            ],
            fixes: vec![CategorizedTicket {
                ticket: ticket("x1", "Fix slow dashboard"),
                reason: "perf".into(),
            }],
            excluded: vec![CategorizedTicket {
                ticket: ticket("e1", "Rotate secrets"),
                reason: "internal".into(),
            }],
        };
        let grouping = Grouping {
            groups: vec![Group {
                name: "Data export".into(),
                tickets: vec!["f1".into(), "f2".into()],
                summary: "Export your reports".into(),
            }],
            ungrouped_fixes: vec!["x1".into()],
        };
        (outcome, grouping)
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            retries: 0,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_draft_matches_entry_order() {
        let (outcome, grouping) = outcome_and_grouping();
        let model = ScriptedModel::new(vec![
            r#"["• *Data export* - download reports as PDF or CSV", "• *Faster dashboards* - loads in under a second"]"#,
        ]);

        let pipeline = Pipeline::new(&model, fast_retry());
        let result = pipeline.draft(outcome, &grouping).await.unwrap();

        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].kind, EntryKind::Feature);
        assert_eq!(result.entries[0].name, "Data export");
        assert_eq!(result.entries[0].ticket_ids, vec!["f1", "f2"]);
        assert_eq!(result.entries[1].kind, EntryKind::Fix);
        assert_eq!(result.entries[1].ticket_ids, vec!["x1"]);
        assert!(result.entries[1].text.contains("Faster dashboards"));
        // Excluded tickets ride along
        assert_eq!(result.excluded.len(), 1);
    }

    #[tokio::test]
    async fn test_block_count_mismatch_is_malformed() {
        let (outcome, grouping) = outcome_and_grouping();
        let model = ScriptedModel::new(vec![r#"["only one block"]"#]);

        let pipeline = Pipeline::new(&model, fast_retry());
        let err = pipeline.draft(outcome, &grouping).await.unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedResponse {
                stage: Stage::Draft,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_grouping_produces_empty_result() {
        let outcome = FilterOutcome::default();
        let grouping = Grouping {
            groups: vec![],
            ungrouped_fixes: vec![],
        };
        let model = ScriptedModel::new(vec![]);

        let pipeline = Pipeline::new(&model, fast_retry());
        let result = pipeline.draft(outcome, &grouping).await.unwrap();
        assert!(!result.has_entries());
        assert!(model.prompts.lock().unwrap().is_empty());
    }
}
