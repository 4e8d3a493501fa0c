//! Group stage: fold related tickets into summary entries
//!
//! The union of ticket ids referenced across all groups and the ungrouped
//! list must equal the customer-worthy input set exactly. Under- or
//! over-grouping corrupts the releasable output, so any deviation is fatal
//! after retries.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::info;

use crate::model::CompletionRequest;
use crate::pipeline::{parse, prompts, FilterOutcome, Pipeline, Stage};
use crate::{Error, Result};

/// Output of the group stage
#[derive(Debug, Clone, Deserialize)]
pub struct Grouping {
    /// Ordered feature groups
    #[serde(default)]
    pub groups: Vec<Group>,
    /// Standalone fixes, referenced by ticket id
    #[serde(default)]
    pub ungrouped_fixes: Vec<String>,
}

/// One customer-facing feature spanning one or more tickets
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    /// Customer-friendly capability name
    pub name: String,
    /// Ticket ids belonging to this group
    pub tickets: Vec<String>,
    /// One-sentence customer benefit
    #[serde(default)]
    pub summary: String,
}

impl<'a> Pipeline<'a> {
    /// Run the group stage over the customer-worthy filter output
    pub async fn group(&self, outcome: &FilterOutcome) -> Result<Grouping> {
        let prompt = prompts::group_prompt(outcome);
        let input_ids = outcome.customer_worthy_ids();

        let grouping = self
            .retry()
            .run("group stage", || async {
                let raw = self
                    .model()
                    .complete(CompletionRequest::new(prompt.clone()))
                    .await?;
                let grouping: Grouping = parse::parse_object(Stage::Group, &raw)?;
                verify_coverage(&input_ids, &grouping)?;
                Ok(grouping)
            })
            .await?;

        info!(
            groups = grouping.groups.len(),
            ungrouped = grouping.ungrouped_fixes.len(),
            "Group stage complete"
        );

        Ok(grouping)
    }
}

/// Check the exact-coverage invariant
///
/// Every input id appears exactly once across groups and ungrouped fixes;
/// no id outside the input set appears at all.
fn verify_coverage(input_ids: &[String], grouping: &Grouping) -> Result<()> {
    let input: HashSet<&str> = input_ids.iter().map(String::as_str).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut unexpected: Vec<String> = Vec::new();

    let referenced = grouping
        .groups
        .iter()
        .flat_map(|g| g.tickets.iter())
        .chain(grouping.ungrouped_fixes.iter());

    for id in referenced {
        if !input.contains(id.as_str()) || !seen.insert(id.as_str()) {
            unexpected.push(id.clone());
        }
    }

    let mut missing: Vec<String> = input_ids
        .iter()
        .filter(|id| !seen.contains(id.as_str()))
        .cloned()
        .collect();
    missing.sort();

    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(Error::IncompleteGrouping {
            missing,
            unexpected,
        })
    }
}
