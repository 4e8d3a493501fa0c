//! Customer-tailored notes stages
//!
//! Customer mode replaces Group and Draft with two free-text stages: one
//! extracting what the customer cares about from recent meeting notes, one
//! drafting notes that lead with exactly that.

use tracing::info;

use crate::meetings::Meeting;
use crate::model::CompletionRequest;
use crate::pipeline::{prompts, FilterOutcome, Pipeline};
use crate::Result;

impl<'a> Pipeline<'a> {
    /// Summarize pain points, requests, and interests from meeting notes
    ///
    /// With no meetings there is nothing to extract and no model call is
    /// made; the tailored draft still works from the tickets alone.
    pub async fn extract_context(
        &self,
        customer: &str,
        meetings: &[Meeting],
    ) -> Result<String> {
        if meetings.is_empty() {
            return Ok(format!(
                "No recent meetings found for {}.",
                customer
            ));
        }

        let prompt = prompts::context_prompt(customer, meetings);

        let context = self
            .retry()
            .run("context stage", || async {
                self.model()
                    .complete(CompletionRequest::new(prompt.clone()))
                    .await
            })
            .await?;

        info!(customer, chars = context.len(), "Extracted customer context");

        Ok(context)
    }

    /// Draft notes tailored to one customer
    pub async fn tailor(
        &self,
        customer: &str,
        context: &str,
        outcome: &FilterOutcome,
    ) -> Result<String> {
        let prompt = prompts::tailor_prompt(customer, context, outcome);

        let notes = self
            .retry()
            .run("tailor stage", || async {
                self.model()
                    .complete(CompletionRequest::new(prompt.clone()))
                    .await
            })
            .await?;

        info!(customer, chars = notes.len(), "Drafted tailored notes");

        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{ticket, ScriptedModel};
    use crate::pipeline::CategorizedTicket;
    use crate::retry::RetryPolicy;
    use std::time::Duration;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            retries: 0,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_no_meetings_skips_model_call() {
        let model = ScriptedModel::new(vec![]);
        let pipeline = Pipeline::new(&model, fast_retry());

        let context = pipeline.extract_context("acme", &[]).await.unwrap();
        assert!(context.contains("No recent meetings"));
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tailor_feeds_context_and_tickets() {
        let model = ScriptedModel::new(vec!["Hey team! Here's what shipped."]);
        let pipeline = Pipeline::new(&model, fast_retry());

        let outcome = FilterOutcome {
            features: vec![CategorizedTicket {
                ticket: ticket("f1", "CSV export"),
                reason: "new".into(),
            }],
            fixes: vec![],
            excluded: vec![],
        };

        let notes = pipeline
            .tailor("acme", "They asked about exports.", &outcome)
            .await
            .unwrap();
        assert_eq!(notes, "Hey team! Here's what shipped.");

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("They asked about exports."));
        assert!(prompts[0].contains("CSV export"));
    }
}
