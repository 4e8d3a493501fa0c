//! The three-stage release-notes pipeline
//!
//! Filter, Group, and Draft run strictly in sequence, each a single model
//! invocation over the previous stage's output. The pipeline owns prompt
//! shaping and response parsing; the classification decisions themselves
//! are delegated to the model.

pub mod draft;
pub mod filter;
pub mod group;
mod parse;
pub mod prompts;
pub mod tailor;

pub use draft::PipelineResult;
pub use filter::{CategorizedTicket, FilterOutcome};
pub use group::{Group, Grouping};

use serde::{Deserialize, Serialize};

use crate::model::ModelBackend;
use crate::retry::RetryPolicy;
use crate::ticket::Ticket;
use crate::Result;

/// A delegated transformation stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Tag tickets customer-worthy vs excluded
    Filter,
    /// Group related tickets into summary entries
    Group,
    /// Draft customer-facing text per entry
    Draft,
    /// Extract customer context from meeting notes
    Context,
    /// Draft customer-tailored notes
    Tailor,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Filter => "filter",
            Stage::Group => "group",
            Stage::Draft => "draft",
            Stage::Context => "context",
            Stage::Tailor => "tailor",
        };
        f.write_str(name)
    }
}

/// Disposition of a summary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Feature,
    Fix,
}

/// Sequential driver for the pipeline stages
pub struct Pipeline<'a> {
    model: &'a dyn ModelBackend,
    retry: RetryPolicy,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline over a model backend
    pub fn new(model: &'a dyn ModelBackend, retry: RetryPolicy) -> Self {
        Self { model, retry }
    }

    pub(crate) fn model(&self) -> &dyn ModelBackend {
        self.model
    }

    pub(crate) fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run all three stages over a fetched ticket set
    ///
    /// Stages consume each other's full output; a stage that exhausts its
    /// retries aborts the whole pipeline.
    pub async fn run(&self, tickets: &[Ticket]) -> Result<PipelineResult> {
        let outcome = self.filter(tickets).await?;

        if outcome.customer_worthy_count() == 0 {
            return Ok(PipelineResult::empty(outcome));
        }

        let grouping = self.group(&outcome).await?;
        self.draft(outcome, &grouping).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{ticket, ScriptedModel};
    use crate::publish::{render_message, render_notes};
    use crate::retry::RetryPolicy;
    use crate::ticket::Window;
    use std::time::Duration;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            retries: 0,
            base_delay: Duration::from_millis(1),
        }
    }

    fn scripts() -> Vec<&'static str> {
        vec![
            r#"[
                {"id": "t1", "decision": "feature", "reason": "new export"},
                {"id": "t2", "decision": "fix", "reason": "login bug"}
            ]"#,
            r#"{"groups": [{"name": "Data export", "tickets": ["t1"], "summary": "Export data"}], "ungrouped_fixes": ["t2"]}"#,
            r#"["• *Data export* - download your data", "• Fixed the login redirect"]"#,
        ]
    }

    #[tokio::test]
    async fn test_identical_responses_render_identical_notes() {
        let tickets = vec![ticket("t1", "Export"), ticket("t2", "Fix login redirect")];
        let window = Window::new(
            "2025-01-01T00:00:00Z".parse().unwrap(),
            "2025-01-15T00:00:00Z".parse().unwrap(),
        )
        .unwrap();

        let mut rendered = Vec::new();
        for _ in 0..2 {
            let model = ScriptedModel::new(scripts());
            let pipeline = Pipeline::new(&model, fast_retry());
            let result = pipeline.run(&tickets).await.unwrap();
            rendered.push(render_message(&render_notes(&result), &window, None));
        }

        assert_eq!(rendered[0], rendered[1]);
        assert!(rendered[0].contains("*New features*"));
        assert!(rendered[0].contains("*Bug fixes / quality of life*"));
    }

    #[tokio::test]
    async fn test_run_stops_after_filter_when_nothing_worthy() {
        let tickets = vec![ticket("t1", "Rotate secrets")];
        let model = ScriptedModel::new(vec![
            r#"[{"id": "t1", "decision": "exclude", "reason": "internal"}]"#,
        ]);

        let pipeline = Pipeline::new(&model, fast_retry());
        let result = pipeline.run(&tickets).await.unwrap();

        assert!(!result.has_entries());
        assert_eq!(result.excluded.len(), 1);
        // Group and draft never ran
        assert_eq!(model.prompts.lock().unwrap().len(), 1);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted model backend shared by pipeline and runner tests

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::model::{CompletionRequest, ModelBackend};
    use crate::ticket::Ticket;
    use crate::{Error, Result};

    /// A ticket with plausible defaults for pipeline tests
    pub fn ticket(id: &str, title: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            title: title.to_string(),
            description: Some(format!("Description of {}", title)),
            completed_at: "2025-01-05T12:00:00Z".parse().unwrap(),
            team: Some("Product".to_string()),
            project: None,
            labels: vec![],
            assignee: None,
            comments: vec![],
            initiatives: vec![],
        }
    }

    /// Returns canned responses in order; errors when the script runs out
    pub struct ScriptedModel {
        responses: Mutex<Vec<String>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub fn new(responses: Vec<&str>) -> Self {
            let mut responses: Vec<String> =
                responses.into_iter().map(String::from).collect();
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelBackend for ScriptedModel {
        async fn complete(&self, request: CompletionRequest) -> Result<String> {
            self.prompts.lock().unwrap().push(request.prompt);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| Error::Model("script exhausted".to_string()))
        }
    }
}
