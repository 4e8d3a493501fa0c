//! Run orchestration
//!
//! A run is fetch, pipeline, optional delivery, and a single state commit,
//! driven through the [`phase::PhaseMachine`]. Failed runs never write
//! state, so the next run re-covers the same window. Delivery failure is
//! the one exception: by then the notes exist and may have partially
//! reached the destination, so state advances and the failure is reported
//! on the [`RunReport`] instead.

pub mod phase;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::config::Config;
use crate::meetings::{self, Meeting};
use crate::model::ModelBackend;
use crate::pipeline::{FilterOutcome, Pipeline, PipelineResult};
use crate::publish::{render_message, render_notes, Publisher};
use crate::retry::RetryPolicy;
use crate::run::phase::{PhaseMachine, RunPhase};
use crate::state::{RunState, StateStore};
use crate::ticket::{TicketSource, Window};
use crate::{Error, Result};

/// Outcome of a completed run
#[derive(Debug)]
pub struct RunReport {
    /// The window the run covered
    pub window: Window,
    /// Tickets fetched from the source
    pub tickets_fetched: usize,
    /// Pipeline output; `None` for customer-tailored runs
    pub result: Option<PipelineResult>,
    /// The rendered message; `None` when nothing was worth publishing
    pub message: Option<String>,
    /// Whether the message reached the destination
    pub delivered: bool,
    /// Whether run state advanced to the window end
    pub committed: bool,
    /// Delivery failure, when the run otherwise completed
    pub delivery_error: Option<Error>,
}

/// Orchestrates a single release-notes run
pub struct Runner<'a> {
    source: &'a dyn TicketSource,
    model: &'a dyn ModelBackend,
    publisher: Option<&'a dyn Publisher>,
    store: StateStore,
    config: Config,
}

impl<'a> Runner<'a> {
    /// Create a runner without a publisher (preview)
    pub fn new(
        source: &'a dyn TicketSource,
        model: &'a dyn ModelBackend,
        store: StateStore,
        config: Config,
    ) -> Self {
        Self {
            source,
            model,
            publisher: None,
            store,
            config,
        }
    }

    /// Attach a publisher; drafted notes will be delivered
    pub fn with_publisher(mut self, publisher: &'a dyn Publisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Run the generic pipeline: filter, group, draft
    ///
    /// The window starts at `since` when given, otherwise at the persisted
    /// last-run timestamp, otherwise at the configured lookback. `commit`
    /// advances the persisted state to the window end on completion.
    pub async fn run(&self, since: Option<DateTime<Utc>>, commit: bool) -> Result<RunReport> {
        let mut phase = PhaseMachine::new();
        let result = self.run_generic(&mut phase, since, commit).await;
        if result.is_err() && phase.can_transition_to(RunPhase::Failed) {
            let _ = phase.transition_to(RunPhase::Failed);
        }
        result
    }

    /// Run the customer-tailored pipeline: filter, context, tailor
    ///
    /// The ticket window resolves like the generic run (`since`, then the
    /// persisted last-run timestamp) with `days_back` as the fallback
    /// lookback; `days_back` also bounds the meeting-notes cutoff.
    pub async fn run_customer(
        &self,
        customer: &str,
        days_back: i64,
        since: Option<DateTime<Utc>>,
        commit: bool,
    ) -> Result<RunReport> {
        let mut phase = PhaseMachine::new();
        let result = self
            .run_tailored(&mut phase, customer, days_back, since, commit)
            .await;
        if result.is_err() && phase.can_transition_to(RunPhase::Failed) {
            let _ = phase.transition_to(RunPhase::Failed);
        }
        result
    }

    async fn run_generic(
        &self,
        phase: &mut PhaseMachine,
        since: Option<DateTime<Utc>>,
        commit: bool,
    ) -> Result<RunReport> {
        let now = Utc::now();
        let state = self.store.load()?;
        let window = resolve_window(since, &state, now, self.config.run.lookback_days)?;
        info!(%window, "Starting release-notes run");

        phase.transition_to(RunPhase::Fetching)?;
        let tickets = self.source.completed_in_window(&window).await?;
        info!(count = tickets.len(), "Fetched completed tickets");

        let pipeline = Pipeline::new(self.model, self.retry_policy());

        if tickets.is_empty() {
            phase.transition_to(RunPhase::Committed)?;
            let committed = self.maybe_commit(commit, &window)?;
            return Ok(RunReport {
                window,
                tickets_fetched: 0,
                result: Some(PipelineResult::empty(FilterOutcome::default())),
                message: None,
                delivered: false,
                committed,
                delivery_error: None,
            });
        }

        phase.transition_to(RunPhase::Filtering)?;
        let outcome = pipeline.filter(&tickets).await?;

        if outcome.customer_worthy_count() == 0 {
            info!("Nothing customer-worthy this window");
            phase.transition_to(RunPhase::Committed)?;
            let committed = self.maybe_commit(commit, &window)?;
            return Ok(RunReport {
                window,
                tickets_fetched: tickets.len(),
                result: Some(PipelineResult::empty(outcome)),
                message: None,
                delivered: false,
                committed,
                delivery_error: None,
            });
        }

        phase.transition_to(RunPhase::Grouping)?;
        let grouping = pipeline.group(&outcome).await?;

        phase.transition_to(RunPhase::Drafting)?;
        let result = pipeline.draft(outcome, &grouping).await?;

        let message = render_message(&render_notes(&result), &window, None);

        let (delivered, delivery_error) = self.deliver(phase, &message).await?;
        let committed = self.maybe_commit(commit, &window)?;
        phase.transition_to(RunPhase::Committed)?;

        Ok(RunReport {
            window,
            tickets_fetched: tickets.len(),
            result: Some(result),
            message: Some(message),
            delivered,
            committed,
            delivery_error,
        })
    }

    async fn run_tailored(
        &self,
        phase: &mut PhaseMachine,
        customer: &str,
        days_back: i64,
        since: Option<DateTime<Utc>>,
        commit: bool,
    ) -> Result<RunReport> {
        let now = Utc::now();
        let state = self.store.load()?;
        let window = resolve_window(since, &state, now, days_back)?;
        info!(customer, %window, "Starting customer-tailored run");

        phase.transition_to(RunPhase::Fetching)?;
        let tickets = self.source.completed_in_window(&window).await?;
        info!(count = tickets.len(), "Fetched completed tickets");

        let pipeline = Pipeline::new(self.model, self.retry_policy());

        phase.transition_to(RunPhase::Filtering)?;
        let outcome = pipeline.filter(&tickets).await?;

        if outcome.customer_worthy_count() == 0 {
            info!(customer, "Nothing customer-worthy this window");
            phase.transition_to(RunPhase::Committed)?;
            let committed = self.maybe_commit(commit, &window)?;
            return Ok(RunReport {
                window,
                tickets_fetched: tickets.len(),
                result: None,
                message: None,
                delivered: false,
                committed,
                delivery_error: None,
            });
        }

        phase.transition_to(RunPhase::Drafting)?;
        let meetings = self.customer_meetings(customer, days_back, now);
        let context = pipeline.extract_context(customer, &meetings).await?;
        let notes = pipeline.tailor(customer, &context, &outcome).await?;

        let message = render_message(&notes, &window, Some(customer));

        let (delivered, delivery_error) = self.deliver(phase, &message).await?;
        let committed = self.maybe_commit(commit, &window)?;
        phase.transition_to(RunPhase::Committed)?;

        Ok(RunReport {
            window,
            tickets_fetched: tickets.len(),
            result: None,
            message: Some(message),
            delivered,
            committed,
            delivery_error,
        })
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_retries(self.config.run.stage_retries)
    }

    /// Deliver the message when a publisher is attached
    ///
    /// Delivery failure does not abort the run; the error is carried on
    /// the report so the caller can surface it after state has advanced.
    async fn deliver(
        &self,
        phase: &mut PhaseMachine,
        message: &str,
    ) -> Result<(bool, Option<Error>)> {
        let Some(publisher) = self.publisher else {
            return Ok((false, None));
        };

        phase.transition_to(RunPhase::Publishing)?;
        match publisher.deliver(message).await {
            Ok(()) => {
                info!("Delivered release notes");
                Ok((true, None))
            }
            Err(err) => {
                warn!(error = %err, "Delivery failed");
                Ok((false, Some(err)))
            }
        }
    }

    fn maybe_commit(&self, commit: bool, window: &Window) -> Result<bool> {
        if !commit {
            return Ok(false);
        }
        self.store.save(&RunState {
            last_run: Some(window.end),
        })?;
        Ok(true)
    }

    /// Meetings for the customer, or none when no cache is configured
    ///
    /// An unreadable cache downgrades to tailoring from tickets alone
    /// rather than failing the run.
    fn customer_meetings(
        &self,
        customer: &str,
        days_back: i64,
        now: DateTime<Utc>,
    ) -> Vec<Meeting> {
        let Some(cache_path) = &self.config.meetings.cache_path else {
            warn!("No meeting cache configured, tailoring from tickets alone");
            return Vec::new();
        };

        let terms = self.config.customer_search_terms(customer);
        match meetings::find_customer_meetings(cache_path, &terms, days_back, now) {
            Ok(meetings) => meetings,
            Err(err) => {
                warn!(error = %err, "Could not read meeting cache, tailoring from tickets alone");
                Vec::new()
            }
        }
    }
}

/// Window start priority: explicit override, then persisted state, then
/// the configured lookback. The end is always now.
fn resolve_window(
    since: Option<DateTime<Utc>>,
    state: &RunState,
    now: DateTime<Utc>,
    lookback_days: i64,
) -> Result<Window> {
    let start = since
        .or(state.last_run)
        .unwrap_or_else(|| now - Duration::days(lookback_days));
    Window::new(start, now)
}
