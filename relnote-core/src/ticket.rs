//! Ticket domain model and the ticket source seam

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A completed issue-tracker ticket
///
/// Immutable once fetched; every pipeline stage consumes it read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Tracker-assigned identifier
    pub id: String,
    /// Ticket title
    pub title: String,
    /// Ticket description, if any
    pub description: Option<String>,
    /// When the ticket entered a completed state
    pub completed_at: DateTime<Utc>,
    /// Owning team name
    pub team: Option<String>,
    /// Associated project name
    pub project: Option<String>,
    /// Labels attached to the ticket
    #[serde(default)]
    pub labels: Vec<String>,
    /// Assignee, if any
    pub assignee: Option<Assignee>,
    /// Discussion comment bodies, oldest first
    #[serde(default)]
    pub comments: Vec<String>,
    /// Initiatives the ticket's project belongs to
    #[serde(default)]
    pub initiatives: Vec<String>,
}

/// Ticket assignee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignee {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Ticket {
    /// Display name of the assignee, or "Unassigned"
    pub fn assignee_name(&self) -> &str {
        self.assignee
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("Unassigned")
    }

    /// Description truncated to `max_chars`, or a placeholder when absent
    pub fn description_excerpt(&self, max_chars: usize) -> String {
        match &self.description {
            Some(d) => truncate(d, max_chars),
            None => "No description".to_string(),
        }
    }
}

/// Truncate a string to a character budget
pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

/// Half-open `[start, end)` range of completion timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// Create a window, requiring `start <= end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(crate::Error::Config(format!(
                "window start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Whether a timestamp falls inside the window
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} → {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Source of completed tickets for a time window
///
/// Implementations must return the complete set for the window or fail;
/// a partial set must never be fed into drafting.
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// Fetch all tickets completed within the window
    async fn completed_in_window(&self, window: &Window) -> Result<Vec<Ticket>>;
}
