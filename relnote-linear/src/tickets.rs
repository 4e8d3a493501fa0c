//! Completed-issue fetching with cursor pagination
//!
//! Pages through the `issues` connection filtered to completed states
//! inside the window. Each page gets a bounded number of attempts; a page
//! that stays down fails the whole fetch, never returning a partial set.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use relnote_core::{Assignee, Ticket, TicketSource, Window};

use crate::{Error, LinearClient, Result};

const PAGE_SIZE: u32 = 50;
const MAX_PAGE_ATTEMPTS: u32 = 3;
const PAGE_RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(1);

const COMPLETED_ISSUES_QUERY: &str = r#"
    query CompletedIssues($filter: IssueFilter, $first: Int!, $after: String) {
        issues(filter: $filter, first: $first, after: $after) {
            nodes {
                identifier
                title
                description
                completedAt
                team { name }
                project {
                    name
                    initiatives { nodes { name } }
                }
                labels { nodes { name } }
                assignee { name email }
                comments(first: 5) { nodes { body } }
            }
            pageInfo {
                hasNextPage
                endCursor
            }
        }
    }
"#;

#[derive(Debug, Deserialize)]
struct IssuesData {
    issues: IssueConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueConnection {
    nodes: Vec<IssueNode>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueNode {
    identifier: String,
    title: String,
    description: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    team: Option<NameRef>,
    project: Option<ProjectNode>,
    #[serde(default)]
    labels: LabelConnection,
    assignee: Option<AssigneeNode>,
    #[serde(default)]
    comments: CommentConnection,
}

#[derive(Debug, Deserialize)]
struct NameRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ProjectNode {
    name: String,
    #[serde(default)]
    initiatives: LabelConnection,
}

#[derive(Debug, Default, Deserialize)]
struct LabelConnection {
    #[serde(default)]
    nodes: Vec<NameRef>,
}

#[derive(Debug, Default, Deserialize)]
struct CommentConnection {
    #[serde(default)]
    nodes: Vec<CommentNode>,
}

#[derive(Debug, Deserialize)]
struct CommentNode {
    body: String,
}

#[derive(Debug, Deserialize)]
struct AssigneeNode {
    name: String,
    #[serde(default)]
    email: Option<String>,
}

impl IssueNode {
    /// Convert to a core ticket; `None` when the completion timestamp is
    /// missing despite the completed-state filter
    fn into_ticket(self) -> Option<Ticket> {
        let completed_at = match self.completed_at {
            Some(ts) => ts,
            None => {
                warn!(id = %self.identifier, "Completed issue without completedAt, skipping");
                return None;
            }
        };

        let (project, initiatives) = match self.project {
            Some(p) => (
                Some(p.name),
                p.initiatives.nodes.into_iter().map(|n| n.name).collect(),
            ),
            None => (None, Vec::new()),
        };

        Some(Ticket {
            id: self.identifier,
            title: self.title,
            description: self.description,
            completed_at,
            team: self.team.map(|t| t.name),
            project,
            labels: self.labels.nodes.into_iter().map(|l| l.name).collect(),
            assignee: self.assignee.map(|a| Assignee {
                name: a.name,
                email: a.email,
            }),
            comments: self.comments.nodes.into_iter().map(|c| c.body).collect(),
            initiatives,
        })
    }
}

impl LinearClient {
    /// Fetch all issues completed within the window
    pub async fn completed_issues(&self, window: &Window) -> Result<Vec<Ticket>> {
        let filter = json!({
            "state": { "type": { "eq": "completed" } },
            "completedAt": {
                "gte": window.start.to_rfc3339(),
                "lt": window.end.to_rfc3339(),
            },
        });

        let mut tickets = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let connection = self.fetch_page(&filter, cursor.as_deref()).await?;
            pages += 1;
            debug!(page = pages, nodes = connection.nodes.len(), "Fetched issue page");

            tickets.extend(
                connection
                    .nodes
                    .into_iter()
                    .filter_map(IssueNode::into_ticket)
                    // The server filter is authoritative but cheap to double-check
                    .filter(|t| window.contains(t.completed_at)),
            );

            if !connection.page_info.has_next_page {
                break;
            }
            cursor = connection.page_info.end_cursor;
            if cursor.is_none() {
                return Err(Error::Parse(
                    "hasNextPage set but endCursor missing".to_string(),
                ));
            }
        }

        info!(count = tickets.len(), pages, "Fetched completed issues");
        Ok(tickets)
    }

    /// Fetch one page, retrying transient failures
    async fn fetch_page(
        &self,
        filter: &serde_json::Value,
        after: Option<&str>,
    ) -> Result<IssueConnection> {
        let variables = json!({
            "filter": filter,
            "first": PAGE_SIZE,
            "after": after,
        });

        let mut attempt = 1u32;
        loop {
            match self
                .graphql::<IssuesData>(COMPLETED_ISSUES_QUERY, &variables)
                .await
            {
                Ok(data) => return Ok(data.issues),
                Err(err) if attempt < MAX_PAGE_ATTEMPTS => {
                    warn!(
                        attempt,
                        max_attempts = MAX_PAGE_ATTEMPTS,
                        error = %err,
                        "Page fetch failed, retrying"
                    );
                    tokio::time::sleep(PAGE_RETRY_DELAY * attempt).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl TicketSource for LinearClient {
    async fn completed_in_window(&self, window: &Window) -> relnote_core::Result<Vec<Ticket>> {
        Ok(self.completed_issues(window).await?)
    }
}
