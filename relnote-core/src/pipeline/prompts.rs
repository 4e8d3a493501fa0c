//! Prompt templates for the pipeline stages
//!
//! Each builder shapes ticket fields into the stage's prompt and states the
//! exact JSON contract the parser expects. Long free-text fields are
//! truncated to keep prompts bounded.

use crate::meetings::Meeting;
use crate::pipeline::draft::PendingEntry;
use crate::pipeline::{EntryKind, FilterOutcome};
use crate::ticket::{truncate, Ticket};

/// Character budget for a ticket description in the filter prompt
const FILTER_DESCRIPTION_CHARS: usize = 1500;
/// Comments fed to the filter prompt: at most this many per ticket
const FILTER_MAX_COMMENTS: usize = 5;
/// Character budget per comment in the filter prompt
const FILTER_COMMENT_CHARS: usize = 800;
/// Character budget per ticket description in the draft prompt
const DRAFT_DESCRIPTION_CHARS: usize = 800;
/// Character budget for the combined meeting notes in the context prompt
const CONTEXT_NOTES_CHARS: usize = 3000;
/// Character budget per ticket description in the tailored prompt
const TAILOR_FEATURE_CHARS: usize = 500;
const TAILOR_FIX_CHARS: usize = 300;

/// Filter stage prompt over all fetched tickets
pub fn filter_prompt(tickets: &[Ticket]) -> String {
    let tickets_text = tickets
        .iter()
        .map(|t| {
            let mut text = format!(
                "ID: {}\nTitle: {}\nAssignee: {}\nTeam: {}\nProject: {}\nInitiatives: {}\nLabels: {}\nDescription: {}",
                t.id,
                t.title,
                t.assignee_name(),
                t.team.as_deref().unwrap_or("None"),
                t.project.as_deref().unwrap_or("None"),
                if t.initiatives.is_empty() {
                    "None".to_string()
                } else {
                    t.initiatives.join(", ")
                },
                t.labels.join(", "),
                t.description_excerpt(FILTER_DESCRIPTION_CHARS),
            );
            if !t.comments.is_empty() {
                let comments = t
                    .comments
                    .iter()
                    .take(FILTER_MAX_COMMENTS)
                    .map(|c| format!("- {}", truncate(c, FILTER_COMMENT_CHARS)))
                    .collect::<Vec<_>>()
                    .join("\n");
                text.push_str("\nComments:\n");
                text.push_str(&comments);
            }
            text
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are helping a B2B SaaS company decide which completed tickets belong in customer-facing release notes.

The tracker contains plenty of internal work. Filter out anything not worth mentioning to customers.

EXCLUDE - look for these signals:
- Testing/QA: "Test X", "QA findings", "Validate", "Run evaluations"
- Planning: "PRD", "Requirements", "Spec"
- Investigation: "Investigate", "Debug", "Answer X question", "Follow up on"
- Backend details: "schema", "endpoint", "route", "migration" (unless user-facing)
- Internal infrastructure: secret management, provisioning, DNS, CI/CD
- Vague parent tickets with no concrete deliverable

CATEGORIZATION - for EACH ticket decide: feature, fix, or exclude.
- "feature" = a NEW capability you would promote to customers: new integrations, significant UI changes that enable new workflows.
- "fix" = bug fixes, copy changes, performance improvements, minor polish. Worth mentioning but not headline news.
- "exclude" = internal work, not customer-facing.

Return a JSON array where each item has:
- "id": the ticket ID
- "decision": "feature", "fix", or "exclude"
- "reason": 5-10 word explanation

Every ticket listed below must appear exactly once in the array.
Return ONLY the JSON array.

TICKETS:
{tickets_text}"#
    )
}

/// Group stage prompt over the customer-worthy tickets
pub fn group_prompt(outcome: &FilterOutcome) -> String {
    let format_ticket = |ticket: &Ticket, was: &str| {
        format!(
            "ID: {}\nTitle: {}\nAssignee: {}\nProject: {}\nCompleted: {}\nWas: {}",
            ticket.id,
            ticket.title,
            ticket.assignee_name(),
            ticket.project.as_deref().unwrap_or("None"),
            ticket.completed_at.format("%Y-%m-%d"),
            was,
        )
    };

    let tickets_text = outcome
        .features
        .iter()
        .map(|c| format_ticket(&c.ticket, "feature"))
        .chain(outcome.fixes.iter().map(|c| format_ticket(&c.ticket, "fix")))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are grouping related tickets into customer-facing features for release notes.

THE KEY QUESTION: "Would a customer think of these as ONE feature or MULTIPLE features?"

GROUP TOGETHER when tickets deliver the same underlying capability, even across frontend and backend work or different engineers. Example: "Export to PDF" + "Export to CSV" = ONE feature called "Data export".

KEEP SEPARATE when capabilities differ, even if related. Example: "GitHub integration" vs "Jira integration" = SEPARATE.

Standalone fixes go in "ungrouped_fixes".

Every ticket ID listed below must appear exactly once, either in a group or in "ungrouped_fixes". Do not invent IDs.

Return JSON:
{{
  "groups": [
    {{"name": "Feature Name", "tickets": ["id1", "id2"], "summary": "One-sentence customer benefit"}}
  ],
  "ungrouped_fixes": ["id3", "id4"]
}}

Return ONLY the JSON object.

TICKETS TO GROUP:
{tickets_text}"#
    )
}

/// Draft stage prompt over the ordered summary entries
pub(crate) fn draft_prompt(entries: &[PendingEntry<'_>]) -> String {
    let entries_text = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let kind = match entry.kind {
                EntryKind::Feature => "FEATURE GROUP",
                EntryKind::Fix => "FIX",
            };
            let tickets = entry
                .tickets
                .iter()
                .map(|t| {
                    format!(
                        "  - {}: {}",
                        t.title,
                        t.description_excerpt(DRAFT_DESCRIPTION_CHARS)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "ENTRY {} ({kind}): {}\nSummary: {}\nTickets:\n{}",
                i + 1,
                entry.name,
                if entry.summary.is_empty() {
                    "N/A"
                } else {
                    entry.summary.as_str()
                },
                tickets,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are writing customer-facing release notes in a casual, friendly tone.

For each entry below, write ONE bullet point in Slack mrkdwn:
- Use *asterisks* for bold (not **double**), • for the main bullet, ◦ for optional sub-bullets with a 4-space indent.
- Explain the "SO WHAT": not just what it does, but why it matters and what it enables.
  - BAD: "GitHub integration - now connects to GitHub"
  - GOOD: "• *GitHub integration* - pull in PR history automatically, so you can see what shipped without leaving the app"
- Use "Previously X, now Y" framing when it helps explain why a change matters.
- Keep it to 1-2 sentences for the main point; sub-bullets only when they add real value.

Return a JSON array of strings with EXACTLY {count} elements, one complete mrkdwn bullet per entry, in the same order as the entries below.
Return ONLY the JSON array.

ENTRIES:
{entries_text}"#,
        count = entries.len(),
    )
}

/// Context stage prompt over a customer's recent meeting notes
pub fn context_prompt(customer: &str, meetings: &[Meeting]) -> String {
    let meetings_text = truncate(
        &meetings
            .iter()
            .map(|m| {
                format!(
                    "=== {} ({}) ===\n{}",
                    m.title,
                    m.date.format("%Y-%m-%d"),
                    m.notes
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
        CONTEXT_NOTES_CHARS,
    );

    format!(
        r#"Analyze these meeting notes from calls with {customer} and extract:

1. Pain points: what problems or frustrations did they mention?
2. Feature requests: what did they ask for or wish existed?
3. Interests: which capabilities seemed most useful to them?
4. Context: their environment, tools, team structure, workflows.

Be specific and quote or paraphrase their actual words where possible.

MEETING NOTES:
{meetings_text}

Provide a structured summary that can be used to tailor release notes for this customer."#
    )
}

/// Tailored-draft prompt for a specific customer
pub fn tailor_prompt(customer: &str, context: &str, outcome: &FilterOutcome) -> String {
    let format_list = |tickets: &[crate::pipeline::CategorizedTicket], chars: usize| {
        if tickets.is_empty() {
            "None".to_string()
        } else {
            tickets
                .iter()
                .map(|c| format!("- {}: {}", c.ticket.title, c.ticket.description_excerpt(chars)))
                .collect::<Vec<_>>()
                .join("\n")
        }
    };

    let features_text = format_list(&outcome.features, TAILOR_FEATURE_CHARS);
    let fixes_text = format_list(&outcome.fixes, TAILOR_FIX_CHARS);

    format!(
        r#"You are writing customer-specific release notes for {customer}.

CUSTOMER CONTEXT (from recent calls):
{context}

FEATURES THAT SHIPPED:
{features_text}

BUG FIXES / QOL:
{fixes_text}

Write release notes that:
1. Lead with what matters to them: if a shipped feature addresses their pain points or requests, highlight it prominently.
2. Use their language: reference the tools and workflows they mentioned.
3. Skip irrelevant items: a shorter list is fine.
4. Add "you asked, we built" moments, crediting the person who raised the feedback by name.
5. Stay conversational: these notes go to a team we know.

Address the note to the TEAM (e.g. "Hey team!"), not to an individual, but DO reference individuals by name when citing their feedback.

FORMAT: Slack mrkdwn (*bold*, bullet points), concise but personalized, with a brief intro acknowledging the relationship."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::ticket;
    use crate::pipeline::CategorizedTicket;

    #[test]
    fn test_filter_prompt_lists_every_ticket() {
        let tickets = vec![ticket("t1", "First"), ticket("t2", "Second")];
        let prompt = filter_prompt(&tickets);
        assert!(prompt.contains("ID: t1"));
        assert!(prompt.contains("ID: t2"));
        assert!(prompt.contains("Return ONLY the JSON array"));
    }

    #[test]
    fn test_filter_prompt_caps_comments() {
        let mut t = ticket("t1", "Commented ticket");
        t.comments = (1..=7).map(|n| format!("comment {}", n)).collect();
        t.initiatives = vec!["Q1 platform".to_string()];

        let prompt = filter_prompt(&[t]);
        assert!(prompt.contains("Initiatives: Q1 platform"));
        assert!(prompt.contains("- comment 1"));
        assert!(prompt.contains("- comment 5"));
        assert!(!prompt.contains("- comment 6"));

        // No comments section for a bare ticket
        let bare = filter_prompt(&[ticket("t2", "Bare")]);
        assert!(!bare.contains("Comments:"));
    }

    #[test]
    fn test_group_prompt_marks_prior_category() {
        let outcome = FilterOutcome {
            features: vec![CategorizedTicket {
                ticket: ticket("f1", "Feature one"),
                reason: "x".into(),
            }],
            fixes: vec![CategorizedTicket {
                ticket: ticket("x1", "Fix one"),
                reason: "y".into(),
            }],
            excluded: vec![],
        };
        let prompt = group_prompt(&outcome);
        assert!(prompt.contains("Was: feature"));
        assert!(prompt.contains("Was: fix"));
        // Excluded tickets never reach the group prompt
        assert!(!prompt.contains("excluded"));
    }

    #[test]
    fn test_draft_prompt_states_block_count() {
        let t1 = ticket("f1", "Export");
        let entries = vec![PendingEntry {
            kind: EntryKind::Feature,
            name: "Data export".into(),
            summary: "Export data".into(),
            tickets: vec![&t1],
        }];
        let prompt = draft_prompt(&entries);
        assert!(prompt.contains("EXACTLY 1 elements"));
        assert!(prompt.contains("ENTRY 1 (FEATURE GROUP): Data export"));
    }
}
