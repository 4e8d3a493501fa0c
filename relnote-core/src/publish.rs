//! Message assembly and the delivery seam
//!
//! Assembly is deterministic: the same pipeline result and window always
//! render byte-identical text. Delivery is behind the [`Publisher`] trait;
//! runs without a publisher are previews and make no outbound call.

use async_trait::async_trait;

use crate::pipeline::{EntryKind, PipelineResult};
use crate::ticket::Window;
use crate::Result;

/// Outbound delivery of a finished message
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Deliver the message to the destination
    async fn deliver(&self, message: &str) -> Result<()>;
}

/// Render the notes body: features section, then fixes
///
/// Section headers are omitted when a section is empty. Entry text comes
/// from the draft stage verbatim, in entry order.
pub fn render_notes(result: &PipelineResult) -> String {
    let section = |kind: EntryKind| {
        result
            .entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.text.as_str())
            .collect::<Vec<_>>()
    };

    let features = section(EntryKind::Feature);
    let fixes = section(EntryKind::Fix);

    let mut sections = Vec::new();
    if !features.is_empty() {
        sections.push(format!("*New features*\n{}", features.join("\n")));
    }
    if !fixes.is_empty() {
        sections.push(format!(
            "*Bug fixes / quality of life*\n{}",
            fixes.join("\n")
        ));
    }

    sections.join("\n\n")
}

/// Wrap the notes body in the delivery banner
pub fn render_message(notes: &str, window: &Window, customer: Option<&str>) -> String {
    let title = match customer {
        Some(name) => format!("Product Updates for {}", name.to_uppercase()),
        None => "Product Updates".to_string(),
    };
    format!(
        "🚀 *{}* ({})\n{}\n\n{}",
        title,
        window,
        "─".repeat(40),
        notes
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::draft::SummaryEntry;

    fn entry(kind: EntryKind, text: &str) -> SummaryEntry {
        SummaryEntry {
            kind,
            name: "n".into(),
            summary: String::new(),
            ticket_ids: vec!["t".into()],
            text: text.into(),
        }
    }

    fn window() -> Window {
        Window::new(
            "2025-01-01T00:00:00Z".parse().unwrap(),
            "2025-01-15T00:00:00Z".parse().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_render_orders_features_before_fixes() {
        let result = PipelineResult {
            entries: vec![
                entry(EntryKind::Fix, "• fix one"),
                entry(EntryKind::Feature, "• feature one"),
                entry(EntryKind::Fix, "• fix two"),
            ],
            excluded: vec![],
        };

        let notes = render_notes(&result);
        let features_at = notes.find("*New features*").unwrap();
        let fixes_at = notes.find("*Bug fixes / quality of life*").unwrap();
        assert!(features_at < fixes_at);
        assert!(notes.contains("• fix one\n• fix two"));
    }

    #[test]
    fn test_render_omits_empty_sections() {
        let result = PipelineResult {
            entries: vec![entry(EntryKind::Feature, "• feature")],
            excluded: vec![],
        };
        let notes = render_notes(&result);
        assert!(notes.contains("*New features*"));
        assert!(!notes.contains("*Bug fixes"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let result = PipelineResult {
            entries: vec![
                entry(EntryKind::Feature, "• a"),
                entry(EntryKind::Fix, "• b"),
            ],
            excluded: vec![],
        };
        let first = render_message(&render_notes(&result), &window(), None);
        let second = render_message(&render_notes(&result), &window(), None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_message_banner() {
        let message = render_message("body", &window(), Some("acme"));
        assert!(message.starts_with("🚀 *Product Updates for ACME* (2025-01-01 → 2025-01-15)"));
        assert!(message.ends_with("\n\nbody"));
    }
}
