//! Customer meeting-notes cache
//!
//! Reads a locally synced meeting cache (a JSON file whose `cache` field is
//! itself a stringified JSON document) and selects recent meetings for a
//! customer by matching folder titles against the configured alias terms.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{Error, Result};

/// Minimum note length for a meeting to count as having content
const MIN_NOTE_CHARS: usize = 50;

/// A meeting with notes
#[derive(Debug, Clone)]
pub struct Meeting {
    pub title: String,
    pub date: DateTime<Utc>,
    pub notes: String,
}

/// Outer cache file: the payload is double-encoded
#[derive(Debug, Deserialize)]
struct CacheFile {
    cache: String,
}

#[derive(Debug, Deserialize)]
struct CachePayload {
    #[serde(default)]
    state: CacheState,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheState {
    #[serde(default)]
    documents: HashMap<String, Document>,
    #[serde(default)]
    document_lists: HashMap<String, Vec<String>>,
    #[serde(default)]
    document_lists_metadata: HashMap<String, ListMetadata>,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    title: Option<String>,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    notes_markdown: Option<String>,
    #[serde(default)]
    notes_plain: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListMetadata {
    #[serde(default)]
    title: Option<String>,
}

/// Find recent meetings whose folder title matches any search term
///
/// Matching is case-insensitive substring search, as folder names rarely
/// match customer names exactly. Results are sorted newest first.
pub fn find_customer_meetings(
    cache_path: &Path,
    search_terms: &[String],
    days_back: i64,
    now: DateTime<Utc>,
) -> Result<Vec<Meeting>> {
    let contents = std::fs::read_to_string(cache_path).map_err(Error::Io)?;
    let outer: CacheFile = serde_json::from_str(&contents)
        .map_err(|e| Error::Config(format!("Failed to parse meeting cache: {}", e)))?;
    let payload: CachePayload = serde_json::from_str(&outer.cache)
        .map_err(|e| Error::Config(format!("Failed to parse meeting cache payload: {}", e)))?;

    let state = payload.state;
    let cutoff = now - Duration::days(days_back);

    // Folders whose title mentions the customer
    let matching_folders: Vec<&String> = state
        .document_lists_metadata
        .iter()
        .filter(|(_, meta)| {
            let title = meta.title.as_deref().unwrap_or_default().to_lowercase();
            search_terms.iter().any(|term| title.contains(term.as_str()))
        })
        .map(|(id, meta)| {
            debug!(folder = meta.title.as_deref().unwrap_or("?"), "Matched folder");
            id
        })
        .collect();

    let mut seen_docs = std::collections::HashSet::new();
    let mut meetings = Vec::new();

    for folder_id in matching_folders {
        let Some(doc_ids) = state.document_lists.get(folder_id) else {
            continue;
        };
        for doc_id in doc_ids {
            if !seen_docs.insert(doc_id) {
                continue;
            }
            let Some(doc) = state.documents.get(doc_id) else {
                continue;
            };
            let Some(created) = doc.created_at else {
                continue;
            };
            if created < cutoff {
                continue;
            }

            let notes = doc
                .notes_markdown
                .as_deref()
                .filter(|n| !n.is_empty())
                .or(doc.notes_plain.as_deref())
                .unwrap_or_default();
            if notes.len() < MIN_NOTE_CHARS {
                continue;
            }

            meetings.push(Meeting {
                title: doc
                    .title
                    .clone()
                    .unwrap_or_else(|| "Untitled".to_string()),
                date: created,
                notes: notes.to_string(),
            });
        }
    }

    meetings.sort_by(|a, b| b.date.cmp(&a.date));

    info!(count = meetings.len(), "Found customer meetings");

    Ok(meetings)
}
