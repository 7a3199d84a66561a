use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use auditdesk_core::{DomainError, DomainResult, HistoryEntryId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Submission,
    Feedback,
    StatusChange,
}

impl HistoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryKind::Submission => "submission",
            HistoryKind::Feedback => "feedback",
            HistoryKind::StatusChange => "status_change",
        }
    }
}

/// One entry of an audit's timeline (`GET /audits/{id}/timeline/`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryEntryId,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    #[serde(default)]
    pub content: String,
    /// Attached file references (names or URLs; storage is out of scope).
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub author: Option<UserId>,
}

/// Append-only, date-ordered history log.
///
/// Entries are never edited or removed. Entries with equal dates keep their
/// arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    entries: Vec<HistoryEntry>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a server listing, ordering by date.
    pub fn from_entries(mut entries: Vec<HistoryEntry>) -> Self {
        entries.sort_by_key(|e| e.date);
        let mut timeline = Self::new();
        for entry in entries {
            // Server listings may repeat an entry across pages; first copy wins.
            let _ = timeline.append(entry);
        }
        timeline
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: HistoryEntryId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Append one entry. A known id is rejected, since entries are immutable.
    pub fn append(&mut self, entry: HistoryEntry) -> DomainResult<()> {
        if self.contains(entry.id) {
            return Err(DomainError::conflict(format!(
                "history entry {} already recorded",
                entry.id
            )));
        }

        // Insert after every entry dated at or before this one.
        let at = self.entries.partition_point(|e| e.date <= entry.date);
        self.entries.insert(at, entry);
        Ok(())
    }

    /// Append entries from a fresher server copy that are not yet known.
    /// Returns how many were added.
    pub fn merge(&mut self, incoming: &[HistoryEntry]) -> usize {
        let mut added = 0;
        for entry in incoming {
            if self.append(entry.clone()).is_ok() {
                added += 1;
            }
        }
        added
    }

    /// The latest submission, unless feedback was recorded after it.
    pub fn pending_submission(&self) -> Option<&HistoryEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| matches!(e.kind, HistoryKind::Submission | HistoryKind::Feedback))
            .filter(|e| e.kind == HistoryKind::Submission)
    }
}
