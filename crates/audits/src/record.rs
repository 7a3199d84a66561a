use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use auditdesk_auth::{Assigned, Scoped};
use auditdesk_core::{AuditId, AuditStatus, CompanyId, DomainError, DomainResult, Entity, UserId};

use crate::history::HistoryEntry;
use crate::question::AuditQuestion;

/// Audit read model as served by `GET /audits/` and `GET /audits/{id}/`.
///
/// List responses omit `questions` and `history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditId,
    pub name: String,
    pub company: CompanyId,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub expert: Option<UserId>,
    #[serde(default)]
    pub participant: Option<UserId>,
    pub status: AuditStatus,
    /// Percentage in `0..=100`.
    #[serde(default)]
    pub completion: u8,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub questions: Vec<AuditQuestion>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl AuditRecord {
    pub fn completion_clamped(&self) -> u8 {
        self.completion.min(100)
    }
}

impl Entity for AuditRecord {
    type Id = AuditId;

    fn id(&self) -> AuditId {
        self.id
    }
}

impl Scoped for AuditRecord {
    fn organization(&self) -> Option<CompanyId> {
        Some(self.company)
    }
}

impl Assigned for AuditRecord {
    fn expert(&self) -> Option<UserId> {
        self.expert
    }

    fn participant(&self) -> Option<UserId> {
        self.participant
    }
}

/// Write payload for `POST /audits/` and `PUT /audits/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDraft {
    pub name: String,
    pub company: CompanyId,
    pub expert: Option<UserId>,
    pub participant: Option<UserId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl AuditDraft {
    pub fn from_record(record: &AuditRecord) -> Self {
        Self {
            name: record.name.clone(),
            company: record.company,
            expert: record.expert,
            participant: record.participant,
            start_date: record.start_date,
            end_date: record.end_date,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("audit name cannot be empty"));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(DomainError::validation("end date must not be before start date"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_items_parse_without_nested_collections() {
        let json = serde_json::json!({
            "id": 1, "name": "ISO 27001 readiness", "company": 4,
            "expert": 2, "participant": 3, "status": "Planned",
            "completion": 0, "start_date": "2024-05-01"
        });
        let record: AuditRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.status, AuditStatus::Planned);
        assert!(record.questions.is_empty());
        assert_eq!(record.organization(), Some(CompanyId::new(4)));
        assert_eq!(record.start_date, NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn draft_rejects_inverted_dates() {
        let draft = AuditDraft {
            name: "Q3 review".to_string(),
            company: CompanyId::new(1),
            expert: None,
            participant: None,
            start_date: NaiveDate::from_ymd_opt(2024, 9, 30),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 1),
        };
        assert!(matches!(draft.validate(), Err(DomainError::Validation(_))));
    }
}
