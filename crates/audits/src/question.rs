use serde::{Deserialize, Serialize};

use auditdesk_auth::{FieldSet, QuestionField};
use auditdesk_core::{DomainError, DomainResult, QuestionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionStatus {
    Compliant,
    NonCompliant,
    Partial,
    #[default]
    NotAnswered,
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStatus::Compliant => "compliant",
            QuestionStatus::NonCompliant => "non-compliant",
            QuestionStatus::Partial => "partial",
            QuestionStatus::NotAnswered => "not-answered",
        }
    }
}

/// A questionnaire item owned by exactly one audit.
///
/// Invariant: `status == NotAnswered` iff `response` is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditQuestion {
    pub id: QuestionId,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "question")]
    pub text: String,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub status: QuestionStatus,
    #[serde(default)]
    pub evidence: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

impl AuditQuestion {
    pub fn is_answered(&self) -> bool {
        self.response.is_some()
    }

    pub fn is_consistent(&self) -> bool {
        self.is_answered() == (self.status != QuestionStatus::NotAnswered)
    }
}

/// Partial question update (`PATCH /audits/{id}/questions/{qid}/`).
///
/// `Some("")` for `response` clears the answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<QuestionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl QuestionPatch {
    pub fn touched_fields(&self) -> FieldSet {
        let mut fields = FieldSet::new();
        if self.response.is_some() {
            fields.insert(QuestionField::Response);
        }
        if self.evidence.is_some() {
            fields.insert(QuestionField::Evidence);
        }
        if self.status.is_some() {
            fields.insert(QuestionField::Status);
        }
        if self.recommendation.is_some() {
            fields.insert(QuestionField::Recommendation);
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.touched_fields().is_empty()
    }

    /// The question as it would look after this patch, or the invariant it breaks.
    ///
    /// A first answer on a `NotAnswered` question moves it to `Partial` until
    /// the expert evaluates it; clearing the answer resets it to `NotAnswered`.
    pub fn preview(&self, question: &AuditQuestion) -> DomainResult<AuditQuestion> {
        let mut next = question.clone();

        if let Some(response) = &self.response {
            let trimmed = response.trim();
            if trimmed.is_empty() {
                next.response = None;
                next.status = QuestionStatus::NotAnswered;
            } else {
                next.response = Some(trimmed.to_string());
                if next.status == QuestionStatus::NotAnswered {
                    next.status = QuestionStatus::Partial;
                }
            }
        }
        if let Some(evidence) = &self.evidence {
            next.evidence = Some(evidence.clone()).filter(|e| !e.trim().is_empty());
        }
        if let Some(recommendation) = &self.recommendation {
            next.recommendation = Some(recommendation.clone()).filter(|r| !r.trim().is_empty());
        }
        if let Some(status) = self.status {
            if status == QuestionStatus::NotAnswered && next.is_answered() {
                return Err(DomainError::invariant(
                    "an answered question cannot be marked not-answered",
                ));
            }
            if status != QuestionStatus::NotAnswered && !next.is_answered() {
                return Err(DomainError::invariant(format!(
                    "question {} has no response to evaluate",
                    question.id
                )));
            }
            next.status = status;
        }

        Ok(next)
    }
}
