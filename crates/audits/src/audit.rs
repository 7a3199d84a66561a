use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use auditdesk_auth::{
    Assigned, AuditAction, CapabilityTable, Principal, Relation, authorize_audit, relation_to,
};
use auditdesk_core::{
    Aggregate, AggregateRoot, AuditId, AuditStatus, CompanyId, DomainError, DomainResult, Event,
    QuestionId, UserId,
};

use crate::history::{HistoryEntry, Timeline};
use crate::question::{AuditQuestion, QuestionPatch, QuestionStatus};
use crate::record::{AuditDraft, AuditRecord};

/// Aggregate root: one audit with its questionnaire and timeline.
///
/// # Invariants
/// - Status only moves forward: `Planned → In Progress → Completed`.
/// - `completion` never decreases and stays within `0..=100`.
/// - Questions are writable only while the audit is in progress.
/// - History entries are appended, never edited or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audit {
    id: AuditId,
    name: String,
    company: CompanyId,
    company_name: Option<String>,
    expert: Option<UserId>,
    participant: Option<UserId>,
    status: AuditStatus,
    completion: u8,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    created_at: Option<DateTime<Utc>>,
    questions: Vec<AuditQuestion>,
    timeline: Timeline,
    review_requested_at: Option<DateTime<Utc>>,
    version: u64,
}

impl Audit {
    /// Load from the server's copy. A submission without later feedback in
    /// the history leaves the audit awaiting review.
    pub fn hydrate(record: AuditRecord) -> Self {
        let completion = record.completion_clamped();
        let mut audit = Self {
            id: record.id,
            name: record.name,
            company: record.company,
            company_name: record.company_name,
            expert: record.expert,
            participant: record.participant,
            status: record.status,
            completion,
            start_date: record.start_date,
            end_date: record.end_date,
            created_at: record.created_at,
            questions: record.questions,
            timeline: Timeline::from_entries(record.history),
            review_requested_at: None,
            version: 0,
        };
        audit.sync_review_state();
        audit
    }

    /// Current state as a read model (questions and history included).
    pub fn snapshot(&self) -> AuditRecord {
        AuditRecord {
            id: self.id,
            name: self.name.clone(),
            company: self.company,
            company_name: self.company_name.clone(),
            expert: self.expert,
            participant: self.participant,
            status: self.status,
            completion: self.completion,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
            questions: self.questions.clone(),
            history: self.timeline.entries().to_vec(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn company(&self) -> CompanyId {
        self.company
    }

    pub fn company_name(&self) -> Option<&str> {
        self.company_name.as_deref()
    }

    pub fn status(&self) -> AuditStatus {
        self.status
    }

    pub fn completion(&self) -> u8 {
        self.completion
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn questions(&self) -> &[AuditQuestion] {
        &self.questions
    }

    pub fn question(&self, id: QuestionId) -> Option<&AuditQuestion> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// A participant submitted and no feedback has been sent since.
    pub fn awaiting_review(&self) -> bool {
        self.review_requested_at.is_some()
    }

    /// Answered questions over total, `None` for an empty questionnaire.
    pub fn answered_ratio(&self) -> Option<f32> {
        if self.questions.is_empty() {
            return None;
        }
        let answered = self.questions.iter().filter(|q| q.is_answered()).count();
        Some(answered as f32 / self.questions.len() as f32)
    }

    pub fn relation_of(&self, principal: &Principal) -> Relation {
        relation_to(principal, self)
    }

    /// Actions `principal` may take right now.
    pub fn available_actions(&self, principal: &Principal) -> Vec<AuditAction> {
        CapabilityTable::new()
            .audit_actions(principal.role, self.status, self.relation_of(principal))
            .into_iter()
            .collect()
    }

    /// Merge a timeline listing; returns how many entries were new.
    pub fn merge_history(&mut self, entries: &[HistoryEntry]) -> usize {
        let added = self.timeline.merge(entries);
        if added > 0 {
            self.sync_review_state();
        }
        added
    }

    fn sync_review_state(&mut self) {
        self.review_requested_at = self.timeline.pending_submission().map(|e| e.date);
    }

    /// Fold in a fresher server copy without breaking local invariants:
    /// status never moves back, completion never decreases, history only grows.
    pub fn absorb(&mut self, server: &AuditRecord) -> DomainResult<()> {
        if server.id != self.id {
            return Err(DomainError::invariant("audit id mismatch"));
        }

        if server.status > self.status {
            self.status = server.status;
        }
        self.completion = self.completion.max(server.completion_clamped());

        self.name = server.name.clone();
        self.company_name = server.company_name.clone().or(self.company_name.take());
        self.expert = server.expert;
        self.participant = server.participant;
        self.start_date = server.start_date;
        self.end_date = server.end_date;
        if !server.questions.is_empty() {
            self.questions = server.questions.clone();
        }
        self.merge_history(&server.history);
        Ok(())
    }

    /// Apply a batch of events confirmed by the server.
    pub fn confirm(&mut self, events: &[AuditEvent]) {
        self.apply_all(events);
    }

    /// Confirm `events` and fold in the server's answer to the write that
    /// produced them. A copy of another audit is rejected before anything
    /// changes.
    pub fn settle(&mut self, events: &[AuditEvent], server: &AuditRecord) -> DomainResult<()> {
        if server.id != self.id {
            return Err(DomainError::invariant("audit id mismatch"));
        }
        self.confirm(events);
        self.absorb(server)
    }
}

impl AggregateRoot for Audit {
    type Id = AuditId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Assigned for Audit {
    fn expert(&self) -> Option<UserId> {
        self.expert
    }

    fn participant(&self) -> Option<UserId> {
        self.participant
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Command: Start (expert, Planned → In Progress).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Start {
    pub actor: Principal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SubmitForReview (participant, status unchanged).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitForReview {
    pub actor: Principal,
    /// Optional note to the expert.
    pub content: String,
    pub files: Vec<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SendFeedback (expert, status unchanged).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFeedback {
    pub actor: Principal,
    pub content: String,
    pub files: Vec<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Complete (expert, In Progress → Completed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complete {
    pub actor: Principal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateQuestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateQuestion {
    pub actor: Principal,
    pub question_id: QuestionId,
    pub patch: QuestionPatch,
    pub occurred_at: DateTime<Utc>,
}

/// Command: EditDetails (name, dates, assignees).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDetails {
    pub actor: Principal,
    pub draft: AuditDraft,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditCommand {
    Start(Start),
    SubmitForReview(SubmitForReview),
    SendFeedback(SendFeedback),
    Complete(Complete),
    UpdateQuestion(UpdateQuestion),
    EditDetails(EditDetails),
}

impl AuditCommand {
    pub fn actor(&self) -> &Principal {
        match self {
            AuditCommand::Start(c) => &c.actor,
            AuditCommand::SubmitForReview(c) => &c.actor,
            AuditCommand::SendFeedback(c) => &c.actor,
            AuditCommand::Complete(c) => &c.actor,
            AuditCommand::UpdateQuestion(c) => &c.actor,
            AuditCommand::EditDetails(c) => &c.actor,
        }
    }

    /// The capability this command needs. Question updates are gated per field.
    pub fn required_action(&self) -> Option<AuditAction> {
        match self {
            AuditCommand::Start(_) => Some(AuditAction::Start),
            AuditCommand::SubmitForReview(_) => Some(AuditAction::SubmitForReview),
            AuditCommand::SendFeedback(_) => Some(AuditAction::SendFeedback),
            AuditCommand::Complete(_) => Some(AuditAction::Complete),
            AuditCommand::EditDetails(_) => Some(AuditAction::Edit),
            AuditCommand::UpdateQuestion(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub audit_id: AuditId,
    pub from: AuditStatus,
    pub to: AuditStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRaised {
    pub audit_id: AuditId,
    pub completion: u8,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequested {
    pub audit_id: AuditId,
    pub content: String,
    pub files: Vec<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackGiven {
    pub audit_id: AuditId,
    pub content: String,
    pub files: Vec<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionUpdated {
    pub audit_id: AuditId,
    pub patch: QuestionPatch,
    /// The question after the patch.
    pub question: AuditQuestion,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailsEdited {
    pub audit_id: AuditId,
    pub draft: AuditDraft,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEvent {
    StatusChanged(StatusChanged),
    CompletionRaised(CompletionRaised),
    ReviewRequested(ReviewRequested),
    FeedbackGiven(FeedbackGiven),
    QuestionUpdated(QuestionUpdated),
    DetailsEdited(DetailsEdited),
}

impl Event for AuditEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::StatusChanged(_) => "audits.audit.status_changed",
            AuditEvent::CompletionRaised(_) => "audits.audit.completion_raised",
            AuditEvent::ReviewRequested(_) => "audits.audit.review_requested",
            AuditEvent::FeedbackGiven(_) => "audits.audit.feedback_given",
            AuditEvent::QuestionUpdated(_) => "audits.audit.question_updated",
            AuditEvent::DetailsEdited(_) => "audits.audit.details_edited",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AuditEvent::StatusChanged(e) => e.occurred_at,
            AuditEvent::CompletionRaised(e) => e.occurred_at,
            AuditEvent::ReviewRequested(e) => e.occurred_at,
            AuditEvent::FeedbackGiven(e) => e.occurred_at,
            AuditEvent::QuestionUpdated(e) => e.occurred_at,
            AuditEvent::DetailsEdited(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Audit {
    type Command = AuditCommand;
    type Event = AuditEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AuditEvent::StatusChanged(e) => {
                if self.status.can_transition_to(e.to) {
                    self.status = e.to;
                }
            }
            AuditEvent::CompletionRaised(e) => {
                self.completion = self.completion.max(e.completion.min(100));
            }
            AuditEvent::ReviewRequested(e) => {
                self.review_requested_at = Some(e.occurred_at);
            }
            AuditEvent::FeedbackGiven(_) => {
                self.review_requested_at = None;
            }
            AuditEvent::QuestionUpdated(e) => {
                if let Some(q) = self.questions.iter_mut().find(|q| q.id == e.question.id) {
                    *q = e.question.clone();
                }
            }
            AuditEvent::DetailsEdited(e) => {
                self.name = e.draft.name.trim().to_string();
                self.expert = e.draft.expert;
                self.participant = e.draft.participant;
                self.start_date = e.draft.start_date;
                self.end_date = e.draft.end_date;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        if let Some(action) = command.required_action() {
            self.ensure_allowed(command.actor(), action)?;
        }

        match command {
            AuditCommand::Start(cmd) => self.handle_start(cmd),
            AuditCommand::SubmitForReview(cmd) => self.handle_submit(cmd),
            AuditCommand::SendFeedback(cmd) => self.handle_feedback(cmd),
            AuditCommand::Complete(cmd) => self.handle_complete(cmd),
            AuditCommand::UpdateQuestion(cmd) => self.handle_update_question(cmd),
            AuditCommand::EditDetails(cmd) => self.handle_edit(cmd),
        }
    }
}

impl Audit {
    fn ensure_allowed(&self, actor: &Principal, action: AuditAction) -> Result<(), DomainError> {
        authorize_audit(actor, self.status, self.relation_of(actor), action)
            .map_err(|e| DomainError::unauthorized(e.to_string()))
    }

    fn status_change(&self, to: AuditStatus, at: DateTime<Utc>) -> Result<AuditEvent, DomainError> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::invariant(format!(
                "cannot move audit from {} to {}",
                self.status, to
            )));
        }
        Ok(AuditEvent::StatusChanged(StatusChanged {
            audit_id: self.id,
            from: self.status,
            to,
            occurred_at: at,
        }))
    }

    fn handle_start(&self, cmd: &Start) -> Result<Vec<AuditEvent>, DomainError> {
        Ok(vec![self.status_change(AuditStatus::InProgress, cmd.occurred_at)?])
    }

    fn handle_submit(&self, cmd: &SubmitForReview) -> Result<Vec<AuditEvent>, DomainError> {
        if !self.questions.is_empty() && !self.questions.iter().any(|q| q.is_answered()) {
            return Err(DomainError::validation(
                "answer at least one question before submitting for review",
            ));
        }
        if self.awaiting_review() {
            return Err(DomainError::conflict("a submission is already awaiting review"));
        }

        Ok(vec![AuditEvent::ReviewRequested(ReviewRequested {
            audit_id: self.id,
            content: cmd.content.trim().to_string(),
            files: cmd.files.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_feedback(&self, cmd: &SendFeedback) -> Result<Vec<AuditEvent>, DomainError> {
        if cmd.content.trim().is_empty() {
            return Err(DomainError::validation("feedback cannot be empty"));
        }

        Ok(vec![AuditEvent::FeedbackGiven(FeedbackGiven {
            audit_id: self.id,
            content: cmd.content.trim().to_string(),
            files: cmd.files.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_complete(&self, cmd: &Complete) -> Result<Vec<AuditEvent>, DomainError> {
        Ok(vec![
            self.status_change(AuditStatus::Completed, cmd.occurred_at)?,
            AuditEvent::CompletionRaised(CompletionRaised {
                audit_id: self.id,
                completion: 100,
                occurred_at: cmd.occurred_at,
            }),
        ])
    }

    fn handle_update_question(&self, cmd: &UpdateQuestion) -> Result<Vec<AuditEvent>, DomainError> {
        if cmd.patch.is_empty() {
            return Err(DomainError::validation("nothing to update"));
        }
        if self.status != AuditStatus::InProgress {
            return Err(DomainError::invariant(format!(
                "questions are read-only while the audit is {}",
                self.status
            )));
        }

        let writable = CapabilityTable::new().question_fields(
            cmd.actor.role,
            self.status,
            self.relation_of(&cmd.actor),
        );
        if let Some(field) = cmd.patch.touched_fields().iter().find(|f| !writable.contains(f)) {
            return Err(DomainError::unauthorized(format!(
                "{} may not change the {:?} of a question",
                cmd.actor.role, field
            )));
        }

        let question = self.question(cmd.question_id).ok_or_else(DomainError::not_found)?;
        let updated = cmd.patch.preview(question)?;

        Ok(vec![AuditEvent::QuestionUpdated(QuestionUpdated {
            audit_id: self.id,
            patch: cmd.patch.clone(),
            question: updated,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_edit(&self, cmd: &EditDetails) -> Result<Vec<AuditEvent>, DomainError> {
        cmd.draft.validate()?;
        if cmd.draft.company != self.company {
            return Err(DomainError::invariant("an audit cannot move to another company"));
        }

        Ok(vec![AuditEvent::DetailsEdited(DetailsEdited {
            audit_id: self.id,
            draft: cmd.draft.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

/// Questions still `not-answered`, for the questionnaire progress badge.
pub fn unanswered(questions: &[AuditQuestion]) -> usize {
    questions
        .iter()
        .filter(|q| q.status == QuestionStatus::NotAnswered)
        .count()
}
