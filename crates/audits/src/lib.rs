//! Audits domain module: the audit lifecycle, its questionnaire and its
//! append-only history, implemented as deterministic domain logic (no IO).

pub mod audit;
pub mod history;
pub mod question;
pub mod record;

pub use audit::{
    Audit, AuditCommand, AuditEvent, Complete, EditDetails, SendFeedback, Start, SubmitForReview,
    UpdateQuestion,
};
pub use history::{HistoryEntry, HistoryKind, Timeline};
pub use question::{AuditQuestion, QuestionPatch, QuestionStatus};
pub use record::{AuditDraft, AuditRecord};
