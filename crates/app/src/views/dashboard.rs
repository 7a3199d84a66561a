use serde::Serialize;

use auditdesk_audits::AuditRecord;
use auditdesk_auth::{Page, Scope};
use auditdesk_client::{AuditApi, AuditQuery};
use auditdesk_core::AuditStatus;

use super::{LoadError, admit};
use crate::session::SessionReader;

/// Audit counts and average completion over the audits a principal can see.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub planned: usize,
    pub in_progress: usize,
    pub completed: usize,
    /// `None` when there are no visible audits.
    pub average_completion: Option<f32>,
}

impl DashboardSummary {
    pub fn compute(scope: &Scope, audits: &[AuditRecord]) -> Self {
        let visible = scope.filter(audits);
        let mut summary = DashboardSummary {
            total: visible.len(),
            ..Self::default()
        };
        let mut completion_sum = 0u32;
        for audit in &visible {
            match audit.status {
                AuditStatus::Planned => summary.planned += 1,
                AuditStatus::InProgress => summary.in_progress += 1,
                AuditStatus::Completed => summary.completed += 1,
            }
            completion_sum += u32::from(audit.completion_clamped());
        }
        if summary.total > 0 {
            summary.average_completion = Some(completion_sum as f32 / summary.total as f32);
        }
        summary
    }
}

pub async fn load_dashboard(api: &dyn AuditApi, session: &SessionReader) -> Result<DashboardSummary, LoadError> {
    let principal = admit(session, Page::Dashboard)?;
    let audits = api.list_audits(&AuditQuery::default()).await?;
    Ok(DashboardSummary::compute(&Scope::for_principal(&principal), &audits))
}
