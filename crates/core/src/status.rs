use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Audit lifecycle status.
///
/// The order is fixed and linear: `Planned → InProgress → Completed`.
/// There are no back-transitions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AuditStatus {
    #[serde(rename = "Planned")]
    Planned,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl AuditStatus {
    pub const ALL: [AuditStatus; 3] = [
        AuditStatus::Planned,
        AuditStatus::InProgress,
        AuditStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Planned => "Planned",
            AuditStatus::InProgress => "In Progress",
            AuditStatus::Completed => "Completed",
        }
    }

    /// The only status this one may move to, if any.
    pub fn next(&self) -> Option<AuditStatus> {
        match self {
            AuditStatus::Planned => Some(AuditStatus::InProgress),
            AuditStatus::InProgress => Some(AuditStatus::Completed),
            AuditStatus::Completed => None,
        }
    }

    pub fn can_transition_to(&self, target: AuditStatus) -> bool {
        self.next() == Some(target)
    }
}

impl core::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditStatus {
    type Err = DomainError;

    /// Accepts the display form as well as `in_progress`/`in-progress`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "planned" => Ok(AuditStatus::Planned),
            "inprogress" => Ok(AuditStatus::InProgress),
            "completed" => Ok(AuditStatus::Completed),
            _ => Err(DomainError::validation(format!(
                "status must be one of: Planned, In Progress, Completed (got '{s}')"
            ))),
        }
    }
}
