use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Account role. Every capability decision starts from one of these.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Creates and runs audits, evaluates submissions.
    Expert,
    /// Represents an audited company; scoped to their own organization.
    Participant,
    /// Full CRUD over users and companies.
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Expert, Role::Participant, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Expert => "expert",
            Role::Participant => "participant",
            Role::Admin => "admin",
        }
    }

    /// Participants must be attached to an existing company.
    pub fn requires_organization(&self) -> bool {
        matches!(self, Role::Participant)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expert" => Ok(Role::Expert),
            "participant" => Ok(Role::Participant),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::validation(format!(
                "role must be one of: expert, participant, admin (got '{other}')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!(" Admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("auditor".parse::<Role>().is_err());
    }

    #[test]
    fn only_participants_need_an_organization() {
        assert!(Role::Participant.requires_organization());
        assert!(!Role::Expert.requires_organization());
        assert!(!Role::Admin.requires_organization());
    }
}
