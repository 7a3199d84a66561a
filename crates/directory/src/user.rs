use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use auditdesk_auth::{Principal, Scoped};
use auditdesk_core::{CompanyId, DomainError, DomainResult, Email, Entity, Role, UserId};

use crate::company::Company;

/// User read model (matches `GET /users/` items and the login payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    /// Required iff `role == participant`.
    #[serde(default)]
    pub organization: Option<CompanyId>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.role, self.organization)
    }

    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Organization invariant: participants reference an existing company.
    pub fn check_organization(&self, companies: &[Company]) -> DomainResult<()> {
        check_organization(self.role, self.organization, companies)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

impl Scoped for User {
    fn organization(&self) -> Option<CompanyId> {
        self.organization
    }
}

fn check_organization(role: Role, organization: Option<CompanyId>, companies: &[Company]) -> DomainResult<()> {
    if !role.requires_organization() {
        return Ok(());
    }
    let org = organization
        .ok_or_else(|| DomainError::validation("organization is required for participants"))?;
    if companies.iter().any(|c| c.id == org) {
        Ok(())
    } else {
        Err(DomainError::validation(format!("organization {org} does not exist")))
    }
}

/// Write payload for `POST /users/` (admin create, self-registration) and
/// `PUT /users/{id}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub organization: Option<CompanyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Only sent on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserDraft {
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            organization: user.organization,
            phone: user.phone.clone(),
            password: None,
        }
    }

    /// Validate against directory invariants and drop an organization that a
    /// non-participant role does not carry.
    pub fn validated(mut self, companies: &[Company]) -> DomainResult<Self> {
        if self.username.trim().is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        Email::parse(&self.email)?;
        check_organization(self.role, self.organization, companies)?;

        if !self.role.requires_organization() {
            self.organization = None;
        }
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        Ok(self)
    }
}

/// Partial update of the signed-in user's own profile.
///
/// `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }

    /// Merge the present fields into `user`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(v) = &self.username {
            user.username = v.clone();
        }
        if let Some(v) = &self.email {
            user.email = v.clone();
        }
        if let Some(v) = &self.phone {
            user.phone = Some(v.clone());
        }
        if let Some(v) = &self.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            user.last_name = v.clone();
        }
    }
}

/// Body of `POST /users/login/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Body of `POST /users/{id}/change_password/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::ContactInfo;

    fn acme() -> Company {
        Company {
            id: CompanyId::new(5),
            name: "Acme".to_string(),
            industry: String::new(),
            size: String::new(),
            location: String::new(),
            contact: ContactInfo::default(),
            description: String::new(),
            created_at: None,
        }
    }

    fn draft(role: Role, organization: Option<CompanyId>) -> UserDraft {
        UserDraft {
            username: " pat ".to_string(),
            email: "pat@acme.test".to_string(),
            role,
            organization,
            phone: None,
            password: Some("s3cretpass".to_string()),
        }
    }

    #[test]
    fn participant_requires_existing_organization() {
        let companies = vec![acme()];
        assert!(draft(Role::Participant, None).validated(&companies).is_err());
        assert!(draft(Role::Participant, Some(CompanyId::new(99))).validated(&companies).is_err());

        let ok = draft(Role::Participant, Some(CompanyId::new(5))).validated(&companies).unwrap();
        assert_eq!(ok.username, "pat");
        assert_eq!(ok.organization, Some(CompanyId::new(5)));
    }

    #[test]
    fn non_participant_drops_organization() {
        let ok = draft(Role::Expert, Some(CompanyId::new(5))).validated(&[]).unwrap();
        assert_eq!(ok.organization, None);
    }

    #[test]
    fn profile_patch_merges_only_present_fields() {
        let mut user = User {
            id: UserId::new(1),
            username: "old".to_string(),
            email: "old@x.io".to_string(),
            role: Role::Expert,
            organization: None,
            phone: None,
            first_name: "Ada".to_string(),
            last_name: String::new(),
            date_joined: None,
        };
        let patch = ProfilePatch {
            email: Some("new@x.io".to_string()),
            phone: Some("+1 555".to_string()),
            ..ProfilePatch::default()
        };
        patch.apply_to(&mut user);
        assert_eq!(user.username, "old");
        assert_eq!(user.email, "new@x.io");
        assert_eq!(user.phone.as_deref(), Some("+1 555"));
        assert_eq!(user.display_name(), "Ada");
    }

    #[test]
    fn login_payload_parses_into_user() {
        let json = serde_json::json!({
            "id": 12, "username": "pat", "email": "pat@acme.test",
            "role": "participant", "organization": 5
        });
        let user: User = serde_json::from_value(json).unwrap();
        assert_eq!(user.principal().organization, Some(CompanyId::new(5)));
        assert!(user.check_organization(&[acme()]).is_ok());
    }
}
