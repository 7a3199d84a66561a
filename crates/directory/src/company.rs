use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use auditdesk_auth::Scoped;
use auditdesk_core::{CompanyId, DomainError, DomainResult, Email, Entity};

/// Contact information for a company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, rename = "contact_name")]
    pub name: Option<String>,
    #[serde(default, rename = "contact_email")]
    pub email: Option<String>,
    #[serde(default, rename = "contact_phone")]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// Company read model (matches `GET /companies/` items).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub location: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> CompanyId {
        self.id
    }
}

impl Scoped for Company {
    fn organization(&self) -> Option<CompanyId> {
        Some(self.id)
    }
}

/// Write payload for `POST /companies/` and `PUT /companies/{id}/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDraft {
    pub name: String,
    pub industry: String,
    pub size: String,
    pub location: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub description: String,
}

impl CompanyDraft {
    /// Pre-fill an edit draft from the current record.
    pub fn from_company(company: &Company) -> Self {
        Self {
            name: company.name.clone(),
            industry: company.industry.clone(),
            size: company.size.clone(),
            location: company.location.clone(),
            contact: company.contact.clone(),
            description: company.description.clone(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if let Some(email) = self.contact.email.as_deref().filter(|e| !e.trim().is_empty()) {
            Email::parse(email)?;
        }
        Ok(())
    }

    /// Company names are unique (case-insensitive). `editing` excludes the
    /// record being edited from the comparison.
    pub fn ensure_unique_name(&self, existing: &[Company], editing: Option<CompanyId>) -> DomainResult<()> {
        let wanted = self.name.trim().to_lowercase();
        let clash = existing
            .iter()
            .filter(|c| Some(c.id) != editing)
            .any(|c| c.name.trim().to_lowercase() == wanted);

        if clash {
            Err(DomainError::conflict(format!(
                "a company named '{}' already exists",
                self.name.trim()
            )))
        } else {
            Ok(())
        }
    }
}
