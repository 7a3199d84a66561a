//! Row-level visibility: which records a principal's list views may contain.

use auditdesk_core::{CompanyId, Role};

use crate::principal::Principal;

/// Records that belong to an organization.
pub trait Scoped {
    /// Owning company, if the record has one.
    fn organization(&self) -> Option<CompanyId>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Experts and admins see every record.
    All,
    /// Participants see only records of their own company.
    Organization(CompanyId),
    /// A participant without an organization sees nothing.
    Nothing,
}

impl Scope {
    pub fn for_principal(principal: &Principal) -> Self {
        match principal.role {
            Role::Participant => principal
                .organization
                .map(Scope::Organization)
                .unwrap_or(Scope::Nothing),
            Role::Expert | Role::Admin => Scope::All,
        }
    }

    pub fn admits<T: Scoped + ?Sized>(&self, record: &T) -> bool {
        match self {
            Scope::All => true,
            Scope::Organization(org) => record.organization() == Some(*org),
            Scope::Nothing => false,
        }
    }

    /// Keep only admitted records, preserving order.
    pub fn filter<'a, T, I>(&self, records: I) -> Vec<&'a T>
    where
        T: Scoped + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        records.into_iter().filter(|r| self.admits(*r)).collect()
    }
}
