//! Session store: the one process-wide mutable identity.
//!
//! [`SessionStore`] is the single writer. It is hydrated from storage exactly
//! once, in [`SessionStore::open`], and mutated only through
//! [`SessionStore::login`], [`SessionStore::update_user`] and
//! [`SessionStore::logout`]. Everything else reads through a cloneable
//! [`SessionReader`].

use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{info, warn};

use auditdesk_auth::Principal;
use auditdesk_core::Role;
use auditdesk_directory::{ProfilePatch, User};

use crate::storage::KeyValueStore;

/// Storage key of the serialized identity.
pub const SESSION_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum SessionError {
    /// The in-memory session changed but could not be written to storage.
    #[error("session storage failed: {0:#}")]
    Storage(#[from] anyhow::Error),
}

type Shared = Arc<RwLock<Option<User>>>;

fn read(state: &Shared) -> Option<User> {
    state.read().ok().and_then(|guard| guard.clone())
}

pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    state: Shared,
}

impl SessionStore {
    /// Build the store and hydrate it from `storage`.
    ///
    /// Missing, unreadable or malformed data yields an unauthenticated
    /// session; it never fails.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let user = hydrate(storage.as_ref());
        Self {
            storage,
            state: Arc::new(RwLock::new(user)),
        }
    }

    pub fn reader(&self) -> SessionReader {
        SessionReader {
            state: Arc::clone(&self.state),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        read(&self.state)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Set the identity and persist it.
    ///
    /// The in-memory session is updated even when persisting fails; the
    /// error only means the session will not survive a restart.
    pub fn login(&self, user: User) -> Result<(), SessionError> {
        info!(user_id = %user.id, role = %user.role, "signed in");
        let payload = serde_json::to_string(&user).map_err(anyhow::Error::from);
        self.replace(Some(user));
        self.storage.set(SESSION_KEY, &payload?)?;
        Ok(())
    }

    /// Merge `patch` into the current identity and re-persist.
    ///
    /// Returns `false` (and does nothing) when nobody is signed in.
    pub fn update_user(&self, patch: &ProfilePatch) -> Result<bool, SessionError> {
        let Some(mut user) = self.current_user() else {
            return Ok(false);
        };
        patch.apply_to(&mut user);

        let payload = serde_json::to_string(&user).map_err(anyhow::Error::from);
        self.replace(Some(user));
        self.storage.set(SESSION_KEY, &payload?)?;
        Ok(true)
    }

    /// Clear the identity and its persisted copy.
    pub fn logout(&self) -> Result<(), SessionError> {
        if let Some(user) = self.current_user() {
            info!(user_id = %user.id, "signed out");
        }
        self.replace(None);
        self.storage.remove(SESSION_KEY)?;
        Ok(())
    }

    fn replace(&self, user: Option<User>) {
        match self.state.write() {
            Ok(mut guard) => *guard = user,
            Err(poisoned) => *poisoned.into_inner() = user,
        }
    }
}

fn hydrate(storage: &dyn KeyValueStore) -> Option<User> {
    let raw = match storage.get(SESSION_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "could not read persisted session; starting signed out");
            return None;
        }
    };

    match serde_json::from_str::<User>(&raw) {
        Ok(user) => Some(user),
        Err(err) => {
            warn!(error = %err, "persisted session is malformed; starting signed out");
            None
        }
    }
}

/// Read-only view of the session, handed to view models and guards.
#[derive(Debug, Clone)]
pub struct SessionReader {
    state: Shared,
}

impl SessionReader {
    pub fn current_user(&self) -> Option<User> {
        read(&self.state)
    }

    pub fn principal(&self) -> Option<Principal> {
        self.current_user().map(|u| u.principal())
    }

    pub fn role(&self) -> Option<Role> {
        self.principal().map(|p| p.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// A reader over a fixed identity, for tests and one-shot commands.
    pub fn fixed(user: Option<User>) -> Self {
        Self {
            state: Arc::new(RwLock::new(user)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use auditdesk_core::{CompanyId, UserId};

    fn pat() -> User {
        User {
            id: UserId::new(3),
            username: "pat".to_string(),
            email: "pat@acme.test".to_string(),
            role: Role::Participant,
            organization: Some(CompanyId::new(4)),
            phone: None,
            first_name: String::new(),
            last_name: String::new(),
            date_joined: None,
        }
    }

    #[test]
    fn login_persists_and_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let session = SessionStore::open(Arc::new(FileStore::new(&path)));
        assert!(!session.is_authenticated());
        session.login(pat()).unwrap();
        assert!(session.is_authenticated());

        let reloaded = SessionStore::open(Arc::new(FileStore::new(&path)));
        assert!(reloaded.is_authenticated());
        assert_eq!(reloaded.current_user(), Some(pat()));
    }

    #[test]
    fn malformed_persisted_session_starts_signed_out() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(SESSION_KEY, "{\"id\": \"not a number\"").unwrap();

        let session = SessionStore::open(storage);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn update_is_a_noop_when_signed_out() {
        let storage = Arc::new(MemoryStore::new());
        let session = SessionStore::open(storage.clone());
        let patch = ProfilePatch {
            email: Some("x@y.io".to_string()),
            ..ProfilePatch::default()
        };

        assert!(!session.update_user(&patch).unwrap());
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn update_merges_and_repersists() {
        let storage = Arc::new(MemoryStore::new());
        let session = SessionStore::open(storage.clone());
        session.login(pat()).unwrap();

        let patch = ProfilePatch {
            phone: Some("+1 555 0100".to_string()),
            ..ProfilePatch::default()
        };
        assert!(session.update_user(&patch).unwrap());

        let stored: User = serde_json::from_str(&storage.get(SESSION_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.phone.as_deref(), Some("+1 555 0100"));
        assert_eq!(stored.username, "pat");
    }

    #[test]
    fn readers_observe_writes_and_logout_clears_storage() {
        let storage = Arc::new(MemoryStore::new());
        let session = SessionStore::open(storage.clone());
        let reader = session.reader();

        session.login(pat()).unwrap();
        assert_eq!(reader.role(), Some(Role::Participant));
        assert_eq!(reader.principal().unwrap().organization, Some(CompanyId::new(4)));

        session.logout().unwrap();
        assert!(!reader.is_authenticated());
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }
}
