//! In-memory session backed by durable storage

use std::sync::RwLock;

use super::{Credential, FileStorage, MemoryStorage, Role, Session, SessionError, SessionStorage};

/// Storage key for the credential
pub const TOKEN_KEY: &str = "token";

/// Storage key for the role
pub const ROLE_KEY: &str = "role";

/// Holds the current session; one per client
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Create a store, rehydrating any persisted session
    pub fn new(storage: Box<dyn SessionStorage>) -> Self {
        let current = match Self::rehydrate(storage.as_ref()) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Ignoring persisted session: {}", e);
                None
            }
        };

        if let Some(session) = &current {
            tracing::debug!(role = %session.role, "Rehydrated session");
        }

        Self {
            storage,
            current: RwLock::new(current),
        }
    }

    /// Store persisted to a JSON file
    pub fn with_file(path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(Box::new(FileStorage::new(path)))
    }

    /// Store that forgets everything on drop
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    fn rehydrate(storage: &dyn SessionStorage) -> Result<Option<Session>, SessionError> {
        let token = storage.get(TOKEN_KEY)?;
        let role = storage.get(ROLE_KEY)?;

        match (token, role) {
            (Some(token), Some(role)) if !token.is_empty() => Ok(Some(Session {
                credential: Credential::new(token),
                role: role.parse()?,
            })),
            _ => Ok(None),
        }
    }

    /// The active session, if any
    pub fn current(&self) -> Option<Session> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.current().map(|s| s.credential)
    }

    pub fn role(&self) -> Option<Role> {
        self.current().map(|s| s.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Persist and activate a session
    pub fn login(&self, credential: Credential, role: Role) -> Result<(), SessionError> {
        self.storage
            .set_all(&[(TOKEN_KEY, credential.as_str()), (ROLE_KEY, role.as_str())])?;

        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(Session { credential, role });

        tracing::info!(role = %role, "Logged in");
        Ok(())
    }

    /// Clear memory and storage; never fails
    pub fn logout(&self) {
        for key in [TOKEN_KEY, ROLE_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!("Failed to clear {} from session storage: {}", key, e);
            }
        }

        let previous = self.current.write().unwrap_or_else(|e| e.into_inner()).take();
        if previous.is_some() {
            tracing::info!("Logged out");
        }
    }
}
