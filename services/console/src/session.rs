//! services/console/src/session.rs
//!
//! The session store: the single owner of the bearer token and the identity
//! of the logged-in account, persisted through the `SessionStorage` port so a
//! restart does not force a new login.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use student_portal_core::domain::{AuthToken, Role, Session, SessionUser};
use student_portal_core::ports::{BackendService, PortError, PortResult, SessionStorage};
use tracing::{info, warn};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "accessToken";
/// Storage key holding the serialized current user.
pub const USER_KEY: &str = "currentUser";

//=========================================================================================
// Stored Records
//=========================================================================================

#[derive(Serialize, Deserialize)]
struct StoredRole {
    name: String,
}

/// The user object as kept in storage, shaped like the login response.
#[derive(Serialize, Deserialize)]
struct StoredUser {
    id: i64,
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    role: Option<StoredRole>,
}

impl StoredUser {
    fn from_domain(user: &SessionUser) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: Some(StoredRole {
                name: user.role.name().to_string(),
            }),
        }
    }

    fn to_domain(self) -> SessionUser {
        SessionUser {
            id: self.id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self
                .role
                .map(|r| Role::from_name(&r.name))
                .unwrap_or(Role::Other(String::new())),
        }
    }
}

//=========================================================================================
// SessionStore
//=========================================================================================

pub struct SessionStore {
    backend: Arc<dyn BackendService>,
    storage: Arc<dyn SessionStorage>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn BackendService>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            backend,
            storage,
            current: RwLock::new(None),
        }
    }

    /// Authenticates against the active backend and persists the session.
    ///
    /// A storage failure does not undo the login; the session simply will not
    /// survive a restart.
    pub async fn login(&self, username: &str, password: &str) -> PortResult<Session> {
        let session = self.backend.login(username, password).await?;
        if let Err(e) = self.persist(&session) {
            warn!("Could not persist session: {}", e);
        }
        info!(user = %session.user.username, role = %session.user.role, "Logged in");
        *self.current.write() = Some(session.clone());
        Ok(session)
    }

    fn persist(&self, session: &Session) -> PortResult<()> {
        let user = serde_json::to_string(&StoredUser::from_domain(&session.user))
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.storage.set(TOKEN_KEY, session.token.as_str())?;
        self.storage.set(USER_KEY, &user)
    }

    /// Forgets the session in memory and in storage.
    pub fn logout(&self) -> PortResult<()> {
        if let Some(session) = self.current.write().take() {
            info!(user = %session.user.username, "Logged out");
        }
        self.clear_storage()
    }

    fn clear_storage(&self) -> PortResult<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)
    }

    /// Reloads a previously persisted session at startup.
    ///
    /// A token without a user (or the reverse, or an unreadable user) is
    /// treated as no session at all and the leftovers are cleared.
    pub fn restore(&self) -> PortResult<Option<Session>> {
        let token = self.storage.get(TOKEN_KEY)?;
        let user = self.storage.get(USER_KEY)?;

        let restored = match (token, user) {
            (Some(token), Some(user)) if !token.is_empty() => {
                match serde_json::from_str::<StoredUser>(&user) {
                    Ok(user) => Some(Session {
                        token: AuthToken::new(token),
                        user: user.to_domain(),
                    }),
                    Err(e) => {
                        warn!("Stored user is unreadable, discarding session: {}", e);
                        None
                    }
                }
            }
            (None, None) => return Ok(None),
            _ => None,
        };

        match &restored {
            Some(session) => info!(user = %session.user.username, "Session restored"),
            None => self.clear_storage()?,
        }
        *self.current.write() = restored.clone();
        Ok(restored)
    }

    pub fn current(&self) -> Option<Session> {
        self.current.read().clone()
    }

    /// The current session, or `Unauthorized` when nobody is logged in.
    pub fn require(&self) -> PortResult<Session> {
        self.current().ok_or(PortError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{DemoBackend, MemoryStorage};

    fn store_with(storage: Arc<MemoryStorage>) -> SessionStore {
        SessionStore::new(Arc::new(DemoBackend::new().without_latency()), storage)
    }

    #[tokio::test]
    async fn login_persists_both_keys() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());

        let session = store.login("admin", "admin123").await.unwrap();
        assert_eq!(
            storage.get(TOKEN_KEY).unwrap().as_deref(),
            Some(session.token.as_str())
        );
        let user: serde_json::Value =
            serde_json::from_str(&storage.get(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(user["username"], "admin");
        assert_eq!(user["role"]["name"], "admin");
    }

    #[tokio::test]
    async fn failed_login_leaves_no_session() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone());

        assert!(matches!(
            store.login("admin", "nope").await,
            Err(PortError::Auth(_))
        ));
        assert!(store.current().is_none());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn restore_after_restart_and_logout_clears() {
        let storage = Arc::new(MemoryStorage::new());
        let first = store_with(storage.clone());
        let session = first.login("teacher1", "teacher123").await.unwrap();

        let second = store_with(storage.clone());
        assert_eq!(second.restore().unwrap(), Some(session));
        assert_eq!(second.require().unwrap().user.role, Role::Teacher);

        second.logout().unwrap();
        assert!(second.current().is_none());
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
        assert_eq!(second.require(), Err(PortError::Unauthorized));
    }

    #[test]
    fn half_a_session_is_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "orphan-token").unwrap();
        let store = store_with(storage.clone());

        assert_eq!(store.restore().unwrap(), None);
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn unreadable_user_is_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "token").unwrap();
        storage.set(USER_KEY, "{broken").unwrap();
        let store = store_with(storage.clone());

        assert_eq!(store.restore().unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }
}
