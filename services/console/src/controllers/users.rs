//! services/console/src/controllers/users.rs
//!
//! The admin-only list of system accounts.

use crate::controllers::authorize;
use crate::sync::{ListSync, ReloadOutcome};
use crate::view::{load_error_row, users_table, ListView, Notice};
use std::sync::Arc;
use student_portal_core::access::Capability;
use student_portal_core::domain::{Session, User};
use student_portal_core::ports::{BackendService, PortError, PortResult};
use tracing::{info, warn};

pub struct UsersController {
    backend: Arc<dyn BackendService>,
    list: ListSync<User>,
}

impl UsersController {
    pub fn new(backend: Arc<dyn BackendService>) -> Self {
        Self {
            backend,
            list: ListSync::new(),
        }
    }

    pub async fn load(&self, session: &Session) -> PortResult<ReloadOutcome> {
        authorize(session, Capability::ViewUsers)?;
        let outcome = self.list.reload(self.backend.list_users(&session.token)).await;
        if let Err(e) = &outcome {
            warn!("Error loading users: {}", e);
        }
        outcome
    }

    pub fn view(&self) -> ListView {
        let snapshot = self.list.snapshot();
        match &snapshot.error {
            Some(error) => ListView::Error(load_error_row("users", error)),
            None => ListView::Rows(users_table(&snapshot.items)),
        }
    }

    pub fn users(&self) -> Vec<User> {
        self.list.snapshot().items
    }

    /// Activates or deactivates an account, then reloads the list.
    pub async fn set_active(&self, session: &Session, id: i64, active: bool) -> PortResult<Notice> {
        authorize(session, Capability::ManageUsers)?;
        self.backend.set_user_active(&session.token, id, active).await?;
        let verb = if active { "activated" } else { "deactivated" };
        info!(id, verb, "User status changed");
        if let Err(PortError::Unauthorized) = self.load(session).await {
            return Err(PortError::Unauthorized);
        }
        Ok(Notice::success(format!("User {} successfully!", verb)))
    }

    pub fn reset(&self) {
        self.list.reset();
    }
}
