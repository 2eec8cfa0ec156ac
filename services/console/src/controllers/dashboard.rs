//! services/console/src/controllers/dashboard.rs
//!
//! Summary figures for the landing page.

use crate::view::{recent_students_table, DashboardView};
use std::sync::Arc;
use student_portal_core::access::Capability;
use student_portal_core::domain::{Gender, Session};
use student_portal_core::ports::{BackendService, PortResult};
use tracing::warn;

/// How many students the "recent" table shows.
const RECENT_COUNT: usize = 5;

pub struct DashboardController {
    backend: Arc<dyn BackendService>,
}

impl DashboardController {
    pub fn new(backend: Arc<dyn BackendService>) -> Self {
        Self { backend }
    }

    /// Builds the dashboard. A failed users fetch only blanks the account
    /// figure; a failed students fetch fails the whole page.
    pub async fn load(&self, session: &Session) -> PortResult<DashboardView> {
        let students = self.backend.list_students(&session.token).await?;
        let count = |g: Gender| students.iter().filter(|s| s.gender == Some(g)).count();

        let active_users = if session.role().can(Capability::ViewUsers) {
            match self.backend.list_users(&session.token).await {
                Ok(users) => Some(users.iter().filter(|u| u.is_active).count()),
                Err(e) => {
                    warn!("Error loading users for dashboard: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let recent: Vec<_> = students.iter().take(RECENT_COUNT).cloned().collect();
        Ok(DashboardView {
            total_students: students.len(),
            male_students: count(Gender::Male),
            female_students: count(Gender::Female),
            active_users,
            recent: recent_students_table(&recent),
        })
    }
}
