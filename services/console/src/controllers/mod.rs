//! services/console/src/controllers/mod.rs
//!
//! Page controllers. Each one owns the cached data for its page, talks to the
//! active `BackendService` with the session handed to it, and produces view
//! models. None of them holds the session itself.

pub mod dashboard;
pub mod reports;
pub mod students;
pub mod users;

pub use dashboard::DashboardController;
pub use reports::ReportsController;
pub use students::{StudentFilter, StudentsController};
pub use users::UsersController;

use student_portal_core::access::Capability;
use student_portal_core::domain::Session;
use student_portal_core::ports::{PortError, PortResult};

/// The authorization gate in front of every protected action.
pub fn authorize(session: &Session, capability: Capability) -> PortResult<()> {
    if session.role().can(capability) {
        Ok(())
    } else {
        Err(PortError::Forbidden(capability.describe().to_string()))
    }
}
