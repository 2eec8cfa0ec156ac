//! crates/student_portal_core/src/access.rs
//!
//! The single authorization gate. Every protected page or action asks
//! `Role::can` for one `Capability` instead of comparing role names.

use crate::domain::Role;

/// An action or view that only some roles may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ViewStudents,
    CreateStudent,
    EditStudent,
    DeleteStudent,
    ViewUsers,
    ManageUsers,
    GenerateReports,
}

impl Capability {
    pub fn describe(&self) -> &'static str {
        match self {
            Capability::ViewStudents => "view students",
            Capability::CreateStudent => "create students",
            Capability::EditStudent => "edit students",
            Capability::DeleteStudent => "delete students",
            Capability::ViewUsers => "view users",
            Capability::ManageUsers => "manage users",
            Capability::GenerateReports => "generate reports",
        }
    }
}

impl Role {
    pub fn can(&self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::Teacher => matches!(
                capability,
                Capability::ViewStudents | Capability::EditStudent | Capability::GenerateReports
            ),
            Role::Student | Role::Other(_) => false,
        }
    }
}
