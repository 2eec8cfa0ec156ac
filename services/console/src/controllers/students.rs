//! services/console/src/controllers/students.rs
//!
//! The students list: load, client-side filtering, and the create / update /
//! delete actions, each of which finishes with a full reload.

use crate::controllers::authorize;
use crate::sync::{ListSync, ReloadOutcome};
use crate::view::{load_error_row, students_table, ListView, Notice};
use parking_lot::Mutex;
use std::sync::Arc;
use student_portal_core::access::Capability;
use student_portal_core::domain::{Gender, NewStudent, Role, Session, Student, StudentUpdate};
use student_portal_core::ports::{BackendService, PortError, PortResult};
use tracing::{info, warn};

//=========================================================================================
// Filtering
//=========================================================================================

/// Two independent, optional predicates combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
    /// Case-insensitive substring over full name, email and business id.
    pub search: Option<String>,
    /// Exact gender match.
    pub gender: Option<Gender>,
}

impl StudentFilter {
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() { None } else { Some(term) };
        self
    }

    pub fn with_gender(mut self, gender: Option<Gender>) -> Self {
        self.gender = gender;
        self
    }

    pub fn matches_search(&self, student: &Student) -> bool {
        let Some(term) = self.search.as_deref() else {
            return true;
        };
        let term = term.to_lowercase();
        let name = student.full_name().unwrap_or_default().to_lowercase();
        let email = student.email().unwrap_or_default().to_lowercase();
        let business_id = student.student_id.to_lowercase();
        name.contains(&term) || email.contains(&term) || business_id.contains(&term)
    }

    pub fn matches_gender(&self, student: &Student) -> bool {
        match self.gender {
            Some(gender) => student.gender == Some(gender),
            None => true,
        }
    }

    pub fn matches(&self, student: &Student) -> bool {
        self.matches_search(student) && self.matches_gender(student)
    }

    pub fn apply(&self, students: &[Student]) -> Vec<Student> {
        students.iter().filter(|s| self.matches(s)).cloned().collect()
    }
}

//=========================================================================================
// Controller
//=========================================================================================

pub struct StudentsController {
    backend: Arc<dyn BackendService>,
    list: ListSync<Student>,
    filter: Mutex<StudentFilter>,
}

impl StudentsController {
    pub fn new(backend: Arc<dyn BackendService>) -> Self {
        Self {
            backend,
            list: ListSync::new(),
            filter: Mutex::new(StudentFilter::default()),
        }
    }

    /// Replaces the cached list with the backend's.
    pub async fn load(&self, session: &Session) -> PortResult<ReloadOutcome> {
        let outcome = self
            .list
            .reload(self.backend.list_students(&session.token))
            .await;
        if let Err(e) = &outcome {
            warn!("Error loading students: {}", e);
        }
        outcome
    }

    /// Sets the active filter and renders the cached list through it. No fetch.
    pub fn filter(&self, filter: StudentFilter, role: &Role) -> ListView {
        *self.filter.lock() = filter;
        self.view(role)
    }

    pub fn current_filter(&self) -> StudentFilter {
        self.filter.lock().clone()
    }

    /// The rows currently visible: the cached list through the active filter.
    pub fn visible(&self) -> Vec<Student> {
        let filter = self.filter.lock().clone();
        filter.apply(&self.list.snapshot().items)
    }

    pub fn view(&self, role: &Role) -> ListView {
        if let Some(error) = &self.list.snapshot().error {
            return ListView::Error(load_error_row("students", error));
        }
        ListView::Rows(students_table(&self.visible(), role))
    }

    /// Looks a student up in the cached list.
    pub fn find(&self, id: i64) -> Option<Student> {
        self.list.find(|s| s.id == id)
    }

    /// The cached record, falling back to the backend when the list lacks it.
    pub async fn lookup(&self, session: &Session, id: i64) -> PortResult<Student> {
        match self.find(id) {
            Some(student) => Ok(student),
            None => self.fetch(session, id).await,
        }
    }

    /// Fetches a single student, bypassing the cache.
    pub async fn fetch(&self, session: &Session, id: i64) -> PortResult<Student> {
        authorize(session, Capability::ViewStudents)?;
        self.backend.get_student(&session.token, id).await
    }

    pub async fn create(&self, session: &Session, student: &NewStudent) -> PortResult<Notice> {
        authorize(session, Capability::CreateStudent)?;
        student.validate()?;
        let created = self.backend.create_student(&session.token, student).await?;
        info!(id = created.id, student_id = %created.student_id, "Student created");
        self.reload_after_mutation(session).await?;
        Ok(Notice::success("Student created successfully!"))
    }

    pub async fn update(
        &self,
        session: &Session,
        id: i64,
        update: &StudentUpdate,
    ) -> PortResult<Notice> {
        authorize(session, Capability::EditStudent)?;
        update.validate()?;
        self.backend.update_student(&session.token, id, update).await?;
        info!(id, "Student updated");
        self.reload_after_mutation(session).await?;
        Ok(Notice::success("Student updated successfully!"))
    }

    pub async fn delete(&self, session: &Session, id: i64) -> PortResult<Notice> {
        authorize(session, Capability::DeleteStudent)?;
        self.backend.delete_student(&session.token, id).await?;
        info!(id, "Student deleted");
        self.reload_after_mutation(session).await?;
        Ok(Notice::success("Student deleted successfully!"))
    }

    // The mutation already succeeded; a failed reload shows up as the error
    // row. Only a rejected token is passed on.
    async fn reload_after_mutation(&self, session: &Session) -> PortResult<()> {
        match self.load(session).await {
            Err(PortError::Unauthorized) => Err(PortError::Unauthorized),
            _ => Ok(()),
        }
    }

    pub fn reset(&self) {
        self.list.reset();
        *self.filter.lock() = StudentFilter::default();
    }
}
