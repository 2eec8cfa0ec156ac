#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use console_lib::adapters::{DemoBackend, MemoryStorage};
use console_lib::App;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use student_portal_core::domain::{
    Analytics, AuthToken, NewStudent, Report, ReportFormat, Session, Student, StudentUpdate, User,
};
use student_portal_core::ports::{BackendService, PortError, PortResult};
use tempfile::TempDir;

/// Wraps the demo backend, counting fetches. It can reject the token on every
/// call, or fail only the list reloads.
pub struct CountingBackend {
    inner: DemoBackend,
    pub student_fetches: AtomicUsize,
    pub student_gets: AtomicUsize,
    pub user_fetches: AtomicUsize,
    pub reject_token: AtomicBool,
    reload_failure: Mutex<Option<PortError>>,
}

impl CountingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: DemoBackend::new().without_latency(),
            student_fetches: AtomicUsize::new(0),
            student_gets: AtomicUsize::new(0),
            user_fetches: AtomicUsize::new(0),
            reject_token: AtomicBool::new(false),
            reload_failure: Mutex::new(None),
        })
    }

    pub fn students_fetched(&self) -> usize {
        self.student_fetches.load(Ordering::SeqCst)
    }

    pub fn students_got(&self) -> usize {
        self.student_gets.load(Ordering::SeqCst)
    }

    pub fn users_fetched(&self) -> usize {
        self.user_fetches.load(Ordering::SeqCst)
    }

    /// Makes list calls fail with `error` while single-record calls still work.
    pub fn fail_reloads(&self, error: Option<PortError>) {
        *self.reload_failure.lock() = error;
    }

    fn check(&self) -> PortResult<()> {
        if self.reject_token.load(Ordering::SeqCst) {
            Err(PortError::Unauthorized)
        } else {
            Ok(())
        }
    }

    fn check_reload(&self) -> PortResult<()> {
        self.check()?;
        match self.reload_failure.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BackendService for CountingBackend {
    async fn login(&self, username: &str, password: &str) -> PortResult<Session> {
        self.inner.login(username, password).await
    }

    async fn list_students(&self, token: &AuthToken) -> PortResult<Vec<Student>> {
        self.student_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_reload()?;
        self.inner.list_students(token).await
    }

    async fn get_student(&self, token: &AuthToken, id: i64) -> PortResult<Student> {
        self.student_gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get_student(token, id).await
    }

    async fn create_student(&self, token: &AuthToken, student: &NewStudent) -> PortResult<Student> {
        self.check()?;
        self.inner.create_student(token, student).await
    }

    async fn update_student(
        &self,
        token: &AuthToken,
        id: i64,
        update: &StudentUpdate,
    ) -> PortResult<Student> {
        self.check()?;
        self.inner.update_student(token, id, update).await
    }

    async fn delete_student(&self, token: &AuthToken, id: i64) -> PortResult<()> {
        self.check()?;
        self.inner.delete_student(token, id).await
    }

    async fn list_users(&self, token: &AuthToken) -> PortResult<Vec<User>> {
        self.user_fetches.fetch_add(1, Ordering::SeqCst);
        self.check_reload()?;
        self.inner.list_users(token).await
    }

    async fn set_user_active(&self, token: &AuthToken, id: i64, active: bool) -> PortResult<()> {
        self.check()?;
        self.inner.set_user_active(token, id, active).await
    }

    async fn analytics(&self, token: &AuthToken) -> PortResult<Analytics> {
        self.check()?;
        self.inner.analytics(token).await
    }

    async fn generate_report(&self, token: &AuthToken, format: ReportFormat) -> PortResult<Report> {
        self.check()?;
        self.inner.generate_report(token, format).await
    }
}

/// An app over a fresh counting demo backend and in-memory storage.
pub fn demo_app() -> (App, Arc<CountingBackend>, TempDir) {
    let backend = CountingBackend::new();
    let downloads = tempfile::tempdir().expect("temp dir");
    let app = app_on(&backend, &downloads);
    (app, backend, downloads)
}

/// Another app sharing `backend`, as a second client of the same server.
pub fn app_on(backend: &Arc<CountingBackend>, downloads: &TempDir) -> App {
    App::new(
        backend.clone(),
        Arc::new(MemoryStorage::new()),
        downloads.path(),
    )
}

pub fn new_student(username: &str) -> NewStudent {
    NewStudent {
        username: username.to_string(),
        password: "secret123".to_string(),
        email: format!("{}@example.com", username),
        first_name: "Alice".to_string(),
        last_name: "Green".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(2002, 6, 1).expect("valid date"),
        gender: None,
        phone: None,
        address: None,
        admission_date: None,
    }
}
