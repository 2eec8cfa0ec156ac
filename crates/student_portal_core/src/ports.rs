//! crates/student_portal_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client is built against.
//! The live REST backend and the in-memory demo backend both implement
//! `BackendService`, so the rest of the application does not care which one
//! is active. `SessionStorage` abstracts the durable key/value store that
//! keeps a login alive across restarts.

use async_trait::async_trait;
use crate::domain::{
    Analytics, AuthToken, NewStudent, Report, ReportFormat, Session, Student, StudentUpdate,
    User,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type for all port operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    /// Bad credentials at login.
    #[error("{0}")]
    Auth(String),
    /// A non-2xx response carrying the server's message.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },
    /// The backend could not be reached at all.
    #[error("Network error: {0}")]
    Network(String),
    #[error("{0}")]
    NotFound(String),
    /// The token was rejected; the session is no longer usable.
    #[error("Unauthorized")]
    Unauthorized,
    /// The current role may not perform the action.
    #[error("Not permitted: {0}")]
    Forbidden(String),
    /// Client-side validation failed before anything was sent.
    #[error("{0}")]
    Invalid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait BackendService: Send + Sync {
    // --- Auth ---
    async fn login(&self, username: &str, password: &str) -> PortResult<Session>;

    // --- Students ---
    async fn list_students(&self, token: &AuthToken) -> PortResult<Vec<Student>>;

    async fn get_student(&self, token: &AuthToken, id: i64) -> PortResult<Student>;

    async fn create_student(&self, token: &AuthToken, student: &NewStudent) -> PortResult<Student>;

    async fn update_student(
        &self,
        token: &AuthToken,
        id: i64,
        update: &StudentUpdate,
    ) -> PortResult<Student>;

    async fn delete_student(&self, token: &AuthToken, id: i64) -> PortResult<()>;

    // --- System accounts (admin) ---
    async fn list_users(&self, token: &AuthToken) -> PortResult<Vec<User>>;

    async fn set_user_active(&self, token: &AuthToken, id: i64, active: bool) -> PortResult<()>;

    // --- Reports ---
    async fn analytics(&self, token: &AuthToken) -> PortResult<Analytics>;

    /// Downloads the student report as an opaque binary blob.
    async fn generate_report(&self, token: &AuthToken, format: ReportFormat) -> PortResult<Report>;
}

/// Durable client-side key/value storage, in the manner of browser local storage.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    fn remove(&self, key: &str) -> PortResult<()>;
}
