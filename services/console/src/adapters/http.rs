//! services/console/src/adapters/http.rs
//!
//! This module contains the adapter for the live REST backend. It implements
//! the `BackendService` port from the `core` crate on top of `reqwest`,
//! translating JSON envelopes into domain types.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use student_portal_core::domain::{
    Analytics, AuthToken, Gender, NewStudent, Report, ReportFormat, Role, Session, SessionUser,
    Student, StudentAccount, StudentUpdate, User,
};
use student_portal_core::ports::{BackendService, PortError, PortResult};
use tracing::{debug, warn};
use url::Url;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `BackendService` port against the REST API.
#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a new `HttpBackend` rooted at `base_url` (which already includes `/api`).
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issues one JSON request and returns the parsed response body.
    ///
    /// The bearer token is attached when present and `Content-Type:
    /// application/json` is set when there is a body. A non-2xx status
    /// becomes an error carrying the server's `message`, or `fallback`.
    pub async fn request(
        &self,
        token: Option<&AuthToken>,
        method: Method,
        path: &str,
        body: Option<&Value>,
        fallback: &str,
    ) -> PortResult<Value> {
        let response = self.send(token, method, path, body).await?;
        let response = ensure_success(response, fallback).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| PortError::Unexpected(format!("Malformed response from {}: {}", path, e)))
    }

    async fn send(
        &self,
        token: Option<&AuthToken>,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> PortResult<Response> {
        debug!(%method, path, "Sending backend request");
        let mut builder: RequestBuilder = self.http.request(method.clone(), self.endpoint(path));
        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder.send().await.map_err(|e| {
            warn!(%method, path, "Backend unreachable: {}", e);
            PortError::Network(e.to_string())
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        token: &AuthToken,
        method: Method,
        path: &str,
        body: Option<Value>,
        fallback: &str,
    ) -> PortResult<T> {
        let value = self
            .request(Some(token), method, path, body.as_ref(), fallback)
            .await?;
        serde_json::from_value(value)
            .map_err(|e| PortError::Unexpected(format!("Unexpected response shape from {}: {}", path, e)))
    }
}

/// Checks the HTTP status; returns the response on success or the mapped error.
async fn ensure_success(response: Response, fallback: &str) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    let message = server_message(&body).unwrap_or_else(|| fallback.to_string());
    debug!(status = status.as_u16(), %message, "Backend rejected request");
    Err(match status {
        StatusCode::UNAUTHORIZED => PortError::Unauthorized,
        StatusCode::FORBIDDEN => PortError::Forbidden(message),
        StatusCode::NOT_FOUND => PortError::NotFound(message),
        _ => PortError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

fn server_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct LoginEnvelope {
    access_token: String,
    user: UserRecord,
}

#[derive(Deserialize)]
struct RoleRecord {
    name: String,
}

#[derive(Deserialize)]
struct UserRecord {
    id: i64,
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    role: Option<RoleRecord>,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role.map(|r| Role::from_name(&r.name)),
            is_active: self.is_active,
        }
    }

    fn to_session_user(self) -> SessionUser {
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

#[derive(Deserialize)]
struct AccountRecord {
    id: Option<i64>,
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

#[derive(Deserialize)]
struct StudentRecord {
    id: i64,
    student_id: Option<String>,
    user: Option<AccountRecord>,
    date_of_birth: Option<NaiveDate>,
    gender: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    admission_date: Option<NaiveDate>,
}

impl StudentRecord {
    fn to_domain(self) -> Student {
        let gender = self.gender.as_deref().and_then(|g| match g.parse::<Gender>() {
            Ok(gender) => Some(gender),
            Err(e) => {
                warn!(student = self.id, "Ignoring gender: {}", e);
                None
            }
        });
        Student {
            id: self.id,
            student_id: self.student_id.unwrap_or_default(),
            user: self.user.map(|u| StudentAccount {
                id: u.id,
                username: u.username,
                email: u.email,
                first_name: u.first_name,
                last_name: u.last_name,
            }),
            date_of_birth: self.date_of_birth,
            gender,
            phone: self.phone,
            address: self.address,
            admission_date: self.admission_date,
        }
    }
}

#[derive(Deserialize)]
struct StudentsEnvelope {
    #[serde(default)]
    students: Vec<StudentRecord>,
}

#[derive(Deserialize)]
struct StudentEnvelope {
    student: StudentRecord,
}

#[derive(Deserialize)]
struct UsersEnvelope {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Deserialize, Default)]
struct AnalyticsRecord {
    #[serde(default)]
    total_students: u64,
    #[serde(default)]
    recent_admissions: u64,
    #[serde(default)]
    gender_distribution: BTreeMap<String, u64>,
}

#[derive(Deserialize)]
struct AnalyticsEnvelope {
    #[serde(default)]
    analytics: AnalyticsRecord,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct StudentBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    date_of_birth: NaiveDate,
    gender: Option<&'static str>,
    phone: Option<&'a str>,
    address: Option<&'a str>,
    admission_date: Option<NaiveDate>,
}

impl<'a> StudentBody<'a> {
    fn create(s: &'a NewStudent) -> Self {
        Self {
            username: Some(&s.username),
            password: Some(&s.password),
            email: &s.email,
            first_name: &s.first_name,
            last_name: &s.last_name,
            date_of_birth: s.date_of_birth,
            gender: s.gender.map(|g| g.as_str()),
            phone: s.phone.as_deref(),
            address: s.address.as_deref(),
            admission_date: s.admission_date,
        }
    }

    fn update(u: &'a StudentUpdate) -> Self {
        Self {
            username: None,
            password: None,
            email: &u.email,
            first_name: &u.first_name,
            last_name: &u.last_name,
            date_of_birth: u.date_of_birth,
            gender: u.gender.map(|g| g.as_str()),
            phone: u.phone.as_deref(),
            address: u.address.as_deref(),
            admission_date: u.admission_date,
        }
    }
}

fn to_json<T: Serialize>(body: &T) -> PortResult<Value> {
    serde_json::to_value(body).map_err(|e| PortError::Unexpected(e.to_string()))
}

//=========================================================================================
// `BackendService` Trait Implementation
//=========================================================================================

#[async_trait]
impl BackendService for HttpBackend {
    async fn login(&self, username: &str, password: &str) -> PortResult<Session> {
        let body = to_json(&LoginBody { username, password })?;
        let value = match self
            .request(None, Method::POST, "auth/login", Some(&body), "Invalid credentials")
            .await
        {
            Ok(value) => value,
            // Any rejection at login is a credentials problem, shown on the form.
            Err(PortError::Unauthorized) => {
                return Err(PortError::Auth("Invalid credentials".to_string()))
            }
            Err(PortError::Api { message, .. })
            | Err(PortError::Forbidden(message))
            | Err(PortError::NotFound(message)) => return Err(PortError::Auth(message)),
            Err(other) => return Err(other),
        };
        let envelope: LoginEnvelope = serde_json::from_value(value)
            .map_err(|e| PortError::Unexpected(format!("Malformed login response: {}", e)))?;
        Ok(Session {
            token: AuthToken::new(envelope.access_token),
            user: envelope.user.to_session_user(),
        })
    }

    async fn list_students(&self, token: &AuthToken) -> PortResult<Vec<Student>> {
        let envelope: StudentsEnvelope = self
            .fetch(token, Method::GET, "students", None, "Failed to load students")
            .await?;
        Ok(envelope.students.into_iter().map(StudentRecord::to_domain).collect())
    }

    async fn get_student(&self, token: &AuthToken, id: i64) -> PortResult<Student> {
        let envelope: StudentEnvelope = self
            .fetch(
                token,
                Method::GET,
                &format!("students/{}", id),
                None,
                "Student not found",
            )
            .await?;
        Ok(envelope.student.to_domain())
    }

    async fn create_student(&self, token: &AuthToken, student: &NewStudent) -> PortResult<Student> {
        let body = to_json(&StudentBody::create(student))?;
        let envelope: StudentEnvelope = self
            .fetch(token, Method::POST, "students", Some(body), "Failed to save student")
            .await?;
        Ok(envelope.student.to_domain())
    }

    async fn update_student(
        &self,
        token: &AuthToken,
        id: i64,
        update: &StudentUpdate,
    ) -> PortResult<Student> {
        let body = to_json(&StudentBody::update(update))?;
        let envelope: StudentEnvelope = self
            .fetch(
                token,
                Method::PUT,
                &format!("students/{}", id),
                Some(body),
                "Failed to save student",
            )
            .await?;
        Ok(envelope.student.to_domain())
    }

    async fn delete_student(&self, token: &AuthToken, id: i64) -> PortResult<()> {
        self.request(
            Some(token),
            Method::DELETE,
            &format!("students/{}", id),
            None,
            "Failed to delete student",
        )
        .await?;
        Ok(())
    }

    async fn list_users(&self, token: &AuthToken) -> PortResult<Vec<User>> {
        let envelope: UsersEnvelope = self
            .fetch(token, Method::GET, "admin/users", None, "Failed to load users")
            .await?;
        Ok(envelope.users.into_iter().map(UserRecord::to_domain).collect())
    }

    async fn set_user_active(&self, token: &AuthToken, id: i64, active: bool) -> PortResult<()> {
        let action = if active { "activate" } else { "deactivate" };
        self.request(
            Some(token),
            Method::POST,
            &format!("admin/users/{}/{}", id, action),
            None,
            &format!("Failed to {} user", action),
        )
        .await?;
        Ok(())
    }

    async fn analytics(&self, token: &AuthToken) -> PortResult<Analytics> {
        let envelope: AnalyticsEnvelope = self
            .fetch(token, Method::GET, "reports/analytics", None, "Failed to load analytics")
            .await?;
        let record = envelope.analytics;
        Ok(Analytics {
            total_students: record.total_students,
            recent_admissions: record.recent_admissions,
            gender_distribution: record.gender_distribution,
        })
    }

    async fn generate_report(&self, token: &AuthToken, format: ReportFormat) -> PortResult<Report> {
        // Binary payload: no JSON parsing on success.
        let path = format!("reports/students?format={}", format.query_value());
        let response = self.send(Some(token), Method::GET, &path, None).await?;
        let response = ensure_success(response, "Failed to generate report").await?;
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;
        Ok(Report {
            filename: format.file_name(),
            content_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_api_prefix() {
        let base = Url::parse("http://localhost:5000/api").unwrap();
        let backend = HttpBackend::new(&base, Duration::from_secs(5)).unwrap();
        assert_eq!(backend.endpoint("students"), "http://localhost:5000/api/students");
        assert_eq!(
            backend.endpoint("/admin/users/3/activate"),
            "http://localhost:5000/api/admin/users/3/activate"
        );
    }

    #[test]
    fn server_message_prefers_non_empty_message() {
        assert_eq!(
            server_message(br#"{"status":"error","message":"Student not found"}"#),
            Some("Student not found".to_string())
        );
        assert_eq!(server_message(br#"{"message":"  "}"#), None);
        assert_eq!(server_message(b"<html>502</html>"), None);
    }

    #[test]
    fn student_record_tolerates_missing_fields() {
        let record: StudentRecord = serde_json::from_str(
            r#"{"id": 9, "student_id": null, "gender": "Unknown", "date_of_birth": "2001-03-20"}"#,
        )
        .unwrap();
        let student = record.to_domain();
        assert_eq!(student.student_id, "");
        assert_eq!(student.gender, None);
        assert_eq!(student.date_of_birth, NaiveDate::from_ymd_opt(2001, 3, 20));
        assert!(student.user.is_none());
    }

    #[test]
    fn update_body_omits_identity_fields() {
        let update = StudentUpdate {
            email: "a@b.co".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            gender: Some(Gender::Female),
            phone: None,
            address: None,
            admission_date: None,
        };
        let value = to_json(&StudentBody::update(&update)).unwrap();
        assert!(value.get("username").is_none());
        assert!(value.get("password").is_none());
        assert_eq!(value["gender"], "Female");
        assert_eq!(value["date_of_birth"], "2000-01-01");
        assert!(value["phone"].is_null());
    }
}
