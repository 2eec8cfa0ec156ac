//! services/console/src/adapters/demo.rs
//!
//! An in-memory stand-in for the REST backend, used when no server is
//! reachable. It implements the same `BackendService` port over a fixed set
//! of sample records, with an artificial delay on every call.
//!
//! The records belong to one `DemoBackend` instance rather than the process,
//! so separate instances never see each other's mutations.

use async_trait::async_trait;
use chrono::{Duration as Days, Local, NaiveDate};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;
use student_portal_core::domain::{
    Analytics, AuthToken, Gender, NewStudent, Report, ReportFormat, Role, Session, SessionUser,
    Student, StudentAccount, StudentUpdate, User,
};
use student_portal_core::ports::{BackendService, PortError, PortResult};
use tracing::{debug, info};
use uuid::Uuid;

/// Message returned by every report request in demo mode.
pub const REPORT_UNAVAILABLE: &str =
    "Report generation is not available in demo mode. Please connect to a live backend.";

/// Accepted demo logins, paired with the index of the account they unlock.
const DEMO_LOGINS: [(&str, &str, usize); 2] = [("admin", "admin123", 0), ("teacher1", "teacher123", 1)];

// Emulated network latency per operation, in milliseconds.
const LOGIN_DELAY_MS: u64 = 500;
const LIST_DELAY_MS: u64 = 300;
const GET_DELAY_MS: u64 = 200;
const WRITE_DELAY_MS: u64 = 400;
const DELETE_DELAY_MS: u64 = 300;
const REPORT_DELAY_MS: u64 = 500;

/// How many days back an admission still counts as recent.
const RECENT_ADMISSION_DAYS: i64 = 30;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

struct DemoData {
    users: Vec<User>,
    students: Vec<Student>,
}

pub struct DemoBackend {
    data: Mutex<DemoData>,
    latency: bool,
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoBackend {
    /// Creates a backend seeded with the sample records.
    pub fn new() -> Self {
        Self {
            data: Mutex::new(DemoData {
                users: seed_users(),
                students: seed_students(),
            }),
            latency: true,
        }
    }

    /// Skips the artificial delays (tests, scripted sessions).
    pub fn without_latency(mut self) -> Self {
        self.latency = false;
        self
    }

    async fn delay(&self, millis: u64) {
        if self.latency {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }
}

//=========================================================================================
// `BackendService` Trait Implementation
//=========================================================================================

#[async_trait]
impl BackendService for DemoBackend {
    async fn login(&self, username: &str, password: &str) -> PortResult<Session> {
        self.delay(LOGIN_DELAY_MS).await;

        let index = DEMO_LOGINS
            .iter()
            .find(|(u, p, _)| *u == username && *p == password)
            .map(|(_, _, index)| *index)
            .ok_or_else(|| PortError::Auth("Invalid credentials".to_string()))?;

        let data = self.data.lock();
        let user = data
            .users
            .get(index)
            .ok_or_else(|| PortError::Unexpected("Demo account missing".to_string()))?;
        info!(username, "Demo login");

        Ok(Session {
            token: AuthToken::new(format!("demo-token-{}", Uuid::new_v4())),
            user: SessionUser {
                id: user.id,
                username: user.username.clone(),
                email: user.email.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                role: user.role.clone().unwrap_or(Role::Other(String::new())),
            },
        })
    }

    async fn list_students(&self, _token: &AuthToken) -> PortResult<Vec<Student>> {
        self.delay(LIST_DELAY_MS).await;
        Ok(self.data.lock().students.clone())
    }

    async fn get_student(&self, _token: &AuthToken, id: i64) -> PortResult<Student> {
        self.delay(GET_DELAY_MS).await;
        self.data
            .lock()
            .students
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(student_not_found)
    }

    async fn create_student(&self, _token: &AuthToken, student: &NewStudent) -> PortResult<Student> {
        self.delay(WRITE_DELAY_MS).await;

        let mut data = self.data.lock();
        let id = data.students.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let created = Student {
            id,
            student_id: business_id(id),
            user: Some(StudentAccount {
                id: Some(id + 10),
                username: student.username.clone(),
                email: student.email.clone(),
                first_name: student.first_name.clone(),
                last_name: student.last_name.clone(),
            }),
            date_of_birth: Some(student.date_of_birth),
            gender: student.gender,
            phone: non_blank(&student.phone),
            address: non_blank(&student.address),
            admission_date: Some(
                student
                    .admission_date
                    .unwrap_or_else(|| Local::now().date_naive()),
            ),
        };
        data.students.push(created.clone());
        debug!(id, student_id = %created.student_id, "Demo student created");
        Ok(created)
    }

    async fn update_student(
        &self,
        _token: &AuthToken,
        id: i64,
        update: &StudentUpdate,
    ) -> PortResult<Student> {
        self.delay(WRITE_DELAY_MS).await;

        let mut data = self.data.lock();
        let student = data
            .students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(student_not_found)?;

        if let Some(user) = student.user.as_mut() {
            user.email = update.email.clone();
            user.first_name = update.first_name.clone();
            user.last_name = update.last_name.clone();
        }
        student.date_of_birth = Some(update.date_of_birth);
        student.gender = update.gender;
        student.phone = non_blank(&update.phone);
        student.address = non_blank(&update.address);
        student.admission_date = update.admission_date;
        Ok(student.clone())
    }

    async fn delete_student(&self, _token: &AuthToken, id: i64) -> PortResult<()> {
        self.delay(DELETE_DELAY_MS).await;

        let mut data = self.data.lock();
        let index = data
            .students
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(student_not_found)?;
        data.students.remove(index);
        Ok(())
    }

    async fn list_users(&self, _token: &AuthToken) -> PortResult<Vec<User>> {
        self.delay(LIST_DELAY_MS).await;
        Ok(self.data.lock().users.clone())
    }

    async fn set_user_active(&self, _token: &AuthToken, id: i64, active: bool) -> PortResult<()> {
        self.delay(WRITE_DELAY_MS).await;

        let mut data = self.data.lock();
        let user = data
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?;
        user.is_active = active;
        Ok(())
    }

    async fn analytics(&self, _token: &AuthToken) -> PortResult<Analytics> {
        self.delay(LIST_DELAY_MS).await;

        let data = self.data.lock();
        let cutoff = Local::now().date_naive() - Days::days(RECENT_ADMISSION_DAYS);
        let mut gender_distribution = BTreeMap::new();
        for gender in data.students.iter().filter_map(|s| s.gender) {
            *gender_distribution.entry(gender.as_str().to_string()).or_insert(0) += 1;
        }
        Ok(Analytics {
            total_students: data.students.len() as u64,
            recent_admissions: data
                .students
                .iter()
                .filter(|s| s.admission_date.is_some_and(|d| d >= cutoff))
                .count() as u64,
            gender_distribution,
        })
    }

    async fn generate_report(&self, _token: &AuthToken, format: ReportFormat) -> PortResult<Report> {
        self.delay(REPORT_DELAY_MS).await;
        debug!(format = format.query_value(), "Demo report requested");
        Err(PortError::Api {
            status: 503,
            message: REPORT_UNAVAILABLE.to_string(),
        })
    }
}

fn student_not_found() -> PortError {
    PortError::NotFound("Student not found".to_string())
}

/// Zero-padded business identifier, `STU001` for id 1.
pub fn business_id(id: i64) -> String {
    format!("STU{:03}", id)
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

//=========================================================================================
// Sample Records
//=========================================================================================

fn seed_users() -> Vec<User> {
    vec![
        User {
            id: 1,
            username: "admin".into(),
            email: "admin@example.com".into(),
            first_name: "Admin".into(),
            last_name: "User".into(),
            role: Some(Role::Admin),
            is_active: true,
        },
        User {
            id: 2,
            username: "teacher1".into(),
            email: "teacher@example.com".into(),
            first_name: "Jane".into(),
            last_name: "Smith".into(),
            role: Some(Role::Teacher),
            is_active: true,
        },
    ]
}

fn seed_students() -> Vec<Student> {
    let rows: [(i64, &str, &str, &str, (i32, u32, u32), Gender, &str, &str, (i32, u32, u32)); 5] = [
        (1, "john.doe", "John", "Doe", (2000, 1, 15), Gender::Male, "+1234567890", "123 Main St, City", (2023, 9, 1)),
        (2, "jane.smith", "Jane", "Smith", (2001, 3, 20), Gender::Female, "+1234567891", "456 Oak Ave, Town", (2023, 9, 1)),
        (3, "mike.johnson", "Mike", "Johnson", (1999, 7, 10), Gender::Male, "+1234567892", "789 Pine Rd, Village", (2023, 8, 15)),
        (4, "sarah.wilson", "Sarah", "Wilson", (2000, 11, 25), Gender::Female, "+1234567893", "321 Elm St, City", (2023, 9, 1)),
        (5, "david.brown", "David", "Brown", (2001, 5, 8), Gender::Male, "+1234567894", "654 Maple Dr, Town", (2023, 8, 20)),
    ];

    rows.into_iter()
        .map(|(id, username, first, last, dob, gender, phone, address, admitted)| Student {
            id,
            student_id: business_id(id),
            user: Some(StudentAccount {
                id: Some(id + 2),
                username: username.to_string(),
                email: format!("{}@example.com", username),
                first_name: first.to_string(),
                last_name: last.to_string(),
            }),
            date_of_birth: NaiveDate::from_ymd_opt(dob.0, dob.1, dob.2),
            gender: Some(gender),
            phone: Some(phone.to_string()),
            address: Some(address.to_string()),
            admission_date: NaiveDate::from_ymd_opt(admitted.0, admitted.1, admitted.2),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> AuthToken {
        AuthToken::new("demo")
    }

    #[test]
    fn business_ids_are_zero_padded() {
        assert_eq!(business_id(1), "STU001");
        assert_eq!(business_id(42), "STU042");
        assert_eq!(business_id(1234), "STU1234");
    }

    #[test]
    fn seed_matches_sample_records() {
        let students = seed_students();
        assert_eq!(students.len(), 5);
        assert_eq!(students[2].student_id, "STU003");
        assert_eq!(students[2].email(), Some("mike.johnson@example.com"));
        assert_eq!(seed_users()[1].role, Some(Role::Teacher));
    }

    #[tokio::test]
    async fn only_the_two_demo_logins_succeed() {
        let backend = DemoBackend::new().without_latency();
        let admin = backend.login("admin", "admin123").await.unwrap();
        assert_eq!(admin.user.role, Role::Admin);
        let teacher = backend.login("teacher1", "teacher123").await.unwrap();
        assert_eq!(teacher.user.role, Role::Teacher);

        assert_eq!(
            backend.login("admin", "teacher123").await,
            Err(PortError::Auth("Invalid credentials".into()))
        );
        assert!(backend.login("john.doe", "").await.is_err());
    }

    #[tokio::test]
    async fn get_student_finds_by_id() {
        let backend = DemoBackend::new().without_latency();
        let jane = backend.get_student(&token(), 2).await.unwrap();
        assert_eq!(jane.full_name().as_deref(), Some("Jane Smith"));
        assert_eq!(
            backend.get_student(&token(), 99).await,
            Err(PortError::NotFound("Student not found".into()))
        );
    }

    #[tokio::test]
    async fn ids_continue_after_a_delete() {
        let backend = DemoBackend::new().without_latency();
        backend.delete_student(&token(), 2).await.unwrap();
        let draft = NewStudent {
            username: "new.kid".into(),
            password: "secret123".into(),
            email: "new.kid@example.com".into(),
            first_name: "New".into(),
            last_name: "Kid".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2003, 2, 1).unwrap(),
            gender: Some(Gender::Other),
            phone: Some("".into()),
            address: None,
            admission_date: None,
        };
        let created = backend.create_student(&token(), &draft).await.unwrap();
        assert_eq!(created.id, 6);
        assert_eq!(created.student_id, "STU006");
        assert_eq!(created.phone, None);
        assert_eq!(created.admission_date, Some(Local::now().date_naive()));
    }

    #[tokio::test]
    async fn analytics_counts_genders() {
        let backend = DemoBackend::new().without_latency();
        let analytics = backend.analytics(&token()).await.unwrap();
        assert_eq!(analytics.total_students, 5);
        assert_eq!(analytics.gender_distribution.get("Male"), Some(&3));
        assert_eq!(analytics.gender_distribution.get("Female"), Some(&2));
        assert_eq!(analytics.recent_admissions, 0);
    }

    #[tokio::test]
    async fn toggling_unknown_user_fails() {
        let backend = DemoBackend::new().without_latency();
        backend.set_user_active(&token(), 2, false).await.unwrap();
        assert!(!backend.list_users(&token()).await.unwrap()[1].is_active);
        assert!(matches!(
            backend.set_user_active(&token(), 99, true).await,
            Err(PortError::NotFound(_))
        ));
    }
}
