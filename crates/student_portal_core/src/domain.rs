//! crates/student_portal_core/src/domain.rs
//!
//! Defines the pure, core data structures for the student portal client.
//! These structs are independent of any wire or storage format; adapters
//! translate their own records into them.

use crate::ports::{PortError, PortResult};
use bytes::Bytes;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Session & Identity
//=========================================================================================

/// Opaque bearer credential sent with every authenticated request.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the credential itself.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// The role attached to a system account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Teacher,
    Student,
    /// Any role name the backend knows about that this client does not.
    Other(String),
}

impl Role {
    pub fn from_name(name: &str) -> Self {
        match name {
            "admin" => Role::Admin,
            "teacher" => Role::Teacher,
            "student" => Role::Student,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Other(name) => name,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The identity of the logged-in account.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// An authenticated session. Token and user always travel together.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: AuthToken,
    pub user: SessionUser,
}

impl Session {
    pub fn role(&self) -> &Role {
        &self.user.role
    }
}

//=========================================================================================
// Students
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(format!("'{}' is not a valid gender", s)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The account details embedded in a student record.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentAccount {
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// A student as served by the backend. The client only ever holds copies.
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: i64,
    /// Human-facing business identifier, e.g. `STU004`.
    pub student_id: String,
    pub user: Option<StudentAccount>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub admission_date: Option<NaiveDate>,
}

impl Student {
    pub fn full_name(&self) -> Option<String> {
        self.user
            .as_ref()
            .map(|u| format!("{} {}", u.first_name, u.last_name))
    }

    pub fn email(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.email.as_str())
    }
}

/// Payload for creating a student together with its login account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub admission_date: Option<NaiveDate>,
}

/// Payload for editing an existing student. The username is fixed once created.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentUpdate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub admission_date: Option<NaiveDate>,
}

impl StudentUpdate {
    /// Prefills an edit form from a loaded student. A record without its
    /// account or date of birth cannot fill the required fields.
    pub fn from_student(student: &Student) -> PortResult<Self> {
        let user = student.user.as_ref().ok_or_else(|| {
            PortError::Invalid(format!("Student {} has no account details", student.student_id))
        })?;
        let date_of_birth = student.date_of_birth.ok_or_else(|| {
            PortError::Invalid(format!(
                "Student {} has no date of birth; set it with dob=YYYY-MM-DD",
                student.student_id
            ))
        })?;
        Ok(Self {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            date_of_birth,
            gender: student.gender,
            phone: student.phone.clone(),
            address: student.address.clone(),
            admission_date: student.admission_date,
        })
    }
}

//=========================================================================================
// System Accounts
//=========================================================================================

/// A system account as listed on the admin users page.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<Role>,
    pub is_active: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

//=========================================================================================
// Reports
//=========================================================================================

/// Aggregate figures shown on the reports page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analytics {
    pub total_students: u64,
    pub recent_admissions: u64,
    pub gender_distribution: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Xlsx,
}

impl ReportFormat {
    /// Value of the `format` query parameter.
    pub fn query_value(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Xlsx => "xlsx",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.query_value()
    }

    /// The client-chosen file name for a downloaded report.
    pub fn file_name(&self) -> String {
        format!("students_report.{}", self.extension())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ReportFormat::Pdf),
            "xlsx" | "excel" => Ok(ReportFormat::Xlsx),
            _ => Err(format!("'{}' is not a report format (pdf, xlsx)", s)),
        }
    }
}

/// A downloaded report, kept as an opaque blob.
#[derive(Debug, Clone)]
pub struct Report {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_round_trip_and_keep_unknowns() {
        assert_eq!(Role::from_name("admin"), Role::Admin);
        assert_eq!(Role::from_name("teacher").name(), "teacher");
        assert_eq!(
            Role::from_name("registrar"),
            Role::Other("registrar".to_string())
        );
    }

    #[test]
    fn gender_parses_case_insensitively() {
        assert_eq!("male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!(" Female ".parse::<Gender>().unwrap(), Gender::Female);
        assert!("unknown".parse::<Gender>().is_err());
    }

    #[test]
    fn report_format_picks_file_name() {
        assert_eq!(ReportFormat::Pdf.file_name(), "students_report.pdf");
        assert_eq!("excel".parse::<ReportFormat>().unwrap(), ReportFormat::Xlsx);
        assert_eq!(ReportFormat::Xlsx.file_name(), "students_report.xlsx");
    }

    #[test]
    fn auth_token_debug_is_redacted() {
        let token = AuthToken::new("secret-value");
        assert_eq!(format!("{:?}", token), "AuthToken(***)");
        assert_eq!(token.as_str(), "secret-value");
    }

    #[test]
    fn edit_form_needs_account_and_birth_date() {
        let mut student = Student {
            id: 7,
            student_id: "STU007".into(),
            user: Some(StudentAccount {
                id: Some(9),
                username: "amy".into(),
                email: "amy@example.com".into(),
                first_name: "Amy".into(),
                last_name: "Lee".into(),
            }),
            date_of_birth: None,
            gender: None,
            phone: None,
            address: None,
            admission_date: None,
        };
        assert_eq!(
            StudentUpdate::from_student(&student),
            Err(PortError::Invalid(
                "Student STU007 has no date of birth; set it with dob=YYYY-MM-DD".into()
            ))
        );

        student.date_of_birth = NaiveDate::from_ymd_opt(2002, 4, 2);
        let form = StudentUpdate::from_student(&student).unwrap();
        assert_eq!(form.first_name, "Amy");

        student.user = None;
        assert!(matches!(
            StudentUpdate::from_student(&student),
            Err(PortError::Invalid(_))
        ));
    }
}
