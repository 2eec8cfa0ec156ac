//! services/console/src/view.rs
//!
//! View models. Controllers turn domain data into these structures and the
//! terminal renders them through `Display`; the domain types never carry any
//! presentation concerns.

use chrono::NaiveDate;
use std::fmt;
use student_portal_core::access::Capability;
use student_portal_core::domain::{Analytics, Role, SessionUser, Student, User};
use student_portal_core::ports::PortError;

pub const NOT_AVAILABLE: &str = "N/A";

/// `Jan 15, 2000`, or `N/A` when there is no date.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn or_na(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

//=========================================================================================
// Notices
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient message shown once after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// The one place a port error becomes user-facing text.
    pub fn from_error(error: &PortError) -> Self {
        let message = match error {
            PortError::Auth(m)
            | PortError::NotFound(m)
            | PortError::Invalid(m)
            | PortError::Unexpected(m) => m.clone(),
            PortError::Api { message, .. } => message.clone(),
            PortError::Network(_) => {
                "Connection error. Please check if the backend server is running.".to_string()
            }
            PortError::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            PortError::Forbidden(what) => format!("You are not allowed to {}.", what),
        };
        Self::error(message)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoticeKind::Success => write!(f, "[ok] {}", self.message),
            NoticeKind::Error => write!(f, "[error] {}", self.message),
        }
    }
}

//=========================================================================================
// Tables
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
    /// Shown in place of rows when there are none.
    pub empty: &'static str,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, by header name.
    pub fn column(&self, header: &str) -> Vec<&str> {
        match self.headers.iter().position(|h| *h == header) {
            Some(i) => self.rows.iter().map(|r| r[i].as_str()).collect(),
            None => Vec::new(),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        write_row(f, &self.headers, &widths)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;
        if self.rows.is_empty() {
            return writeln!(f, "{}", self.empty);
        }
        for row in &self.rows {
            let cells: Vec<&str> = row.iter().map(String::as_str).collect();
            write_row(f, &cells, &widths)?;
        }
        Ok(())
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[&str], widths: &[usize]) -> fmt::Result {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect();
    writeln!(f, "{}", padded.join(" | ").trim_end())
}

/// A list page body: either rows or a single inline error row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Rows(Table),
    Error(String),
}

impl fmt::Display for ListView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListView::Rows(table) => table.fmt(f),
            ListView::Error(message) => writeln!(f, "!! {}", message),
        }
    }
}

/// The inline error row for a failed list load.
pub fn load_error_row(entity: &str, error: &PortError) -> String {
    match error {
        PortError::Network(_) => format!("Error loading {}", entity),
        _ => format!("Failed to load {}", entity),
    }
}

//=========================================================================================
// Row Builders
//=========================================================================================

fn student_actions(student: &Student, role: &Role) -> String {
    let mut actions = vec![format!("view {}", student.id)];
    if role.can(Capability::EditStudent) {
        actions.push(format!("edit {}", student.id));
    }
    if role.can(Capability::DeleteStudent) {
        actions.push(format!("delete {}", student.id));
    }
    actions.join(", ")
}

pub fn students_table(students: &[Student], role: &Role) -> Table {
    Table {
        headers: vec!["Student ID", "Name", "Email", "Gender", "Phone", "Date of Birth", "Actions"],
        rows: students
            .iter()
            .map(|s| {
                vec![
                    or_na(Some(s.student_id.as_str())),
                    or_na(s.full_name().as_deref()),
                    or_na(s.email()),
                    or_na(s.gender.map(|g| g.as_str())),
                    or_na(s.phone.as_deref()),
                    format_date(s.date_of_birth),
                    student_actions(s, role),
                ]
            })
            .collect(),
        empty: "No students found",
    }
}

pub fn recent_students_table(students: &[Student]) -> Table {
    Table {
        headers: vec!["Student ID", "Name", "Email", "Gender", "Admission Date"],
        rows: students
            .iter()
            .map(|s| {
                vec![
                    or_na(Some(s.student_id.as_str())),
                    or_na(s.full_name().as_deref()),
                    or_na(s.email()),
                    or_na(s.gender.map(|g| g.as_str())),
                    format_date(s.admission_date),
                ]
            })
            .collect(),
        empty: "No students found",
    }
}

pub fn users_table(users: &[User]) -> Table {
    Table {
        headers: vec!["Username", "Name", "Email", "Role", "Status", "Action"],
        rows: users
            .iter()
            .map(|u| {
                vec![
                    u.username.clone(),
                    u.full_name(),
                    u.email.clone(),
                    or_na(u.role.as_ref().map(Role::name)),
                    if u.is_active { "Active" } else { "Inactive" }.to_string(),
                    if u.is_active {
                        format!("deactivate {}", u.id)
                    } else {
                        format!("activate {}", u.id)
                    },
                ]
            })
            .collect(),
        empty: "No users found",
    }
}

/// The full record shown by the view action.
pub fn student_details(student: &Student) -> String {
    [
        ("Student ID", or_na(Some(student.student_id.as_str()))),
        ("Name", or_na(student.full_name().as_deref())),
        ("Email", or_na(student.email())),
        ("Gender", or_na(student.gender.map(|g| g.as_str()))),
        ("Date of Birth", format_date(student.date_of_birth)),
        ("Phone", or_na(student.phone.as_deref())),
        ("Address", or_na(student.address.as_deref())),
        ("Admission Date", format_date(student.admission_date)),
    ]
    .iter()
    .map(|(label, value)| format!("{}: {}", label, value))
    .collect::<Vec<_>>()
    .join("\n")
}

//=========================================================================================
// Pages
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub total_students: usize,
    pub male_students: usize,
    pub female_students: usize,
    /// `None` renders as `-` (non-admins do not see account figures).
    pub active_users: Option<usize>,
    pub recent: Table,
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total students:  {}", self.total_students)?;
        writeln!(f, "Male students:   {}", self.male_students)?;
        writeln!(f, "Female students: {}", self.female_students)?;
        match self.active_users {
            Some(n) => writeln!(f, "Active users:    {}", n)?,
            None => writeln!(f, "Active users:    -")?,
        }
        writeln!(f)?;
        writeln!(f, "Recent students")?;
        self.recent.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsPanel {
    Hidden,
    Shown(Analytics),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportsView {
    pub analytics: AnalyticsPanel,
}

impl fmt::Display for ReportsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reports: `report pdf`, `report xlsx`, `analytics`")?;
        match &self.analytics {
            AnalyticsPanel::Hidden => Ok(()),
            AnalyticsPanel::Failed(message) => writeln!(f, "!! {}", message),
            AnalyticsPanel::Shown(a) => {
                writeln!(f, "Total students:     {}", a.total_students)?;
                writeln!(f, "Recent admissions:  {}", a.recent_admissions)?;
                writeln!(f, "Gender distribution:")?;
                for (gender, count) in &a.gender_distribution {
                    writeln!(f, "  {}: {}", gender, count)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileView {
    pub user: SessionUser,
}

impl fmt::Display for ProfileView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Username: {}", self.user.username)?;
        writeln!(f, "Name:     {} {}", self.user.first_name, self.user.last_name)?;
        writeln!(f, "Email:    {}", or_na(Some(self.user.email.as_str())))?;
        writeln!(f, "Role:     {}", self.user.role)
    }
}

/// Whatever the visible screen currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PageView {
    Login,
    Dashboard(DashboardView),
    Students(ListView),
    Users(ListView),
    Reports(ReportsView),
    Profile(ProfileView),
    /// A single record opened from a list.
    Details(String),
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageView::Login => writeln!(f, "== Sign in ==\nUse `login <username> <password>`."),
            PageView::Dashboard(v) => write!(f, "== Dashboard ==\n{}", v),
            PageView::Students(v) => write!(f, "== Students ==\n{}", v),
            PageView::Users(v) => write!(f, "== Users ==\n{}", v),
            PageView::Reports(v) => write!(f, "== Reports ==\n{}", v),
            PageView::Profile(v) => write!(f, "== Profile ==\n{}", v),
            PageView::Details(text) => writeln!(f, "{}", text),
        }
    }
}

/// The result of handling one user action: what to show, and an optional notice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub view: Option<PageView>,
    pub notice: Option<Notice>,
}

impl Frame {
    pub fn view(view: PageView) -> Self {
        Self {
            view: Some(view),
            notice: None,
        }
    }

    pub fn notice(notice: Notice) -> Self {
        Self {
            view: None,
            notice: Some(notice),
        }
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_none() && self.notice.is_none()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(view) = &self.view {
            view.fmt(f)?;
        }
        if let Some(notice) = &self.notice {
            writeln!(f, "{}", notice)?;
        }
        Ok(())
    }
}
