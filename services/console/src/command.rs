//! services/console/src/command.rs
//!
//! The terminal's input language. Each line is parsed into a `Command` and
//! dispatched to the `App`, standing in for the page's click and submit
//! handlers.

use crate::app::App;
use crate::router::Page;
use crate::view::{Frame, Notice};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use student_portal_core::domain::{Gender, NewStudent, ReportFormat, Student, StudentUpdate};
use student_portal_core::validate::sanitize;

pub const HELP: &str = "\
Commands:
  login <username> <password>     sign in
  logout                          sign out
  go <page>                       dashboard | students | users | reports | profile
  search [text]                   filter students by name, email or id
  gender <male|female|other|all>  filter students by gender
  view <id>                       show one student
  add key=value ...               create a student (username password email
                                  first_name last_name dob [gender phone
                                  address admission_date])
  edit <id> key=value ...         update fields of a student
  delete <id>                     delete a student
  activate <id> | deactivate <id> change a user's status
  report <pdf|xlsx>               download the student report
  analytics                       show analytics on the reports page
  menu                            list reachable pages
  help                            this text
  quit                            exit";

/// Form fields given as `key=value` pairs.
pub type Fields = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login { username: String, password: String },
    Logout,
    Go(Page),
    Search(String),
    Gender(Option<Gender>),
    View(i64),
    Add(Fields),
    Edit(i64, Fields),
    Delete(i64),
    SetActive(i64, bool),
    Report(ReportFormat),
    Analytics,
    Menu,
    Help,
    Quit,
}

/// Splits a line on whitespace, keeping double-quoted runs together.
pub fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    tokens.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if in_quotes {
        return Err("Unterminated quote".to_string());
    }
    if started {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_id(raw: Option<&String>) -> Result<i64, String> {
    let raw = raw.ok_or("An id is required")?;
    raw.parse::<i64>()
        .map_err(|_| format!("'{}' is not a valid id", raw))
}

fn parse_fields(tokens: &[String]) -> Result<Fields, String> {
    tokens
        .iter()
        .map(|t| {
            t.split_once('=')
                .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.to_string()))
                .ok_or_else(|| format!("Expected key=value, got '{}'", t))
        })
        .collect()
}

impl Command {
    /// Parses one input line. An empty line yields `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let tokens = tokenize(line)?;
        let Some((head, rest)) = tokens.split_first() else {
            return Ok(None);
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "login" => match rest {
                [username, password] => Command::Login {
                    username: username.clone(),
                    password: password.clone(),
                },
                _ => return Err("Usage: login <username> <password>".to_string()),
            },
            "logout" => Command::Logout,
            "go" => Command::Go(rest.first().ok_or("Usage: go <page>")?.parse()?),
            "dashboard" | "students" | "users" | "reports" | "profile" => Command::Go(head.parse()?),
            "search" => Command::Search(rest.join(" ")),
            "gender" => match rest.first().map(|g| g.to_ascii_lowercase()) {
                None => Command::Gender(None),
                Some(g) if g == "all" || g.is_empty() => Command::Gender(None),
                Some(g) => Command::Gender(Some(g.parse()?)),
            },
            "view" => Command::View(parse_id(rest.first())?),
            "add" => Command::Add(parse_fields(rest)?),
            "edit" => Command::Edit(parse_id(rest.first())?, parse_fields(rest.get(1..).unwrap_or(&[]))?),
            "delete" => Command::Delete(parse_id(rest.first())?),
            "activate" => Command::SetActive(parse_id(rest.first())?, true),
            "deactivate" => Command::SetActive(parse_id(rest.first())?, false),
            "report" => Command::Report(rest.first().ok_or("Usage: report <pdf|xlsx>")?.parse()?),
            "analytics" => Command::Analytics,
            "menu" => Command::Menu,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("Unknown command '{}'. Type `help`.", other)),
        };
        Ok(Some(command))
    }
}

//=========================================================================================
// Form Handling
//=========================================================================================

fn required<'a>(fields: &'a Fields, key: &str) -> Result<&'a str, String> {
    fields
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| format!("Missing required field '{}'", key))
}

fn optional(fields: &Fields, key: &str) -> Option<String> {
    fields
        .get(key)
        .map(|v| sanitize(v, None))
        .filter(|v| !v.is_empty())
}

fn parse_date(key: &str, raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid {} format. Use YYYY-MM-DD", key))
}

fn optional_date(fields: &Fields, key: &str) -> Result<Option<NaiveDate>, String> {
    optional(fields, key).map(|v| parse_date(key, &v)).transpose()
}

fn optional_gender(fields: &Fields) -> Result<Option<Gender>, String> {
    optional(fields, "gender").map(|g| g.parse()).transpose()
}

/// Builds a create payload from `add` fields.
pub fn new_student(fields: &Fields) -> Result<NewStudent, String> {
    Ok(NewStudent {
        username: sanitize(required(fields, "username")?, None),
        password: required(fields, "password")?.to_string(),
        email: sanitize(required(fields, "email")?, None),
        first_name: sanitize(required(fields, "first_name")?, None),
        last_name: sanitize(required(fields, "last_name")?, None),
        date_of_birth: parse_date("dob", required(fields, "dob")?)?,
        gender: optional_gender(fields)?,
        phone: optional(fields, "phone"),
        address: optional(fields, "address"),
        admission_date: optional_date(fields, "admission_date")?,
    })
}

/// Prefills the edit form from `student` and applies `edit` fields on top.
/// A missing date of birth can be supplied by the fields themselves.
pub fn edit_form(mut student: Student, fields: &Fields) -> Result<StudentUpdate, String> {
    if student.date_of_birth.is_none() {
        if let Some(raw) = fields.get("dob").or_else(|| fields.get("date_of_birth")) {
            student.date_of_birth = Some(parse_date("dob", raw)?);
        }
    }
    let base = StudentUpdate::from_student(&student).map_err(|e| e.to_string())?;
    apply_edits(base, fields)
}

/// Applies `edit` fields on top of a prefilled form.
pub fn apply_edits(mut update: StudentUpdate, fields: &Fields) -> Result<StudentUpdate, String> {
    for (key, value) in fields {
        let value = value.trim();
        match key.as_str() {
            "email" => update.email = value.to_string(),
            "first_name" => update.first_name = value.to_string(),
            "last_name" => update.last_name = value.to_string(),
            "dob" | "date_of_birth" => update.date_of_birth = parse_date("dob", value)?,
            "gender" => {
                update.gender = if value.is_empty() { None } else { Some(value.parse()?) }
            }
            "phone" => update.phone = Some(value.to_string()).filter(|v| !v.is_empty()),
            "address" => update.address = Some(value.to_string()).filter(|v| !v.is_empty()),
            "admission_date" => {
                update.admission_date = if value.is_empty() {
                    None
                } else {
                    Some(parse_date("admission_date", value)?)
                }
            }
            "username" | "password" => {
                return Err(format!("'{}' cannot be changed when editing", key))
            }
            other => return Err(format!("Unknown field '{}'", other)),
        }
    }
    Ok(update)
}

//=========================================================================================
// Dispatch
//=========================================================================================

/// Page actions are ignored off their page; tell the user where to go.
fn off_page_hint(app: &App, frame: Frame, page: Page) -> Frame {
    if !frame.is_empty() {
        return frame;
    }
    if app.current_session().is_none() {
        return Frame::notice(Notice::error("Please sign in first."));
    }
    Frame::notice(Notice::error(format!(
        "Open the {} page first (`go {}`).",
        page, page
    )))
}

/// Runs one command against the application. `Quit` is handled by the caller.
pub async fn dispatch(app: &mut App, command: Command) -> Frame {
    match command {
        Command::Login { username, password } => app.login(&username, &password).await,
        Command::Logout => app.logout(),
        Command::Go(page) => {
            let frame = app.navigate(page).await;
            if frame.is_empty() && app.current_session().is_some() {
                // Gated pages are silently ignored by the router; say so here.
                Frame::notice(Notice::error(format!("The {} page is not available.", page)))
            } else {
                frame
            }
        }
        Command::Search(term) => {
            let filter = app.students().current_filter().with_search(term);
            let frame = app.filter_students(filter);
            off_page_hint(app, frame, Page::Students)
        }
        Command::Gender(gender) => {
            let filter = app.students().current_filter().with_gender(gender);
            let frame = app.filter_students(filter);
            off_page_hint(app, frame, Page::Students)
        }
        Command::View(id) => {
            let frame = app.view_student(id).await;
            off_page_hint(app, frame, Page::Students)
        }
        Command::Add(fields) => match new_student(&fields) {
            Ok(student) => {
                let frame = app.create_student(&student).await;
                off_page_hint(app, frame, Page::Students)
            }
            Err(message) => Frame::notice(Notice::error(message)),
        },
        Command::Edit(id, fields) => {
            let student = match app.student_record(id).await {
                Ok(student) => student,
                Err(frame) => return off_page_hint(app, frame, Page::Students),
            };
            match edit_form(student, &fields) {
                Ok(update) => app.update_student(id, &update).await,
                Err(message) => Frame::notice(Notice::error(message)),
            }
        }
        Command::Delete(id) => {
            let frame = app.delete_student(id).await;
            off_page_hint(app, frame, Page::Students)
        }
        Command::SetActive(id, active) => {
            let frame = app.set_user_active(id, active).await;
            off_page_hint(app, frame, Page::Users)
        }
        Command::Report(format) => {
            let frame = app.generate_report(format).await;
            off_page_hint(app, frame, Page::Reports)
        }
        Command::Analytics => {
            let frame = app.show_analytics().await;
            off_page_hint(app, frame, Page::Reports)
        }
        Command::Menu => {
            let entries: Vec<String> = app
                .router()
                .menu()
                .entries()
                .iter()
                .map(|p| p.to_string())
                .collect();
            if entries.is_empty() || app.current_session().is_none() {
                Frame::notice(Notice::error("Please sign in first."))
            } else {
                Frame::notice(Notice::success(format!("Pages: {}", entries.join(", "))))
            }
        }
        Command::Help => Frame::notice(Notice::success(HELP)),
        Command::Quit => Frame::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_keeps_quoted_values() {
        assert_eq!(
            tokenize(r#"add address="123 Main St, City" phone=1"#).unwrap(),
            vec!["add", "address=123 Main St, City", "phone=1"]
        );
        assert_eq!(tokenize(r#"search """#).unwrap(), vec!["search", ""]);
        assert!(tokenize(r#"add address="oops"#).is_err());
    }

    #[test]
    fn parses_navigation_and_filters() {
        assert_eq!(Command::parse("go users").unwrap(), Some(Command::Go(Page::Users)));
        assert_eq!(Command::parse("students").unwrap(), Some(Command::Go(Page::Students)));
        assert_eq!(
            Command::parse("gender female").unwrap(),
            Some(Command::Gender(Some(Gender::Female)))
        );
        assert_eq!(Command::parse("gender all").unwrap(), Some(Command::Gender(None)));
        assert_eq!(
            Command::parse("search jane smith").unwrap(),
            Some(Command::Search("jane smith".into()))
        );
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Command::parse("login admin").is_err());
        assert!(Command::parse("delete abc").is_err());
        assert!(Command::parse("report docx").is_err());
        assert!(Command::parse("frobnicate").is_err());
        assert!(Command::parse("edit 3 nonsense").is_err());
    }

    #[test]
    fn builds_new_student_from_fields() {
        let Some(Command::Add(fields)) = Command::parse(
            "add username=amy password=secret123 email=amy@example.com \
             first_name=Amy last_name=Lee dob=2002-04-02 gender=female",
        )
        .unwrap() else {
            panic!("expected add");
        };
        let student = new_student(&fields).unwrap();
        assert_eq!(student.gender, Some(Gender::Female));
        assert_eq!(student.date_of_birth, NaiveDate::from_ymd_opt(2002, 4, 2).unwrap());
        assert_eq!(student.phone, None);

        let mut missing = fields.clone();
        missing.remove("email");
        assert_eq!(
            new_student(&missing).unwrap_err(),
            "Missing required field 'email'"
        );
    }

    #[test]
    fn edits_override_prefilled_form() {
        let base = StudentUpdate {
            email: "old@example.com".into(),
            first_name: "Old".into(),
            last_name: "Name".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            gender: Some(Gender::Male),
            phone: Some("+1234567890".into()),
            address: None,
            admission_date: None,
        };
        let fields = parse_fields(&["first_name=New".to_string(), "phone=".to_string()]).unwrap();
        let update = apply_edits(base.clone(), &fields).unwrap();
        assert_eq!(update.first_name, "New");
        assert_eq!(update.phone, None);
        assert_eq!(update.email, base.email);

        let bad = parse_fields(&["username=x".to_string()]).unwrap();
        assert!(apply_edits(base, &bad).is_err());
    }

    #[test]
    fn edit_form_reports_missing_birth_date() {
        let student = Student {
            id: 7,
            student_id: "STU007".into(),
            user: Some(student_portal_core::domain::StudentAccount {
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

        let rename = parse_fields(&["first_name=Ann".to_string()]).unwrap();
        let message = edit_form(student.clone(), &rename).unwrap_err();
        assert!(message.contains("no date of birth"), "{}", message);
        assert!(!message.contains("not found"));

        let with_dob =
            parse_fields(&["first_name=Ann".to_string(), "dob=2002-04-02".to_string()]).unwrap();
        let form = edit_form(student, &with_dob).unwrap();
        assert_eq!(form.first_name, "Ann");
        assert_eq!(form.date_of_birth, NaiveDate::from_ymd_opt(2002, 4, 2).unwrap());
    }
}
