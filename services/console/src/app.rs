//! services/console/src/app.rs
//!
//! The application state: one owner for the session store, the view router
//! and the page controllers. Every user action enters through a method here
//! and comes back as a `Frame` to render.

use crate::adapters::{DemoBackend, FileStorage, HttpBackend};
use crate::config::Config;
use crate::controllers::{
    DashboardController, ReportsController, StudentFilter, StudentsController, UsersController,
};
use crate::error::AppError;
use crate::router::{Page, Screen, ViewRouter};
use crate::session::SessionStore;
use crate::view::{student_details, Frame, Notice, PageView, ProfileView};
use std::path::PathBuf;
use std::sync::Arc;
use student_portal_core::domain::{NewStudent, ReportFormat, Session, Student, StudentUpdate};
use student_portal_core::ports::{BackendService, PortError, PortResult, SessionStorage};
use tracing::{info, warn};

pub struct App {
    session: SessionStore,
    router: ViewRouter,
    dashboard: DashboardController,
    students: StudentsController,
    users: UsersController,
    reports: ReportsController,
}

impl App {
    pub fn new(
        backend: Arc<dyn BackendService>,
        storage: Arc<dyn SessionStorage>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            session: SessionStore::new(backend.clone(), storage),
            router: ViewRouter::new(),
            dashboard: DashboardController::new(backend.clone()),
            students: StudentsController::new(backend.clone()),
            users: UsersController::new(backend.clone()),
            reports: ReportsController::new(backend, download_dir),
        }
    }

    /// Wires the backend and storage selected by the configuration.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let backend: Arc<dyn BackendService> = match &config.api_base_url {
            Some(url) => {
                info!(environment = config.environment.name(), %url, "Using REST backend");
                Arc::new(HttpBackend::new(url, config.request_timeout)?)
            }
            None => {
                info!("Using in-memory demo backend");
                let demo = DemoBackend::new();
                Arc::new(if config.demo_latency { demo } else { demo.without_latency() })
            }
        };
        let storage = Arc::new(FileStorage::new(&config.session_file));
        info!(path = %storage.path().display(), "Session file");
        Ok(Self::new(backend, storage, &config.download_dir))
    }

    //=====================================================================================
    // Accessors
    //=====================================================================================

    pub fn router(&self) -> &ViewRouter {
        &self.router
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session.current()
    }

    pub fn students(&self) -> &StudentsController {
        &self.students
    }

    pub fn users(&self) -> &UsersController {
        &self.users
    }

    //=====================================================================================
    // Session
    //=====================================================================================

    /// Restores a persisted session, landing on the dashboard, or shows login.
    pub async fn start(&mut self) -> Frame {
        match self.session.restore() {
            Ok(Some(session)) => self.enter(&session).await,
            Ok(None) => Frame::view(PageView::Login),
            Err(e) => {
                warn!("Could not read stored session: {}", e);
                Frame::view(PageView::Login)
            }
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Frame {
        match self.session.login(username, password).await {
            Ok(session) => self.enter(&session).await,
            Err(e) => Frame::view(PageView::Login).with_notice(Notice::from_error(&e)),
        }
    }

    async fn enter(&mut self, session: &Session) -> Frame {
        self.router.enter(session.role());
        self.render_page(session, Page::Dashboard).await
    }

    pub fn logout(&mut self) -> Frame {
        if let Err(e) = self.session.logout() {
            warn!("Could not clear stored session: {}", e);
        }
        self.drop_state();
        Frame::view(PageView::Login).with_notice(Notice::success("Logged out."))
    }

    fn drop_state(&mut self) {
        self.router.leave();
        self.students.reset();
        self.users.reset();
    }

    /// Turns an action failure into a frame. A rejected token ends the session.
    fn fail(&mut self, error: PortError) -> Frame {
        if error == PortError::Unauthorized {
            warn!("Token rejected, returning to login");
            if let Err(e) = self.session.logout() {
                warn!("Could not clear stored session: {}", e);
            }
            self.drop_state();
            return Frame::view(PageView::Login).with_notice(Notice::from_error(&error));
        }
        Frame::notice(Notice::from_error(&error))
    }

    fn require_session(&self) -> PortResult<Session> {
        self.session.require()
    }

    /// The session, but only while `page` is the visible one. Actions that
    /// belong to a page are ignored anywhere else.
    fn session_on(&self, page: Page) -> Option<Session> {
        if self.router.is_visible(page) {
            self.session.current()
        } else {
            None
        }
    }

    //=====================================================================================
    // Navigation
    //=====================================================================================

    /// Shows `page` and runs its load routine. A refused navigation returns an
    /// empty frame: nothing changes and nothing is fetched.
    pub async fn navigate(&mut self, page: Page) -> Frame {
        let Ok(session) = self.require_session() else {
            return Frame::default();
        };
        match self.router.route(page) {
            Some(page) => self.render_page(&session, page).await,
            None => Frame::default(),
        }
    }

    async fn render_page(&mut self, session: &Session, page: Page) -> Frame {
        let role = session.role();
        match page {
            Page::Dashboard => match self.dashboard.load(session).await {
                Ok(view) => Frame::view(PageView::Dashboard(view)),
                Err(e) => self.fail(e),
            },
            Page::Students => match self.students.load(session).await {
                Err(PortError::Unauthorized) => self.fail(PortError::Unauthorized),
                _ => Frame::view(PageView::Students(self.students.view(role))),
            },
            Page::Users => match self.users.load(session).await {
                Err(PortError::Unauthorized) => self.fail(PortError::Unauthorized),
                _ => Frame::view(PageView::Users(self.users.view())),
            },
            Page::Reports => Frame::view(PageView::Reports(self.reports.open())),
            Page::Profile => Frame::view(PageView::Profile(ProfileView {
                user: session.user.clone(),
            })),
        }
    }

    //=====================================================================================
    // Students
    //=====================================================================================

    /// Filters the loaded students without fetching.
    pub fn filter_students(&mut self, filter: StudentFilter) -> Frame {
        let Some(session) = self.session_on(Page::Students) else {
            return Frame::default();
        };
        Frame::view(PageView::Students(self.students.filter(filter, session.role())))
    }

    /// One student from the list, or from the backend when the list lacks it.
    /// Off the students page the error frame is empty.
    pub async fn student_record(&mut self, id: i64) -> Result<Student, Frame> {
        let Some(session) = self.session_on(Page::Students) else {
            return Err(Frame::default());
        };
        match self.students.lookup(&session, id).await {
            Ok(student) => Ok(student),
            Err(e) => Err(self.fail(e)),
        }
    }

    pub async fn view_student(&mut self, id: i64) -> Frame {
        match self.student_record(id).await {
            Ok(student) => Frame::view(PageView::Details(student_details(&student))),
            Err(frame) => frame,
        }
    }

    pub async fn create_student(&mut self, student: &NewStudent) -> Frame {
        let Some(session) = self.session_on(Page::Students) else {
            return Frame::default();
        };
        match self.students.create(&session, student).await {
            Ok(notice) => self.students_frame(&session).with_notice(notice),
            Err(e) => self.fail(e),
        }
    }

    pub async fn update_student(&mut self, id: i64, update: &StudentUpdate) -> Frame {
        let Some(session) = self.session_on(Page::Students) else {
            return Frame::default();
        };
        match self.students.update(&session, id, update).await {
            Ok(notice) => self.students_frame(&session).with_notice(notice),
            Err(e) => self.fail(e),
        }
    }

    pub async fn delete_student(&mut self, id: i64) -> Frame {
        let Some(session) = self.session_on(Page::Students) else {
            return Frame::default();
        };
        match self.students.delete(&session, id).await {
            Ok(notice) => self.students_frame(&session).with_notice(notice),
            Err(e) => self.fail(e),
        }
    }

    fn students_frame(&self, session: &Session) -> Frame {
        Frame::view(PageView::Students(self.students.view(session.role())))
    }

    //=====================================================================================
    // Users
    //=====================================================================================

    pub async fn set_user_active(&mut self, id: i64, active: bool) -> Frame {
        let Some(session) = self.session_on(Page::Users) else {
            return Frame::default();
        };
        match self.users.set_active(&session, id, active).await {
            Ok(notice) => Frame::view(PageView::Users(self.users.view())).with_notice(notice),
            Err(e) => self.fail(e),
        }
    }

    //=====================================================================================
    // Reports
    //=====================================================================================

    pub async fn generate_report(&mut self, format: ReportFormat) -> Frame {
        let Some(session) = self.session_on(Page::Reports) else {
            return Frame::default();
        };
        match self.reports.generate(&session, format).await {
            Ok((_, notice)) => Frame::notice(notice),
            Err(e) => self.fail(e),
        }
    }

    pub async fn show_analytics(&mut self) -> Frame {
        let Some(session) = self.session_on(Page::Reports) else {
            return Frame::default();
        };
        match self.reports.show_analytics(&session).await {
            Ok(view) => Frame::view(PageView::Reports(view)),
            Err(e) => self.fail(e),
        }
    }

    pub fn screen(&self) -> Screen {
        self.router.screen()
    }
}
