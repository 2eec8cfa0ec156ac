//! services/console/src/router.rs
//!
//! Tracks which screen is visible. Exactly one page is shown at a time, and
//! the users page sits behind the `ViewUsers` capability.

use std::fmt;
use std::str::FromStr;
use student_portal_core::access::Capability;
use student_portal_core::domain::Role;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Students,
    Users,
    Reports,
    Profile,
}

impl Page {
    pub fn name(&self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Students => "students",
            Page::Users => "users",
            Page::Reports => "reports",
            Page::Profile => "profile",
        }
    }

    /// The capability needed to open the page, if any.
    pub fn required_capability(&self) -> Option<Capability> {
        match self {
            Page::Users => Some(Capability::ViewUsers),
            _ => None,
        }
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashboard" | "home" => Ok(Page::Dashboard),
            "students" => Ok(Page::Students),
            "users" => Ok(Page::Users),
            "reports" => Ok(Page::Reports),
            "profile" => Ok(Page::Profile),
            other => Err(format!("Unknown page '{}'", other)),
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Page(Page),
}

/// Role-gated chrome, decided once when the user logs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Menu {
    pub users_nav: bool,
    pub add_student: bool,
}

impl Menu {
    pub fn for_role(role: &Role) -> Self {
        Self {
            users_nav: role.can(Capability::ViewUsers),
            add_student: role.can(Capability::CreateStudent),
        }
    }

    pub fn entries(&self) -> Vec<Page> {
        let mut pages = vec![Page::Dashboard, Page::Students];
        if self.users_nav {
            pages.push(Page::Users);
        }
        pages.extend([Page::Reports, Page::Profile]);
        pages
    }
}

pub struct ViewRouter {
    screen: Screen,
    menu: Menu,
    role: Option<Role>,
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewRouter {
    pub fn new() -> Self {
        Self {
            screen: Screen::Login,
            menu: Menu::default(),
            role: None,
        }
    }

    /// Leaves the login screen for the dashboard and fixes the menu for `role`.
    pub fn enter(&mut self, role: &Role) -> Page {
        self.menu = Menu::for_role(role);
        self.role = Some(role.clone());
        self.screen = Screen::Page(Page::Dashboard);
        Page::Dashboard
    }

    /// Back to the login screen with every page hidden.
    pub fn leave(&mut self) {
        self.screen = Screen::Login;
        self.menu = Menu::default();
        self.role = None;
    }

    /// Switches to `page` if allowed. Returns `None` (and changes nothing)
    /// when logged out or when the role lacks the page's capability.
    pub fn route(&mut self, page: Page) -> Option<Page> {
        let role = self.role.as_ref()?;
        if let Some(capability) = page.required_capability() {
            if !role.can(capability) {
                debug!(%page, %role, "Navigation ignored by role gate");
                return None;
            }
        }
        self.screen = Screen::Page(page);
        Some(page)
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn is_visible(&self, page: Page) -> bool {
        self.screen == Screen::Page(page)
    }

    pub fn menu(&self) -> Menu {
        self.menu
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_login_and_ignores_navigation() {
        let mut router = ViewRouter::new();
        assert_eq!(router.screen(), Screen::Login);
        assert_eq!(router.route(Page::Students), None);
        assert_eq!(router.screen(), Screen::Login);
    }

    #[test]
    fn exactly_one_page_visible() {
        let mut router = ViewRouter::new();
        router.enter(&Role::Admin);
        router.route(Page::Reports);
        let visible: Vec<Page> = [
            Page::Dashboard,
            Page::Students,
            Page::Users,
            Page::Reports,
            Page::Profile,
        ]
        .into_iter()
        .filter(|p| router.is_visible(*p))
        .collect();
        assert_eq!(visible, vec![Page::Reports]);
    }

    #[test]
    fn teacher_cannot_reach_users() {
        let mut router = ViewRouter::new();
        router.enter(&Role::Teacher);
        router.route(Page::Students);
        assert_eq!(router.route(Page::Users), None);
        assert!(router.is_visible(Page::Students));
        assert!(!router.menu().users_nav);
        assert!(!router.menu().add_student);
    }

    #[test]
    fn admin_menu_is_fixed_at_login() {
        let mut router = ViewRouter::new();
        router.enter(&Role::Admin);
        assert_eq!(
            router.menu().entries(),
            vec![Page::Dashboard, Page::Students, Page::Users, Page::Reports, Page::Profile]
        );
        router.leave();
        assert_eq!(router.menu(), Menu::default());
        assert_eq!(router.screen(), Screen::Login);
    }

    #[test]
    fn page_names_parse() {
        assert_eq!("Users".parse::<Page>().unwrap(), Page::Users);
        assert_eq!("home".parse::<Page>().unwrap(), Page::Dashboard);
        assert!("settings".parse::<Page>().is_err());
    }
}
