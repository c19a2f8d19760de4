// src/routes.rs

//! Client-side route table and role-based route guard.
//!
//! The guard is a UX gate only; the API enforces real access control.

use std::fmt;

use tokio::sync::watch;
use tracing::debug;

use crate::{
    error::AppError,
    models::user::Role,
    session::{SessionContext, SessionStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    StudentDashboard,
    LecturerDashboard,
    ManagerDashboard,
    MyCourses,
    StudentFeedback,
    LecturerFeedback,
    StudentCourse { course_id: i64 },
    LecturerCourse { course_id: i64 },
    QuizTaking { quiz_id: i64 },
    QuizFinished { attempt_id: i64 },
    QuizReview { attempt_id: i64 },
}

const STUDENT: &[Role] = &[Role::Student];
const LECTURER: &[Role] = &[Role::Lecturer];
const MANAGER: &[Role] = &[Role::Manager];
const TEACHING: &[Role] = &[Role::Student, Role::Lecturer];

impl Route {
    /// Roles allowed to view the route; `None` for public routes.
    pub fn allowed_roles(&self) -> Option<&'static [Role]> {
        match self {
            Route::Login => None,
            Route::StudentDashboard
            | Route::StudentFeedback
            | Route::StudentCourse { .. }
            | Route::QuizTaking { .. }
            | Route::QuizFinished { .. } => Some(STUDENT),
            Route::LecturerDashboard | Route::LecturerFeedback | Route::LecturerCourse { .. } => {
                Some(LECTURER)
            }
            Route::ManagerDashboard => Some(MANAGER),
            Route::MyCourses | Route::QuizReview { .. } => Some(TEACHING),
        }
    }

    pub fn is_public(&self) -> bool {
        self.allowed_roles().is_none()
    }

    pub fn permits(&self, role: Role) -> bool {
        self.allowed_roles().is_none_or(|roles| roles.contains(&role))
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::StudentDashboard => "/student-dashboard".to_string(),
            Route::LecturerDashboard => "/lecturer-dashboard".to_string(),
            Route::ManagerDashboard => "/manager-dashboard".to_string(),
            Route::MyCourses => "/my-courses".to_string(),
            Route::StudentFeedback => "/student-feedback".to_string(),
            Route::LecturerFeedback => "/lecturer-feedback".to_string(),
            Route::StudentCourse { course_id } => format!("/student/courses/{course_id}"),
            Route::LecturerCourse { course_id } => format!("/lecturer/courses/{course_id}"),
            Route::QuizTaking { quiz_id } => format!("/quiz/{quiz_id}"),
            Route::QuizFinished { attempt_id } => format!("/quiz-finished/{attempt_id}"),
            Route::QuizReview { attempt_id } => format!("/quiz-review/{attempt_id}"),
        }
    }

    pub fn from_path(path: &str) -> Result<Self, AppError> {
        let segments: Vec<&str> = path
            .trim()
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let id = |raw: &str| {
            raw.parse::<i64>()
                .map_err(|_| AppError::BadRequest(format!("invalid id '{raw}' in path '{path}'")))
        };

        match segments.as_slice() {
            ["login"] => Ok(Route::Login),
            ["student-dashboard"] => Ok(Route::StudentDashboard),
            ["lecturer-dashboard"] => Ok(Route::LecturerDashboard),
            ["manager-dashboard"] => Ok(Route::ManagerDashboard),
            ["my-courses"] => Ok(Route::MyCourses),
            ["student-feedback"] => Ok(Route::StudentFeedback),
            ["lecturer-feedback"] => Ok(Route::LecturerFeedback),
            ["student", "courses", raw] => Ok(Route::StudentCourse { course_id: id(raw)? }),
            ["lecturer", "courses", raw] => Ok(Route::LecturerCourse { course_id: id(raw)? }),
            ["quiz", raw] => Ok(Route::QuizTaking { quiz_id: id(raw)? }),
            ["quiz-finished", raw] => Ok(Route::QuizFinished { attempt_id: id(raw)? }),
            ["quiz-review", raw] => Ok(Route::QuizReview { attempt_id: id(raw)? }),
            _ => Err(AppError::NotFound(format!("no view at '{path}'"))),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// The view a role lands on by default.
pub fn landing_route(role: Role) -> Route {
    match role {
        Role::Student => Route::StudentDashboard,
        Role::Lecturer => Route::LecturerDashboard,
        Role::Manager => Route::ManagerDashboard,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub route: Route,
    pub label: &'static str,
}

/// Navigation bar entries for a role.
pub fn nav_links(role: Role) -> Vec<NavLink> {
    let link = |route, label| NavLink { route, label };
    match role {
        Role::Student => vec![
            link(Route::StudentDashboard, "Dashboard"),
            link(Route::MyCourses, "My Courses"),
            link(Route::StudentFeedback, "Feedback"),
        ],
        Role::Lecturer => vec![
            link(Route::LecturerDashboard, "Dashboard"),
            link(Route::MyCourses, "My Courses"),
            link(Route::LecturerFeedback, "Feedback"),
        ],
        Role::Manager => vec![link(Route::ManagerDashboard, "Dashboard")],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    /// Not signed in: go to login, remembering where the user wanted to go.
    RedirectToLogin { from: Route },
    /// Signed in with the wrong role: go to that role's own landing view.
    Redirect(Route),
}

/// Decides access for a role (or no session) to a route.
pub fn check_access(role: Option<Role>, route: Route) -> GuardOutcome {
    if route.is_public() {
        return GuardOutcome::Allow;
    }
    match role {
        None => GuardOutcome::RedirectToLogin { from: route },
        Some(role) if route.permits(role) => GuardOutcome::Allow,
        Some(role) => GuardOutcome::Redirect(landing_route(role)),
    }
}

/// Applies [`check_access`] to the live session.
pub fn guard(session: &SessionContext, route: Route) -> GuardOutcome {
    let role = if session.is_authenticated() {
        session.role()
    } else {
        None
    };
    check_access(role, route)
}

/// Tracks the current view, applies the guard on every navigation, and reacts
/// to forced logouts published by the session.
pub struct Navigator {
    session: SessionContext,
    status: watch::Receiver<SessionStatus>,
    current: Route,
    return_to: Option<Route>,
}

impl Navigator {
    pub fn new(session: SessionContext) -> Self {
        let status = session.subscribe();
        let current = match session.role() {
            Some(role) if session.is_authenticated() => landing_route(role),
            _ => Route::Login,
        };
        Self {
            session,
            status,
            current,
            return_to: None,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// Location remembered by the last redirect to login, if any.
    pub fn return_to(&self) -> Option<Route> {
        self.return_to
    }

    /// Navigates through the guard and returns where the user actually ended up.
    pub fn navigate(&mut self, route: Route) -> Route {
        self.current = match guard(&self.session, route) {
            GuardOutcome::Allow => route,
            GuardOutcome::RedirectToLogin { from } => {
                self.return_to = Some(from);
                Route::Login
            }
            GuardOutcome::Redirect(landing) => landing,
        };
        debug!(requested = %route, landed = %self.current, "navigate");
        self.current
    }

    /// Destination after a successful login: the remembered location when the
    /// new role may view it, otherwise the role's landing view.
    pub fn after_login(&mut self) -> Route {
        let Some(role) = self.session.role() else {
            return self.navigate(Route::Login);
        };
        let target = match self.return_to.take() {
            Some(route) if route.permits(role) => route,
            _ => landing_route(role),
        };
        self.navigate(target)
    }

    /// Applies pending session changes. Returns true when the view changed.
    ///
    /// When the session has ended while a protected view is open, the user is
    /// sent to login. Only a forced logout remembers the open view; after a
    /// voluntary logout the next account starts from its own landing view.
    pub fn sync(&mut self) -> bool {
        if !self.status.has_changed().unwrap_or(false) {
            return false;
        }
        let status = *self.status.borrow_and_update();
        match status {
            SessionStatus::Expired if !self.current.is_public() => {
                self.return_to = Some(self.current);
                self.current = Route::Login;
                true
            }
            SessionStatus::Anonymous => {
                self.return_to = None;
                let moved = !self.current.is_public();
                self.current = Route::Login;
                moved
            }
            _ => false,
        }
    }
}
