//! Portal pages and the access rules that guard them.

use std::{fmt, str::FromStr};

use crate::session::Session;

/// A page of the portal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Sign-in form.
    Login,
    /// Landing page for signed-in agents.
    Dashboard,
    /// Public job board.
    Jobs,
    /// Job detail by slug.
    JobDetail(String),
    /// The agent's job applications.
    Applications,
    /// Commission earnings.
    Earnings,
    /// Profile view and editor.
    Profile,
    /// Account settings.
    Settings,
    /// Sponsor code and invitations.
    Recruit,
}

/// Who may see a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Only visitors without a session; signed-in agents are sent on.
    PublicOnly,
    /// Anyone.
    Public,
    /// Signed-in agents only.
    Protected,
}

/// Outcome of guarding a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// The session is still being restored; show a loading indicator.
    Pending,
    /// Show the page.
    Render,
    /// Send the visitor to log in, returning to `return_to` afterwards.
    RedirectToLogin {
        /// The page that was asked for.
        return_to: Route,
    },
    /// Send the visitor elsewhere.
    Redirect(Route),
}

/// The path did not name a portal page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown route `{0}`")]
pub struct UnknownRoute(pub String);

impl Route {
    /// Who may see this page.
    #[must_use]
    pub fn access(&self) -> Access {
        match self {
            Self::Login => Access::PublicOnly,
            Self::Jobs | Self::JobDetail(_) => Access::Public,
            Self::Dashboard
            | Self::Applications
            | Self::Earnings
            | Self::Profile
            | Self::Settings
            | Self::Recruit => Access::Protected,
        }
    }

    /// Path of this page. Job slugs are percent-encoded so the path always
    /// parses back to the same route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Jobs => "/jobs".to_string(),
            Self::JobDetail(slug) => format!("/jobs/{}", urlencoding::encode(slug)),
            Self::Applications => "/applications".to_string(),
            Self::Earnings => "/earnings".to_string(),
            Self::Profile => "/profile".to_string(),
            Self::Settings => "/settings".to_string(),
            Self::Recruit => "/recruit".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim().trim_end_matches('/');
        let mut segments = trimmed.trim_start_matches('/').split('/');
        let route = match (segments.next(), segments.next(), segments.next()) {
            (Some("" | "dashboard"), None, None) => Self::Dashboard,
            (Some("login"), None, None) => Self::Login,
            (Some("jobs"), None, None) => Self::Jobs,
            (Some("jobs"), Some(slug), None) if !slug.is_empty() => {
                let slug = urlencoding::decode(slug).map_err(|_| UnknownRoute(path.to_string()))?;
                Self::JobDetail(slug.into_owned())
            }
            (Some("applications"), None, None) => Self::Applications,
            (Some("earnings"), None, None) => Self::Earnings,
            (Some("profile"), None, None) => Self::Profile,
            (Some("settings"), None, None) => Self::Settings,
            (Some("recruit"), None, None) => Self::Recruit,
            _ => return Err(UnknownRoute(path.to_string())),
        };
        Ok(route)
    }
}

/// Guard a navigation to `route` for the given session.
#[must_use]
pub fn resolve(session: &Session, route: &Route) -> RouteDecision {
    match route.access() {
        Access::Public => RouteDecision::Render,
        _ if session.is_loading() => RouteDecision::Pending,
        Access::PublicOnly if session.is_authenticated() => RouteDecision::Redirect(Route::Dashboard),
        Access::PublicOnly => RouteDecision::Render,
        Access::Protected if session.is_authenticated() => RouteDecision::Render,
        Access::Protected => RouteDecision::RedirectToLogin {
            return_to: route.clone(),
        },
    }
}

/// Where to go once login succeeds.
#[must_use]
pub fn post_login_destination(return_to: Option<Route>) -> Route {
    match return_to {
        Some(Route::Login) | None => Route::Dashboard,
        Some(route) => route,
    }
}
