//! Console routes and the navigator that publishes the current one.

use std::fmt;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    Settings,
    Organization(String),
    Projects(String),
    Workspaces(String),
    Workspace(String),
    Run(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".into(),
            Route::Signup => "/signup".into(),
            Route::Dashboard => "/".into(),
            Route::Settings => "/settings".into(),
            Route::Organization(id) => format!("/organizations/{id}"),
            Route::Projects(org) => format!("/organizations/{org}/projects"),
            Route::Workspaces(project) => format!("/projects/{project}/workspaces"),
            Route::Workspace(id) => format!("/workspaces/{id}"),
            Route::Run(id) => format!("/runs/{id}"),
        }
    }

    /// Routes reachable without a session.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Signup)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Shared handle to the current route. Clones observe the same value.
#[derive(Debug, Clone)]
pub struct Navigator {
    tx: watch::Sender<Route>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn go(&self, route: Route) {
        tracing::debug!(path = %route, "navigate");
        self.tx.send_replace(route);
    }

    pub fn current(&self) -> Route {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.tx.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Navigator::new(Route::Dashboard)
    }
}
