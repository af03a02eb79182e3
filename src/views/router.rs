//! Router
//!
//! Maps a path to a view based on session presence and role. Role checks
//! here decide what is shown, not what the backend allows.

use serde::Serialize;
use std::fmt;

use crate::session::{Role, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Dashboard,
    Login,
    Register,
    Admin,
}

impl Route {
    /// Unknown paths fall back to the dashboard
    pub fn parse(path: &str) -> Route {
        match path.trim().trim_end_matches('/') {
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/admin" => Route::Admin,
            _ => Route::Dashboard,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Admin => "/admin",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// The route actually shown for a request
pub fn resolve(requested: Route, session: Option<&Session>) -> Route {
    match (requested, session) {
        (Route::Register, None) => Route::Register,
        (_, None) => Route::Login,
        (Route::Login | Route::Register, Some(_)) => Route::Dashboard,
        (Route::Admin, Some(s)) if s.role == Role::Admin => Route::Admin,
        (Route::Admin, Some(_)) => Route::Dashboard,
        (Route::Dashboard, Some(_)) => Route::Dashboard,
    }
}
