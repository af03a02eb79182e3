//! View Components
//!
//! Presentation logic driven by the session and the query caches. Each
//! view produces a plain view model; the CLI turns it into text.
//!
//! - [`router`]: path + session → view
//! - [`auth`]: login and registration forms
//! - [`dashboard`]: patient vitals with paging and alert cards
//! - [`admin`]: user management and dataset operations
//! - [`notify`]: transient success/error notifications
//! - [`render`]: terminal rendering of the view models

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod notify;
pub mod render;
pub mod router;

pub use admin::{AdminError, AdminPanel, UserForm, UserRow};
pub use auth::{AuthError, LoginForm, RegisterForm};
pub use dashboard::{
    CardView, Dashboard, DashboardError, DashboardState, DashboardView, HistoryPhase, HistoryView, Pagination,
    PatientSelector, ReadyView, SampleRow,
};
pub use notify::{Notification, NotificationLevel, Notifier};
pub use router::{resolve, Route};

/// Interactive yes/no confirmation before destructive actions
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}
