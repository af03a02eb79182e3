//! # Vitalwatch
//!
//! Client for a patient vital-signs monitoring backend. Clinicians log in,
//! page through a patient's heart rate, temperature and SpO₂ history, and
//! see threshold alerts on the latest reading. Admins manage user accounts
//! and the vitals dataset.
//!
//! ## Modules
//!
//! - [`api`]: REST client for the backend
//! - [`session`]: persisted credential and role
//! - [`query`]: keyed fetch cache with stale-result protection
//! - [`vitals`]: samples, alert thresholds and CSV export
//! - [`views`]: dashboard, admin panel, login forms and routing
//! - [`live`]: periodic dashboard refresh
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vitalwatch::api::{ApiClient, ApiClientConfig};
//! use vitalwatch::query::QueryClient;
//! use vitalwatch::session::SessionStore;
//! use vitalwatch::views::{Dashboard, LoginForm};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = Arc::new(ApiClient::new(ApiClientConfig::default())?);
//!     let session = Arc::new(SessionStore::in_memory());
//!
//!     LoginForm::new("dr.house", "secret")
//!         .submit(api.as_ref(), &session)
//!         .await?;
//!
//!     let mut dashboard = Dashboard::new(api, session, Arc::new(QueryClient::new()));
//!     dashboard.load().await;
//!     println!("{:?}", dashboard.render());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod live;
pub mod query;
pub mod session;
pub mod views;
pub mod vitals;

#[cfg(test)]
mod test_support;

// Re-export top-level types for convenience
pub use api::{ApiClient, ApiClientConfig, ApiError, ApiResult, VitalsApi};

pub use config::Config;

pub use live::{LiveRefresh, StopReason};

pub use query::{QueryCache, QueryClient, QueryState};

pub use session::{Credential, Role, Session, SessionError, SessionStore};

pub use views::{AdminPanel, Dashboard, DashboardView, Notifier, Route};

pub use vitals::{PatientId, Thresholds, VitalsPage, VitalsSample};
