//! Dashboard
//!
//! Patient vitals view. The state machine:
//!
//! ```text
//! LoadingPatients ──► Empty
//!        │
//!        ├──► Error
//!        ▼
//!      Ready ── per (patient, page): Loading ──► Ready | Error
//!
//! any 401 ──► Terminated (session logged out)
//! ```
//!
//! The dashboard only ever reads the cache entries for its current
//! (patient, page) key, so a late response for an older key is never
//! shown in place of the current one.

use serde::Serialize;
use std::sync::Arc;

use crate::api::{ApiError, VitalsApi};
use crate::query::{HistoryKey, PatientsKey, QueryClient, QueryState};
use crate::session::{Credential, Role, SessionStore};
use crate::vitals::{self, CardState, PatientId, Thresholds, VitalsPage};

/// Default samples per history page
pub const DEFAULT_PAGE_SIZE: usize = 10;

pub const EMPTY_MESSAGE: &str = "No patient data found. Please ask an admin to upload or seed dataset.";
pub const ERROR_MESSAGE: &str = "Error loading data. Please try again.";
pub const TERMINATED_MESSAGE: &str = "Session expired. Logging out...";

/// History sub-state for the current (patient, page)
#[derive(Debug, Clone)]
pub enum HistoryPhase {
    Loading,
    Ready(Arc<VitalsPage>),
    Error(String),
}

/// Where the dashboard is in its lifecycle
#[derive(Debug, Clone)]
pub enum DashboardState {
    LoadingPatients,
    Empty,
    Error(String),
    Ready {
        patient: PatientId,
        history: HistoryPhase,
    },
    Terminated,
}

impl DashboardState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, DashboardState::Terminated)
    }
}

/// Rejected user actions
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Patient {0} is not in the patient list")]
    UnknownPatient(PatientId),

    #[error("No further pages")]
    NoNextPage,

    #[error("Already on the first page")]
    AtFirstPage,

    #[error("Patients have not loaded yet")]
    NotReady,

    #[error("Session ended")]
    Terminated,
}

// ============================================
// VIEW MODEL
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientSelector {
    pub options: Vec<PatientId>,
    pub selected: PatientId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub label: &'static str,
    pub value: f64,
    pub unit: &'static str,
    pub threshold: f64,
    pub state: CardState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRow {
    pub time: String,
    pub heart_rate: f64,
    pub temperature: f64,
    pub spo2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HistoryView {
    Loading,
    Error { message: String },
    Loaded { rows: Vec<SampleRow> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadyView {
    pub role: Role,
    pub admin_link: bool,
    pub patient: PatientId,
    /// Hidden for nurses
    pub patient_selector: Option<PatientSelector>,
    /// Hidden for nurses
    pub pagination: Option<Pagination>,
    pub cards: Vec<CardView>,
    pub history: HistoryView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum DashboardView {
    Loading,
    Empty { message: String, admin_link: bool },
    Error { message: String },
    Ready(ReadyView),
    Terminated { message: String },
}

// ============================================
// CONTROLLER
// ============================================

pub struct Dashboard {
    api: Arc<dyn VitalsApi>,
    session: Arc<SessionStore>,
    queries: Arc<QueryClient>,
    thresholds: Thresholds,
    page_size: usize,
    selected: Option<PatientId>,
    page: u32,
    terminated: bool,
}

impl Dashboard {
    pub fn new(api: Arc<dyn VitalsApi>, session: Arc<SessionStore>, queries: Arc<QueryClient>) -> Self {
        Self {
            api,
            session,
            queries,
            thresholds: Thresholds::default(),
            page_size: DEFAULT_PAGE_SIZE,
            selected: None,
            page: 0,
            terminated: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn selected_patient(&self) -> Option<&PatientId> {
        self.selected.as_ref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn credential(&self) -> Option<Credential> {
        self.session.credential()
    }

    /// Fetch patients, then history for the current selection
    pub async fn load(&mut self) -> DashboardState {
        self.sync().await;
        self.state()
    }

    /// Re-fetch everything; used by live mode
    pub async fn refresh(&mut self) -> DashboardState {
        self.queries.invalidate_patients();
        self.queries.invalidate_history();
        self.load().await
    }

    async fn sync(&mut self) {
        if self.terminated {
            return;
        }

        let credential = match self.credential() {
            Some(credential) => credential,
            None => {
                self.terminate();
                return;
            }
        };

        let patients = self
            .queries
            .list_patients(self.api.as_ref(), Some(&credential))
            .await;

        let list = match patients {
            QueryState::Success(list) => list,
            QueryState::Error(e) if e.is_unauthorized() => {
                self.terminate();
                return;
            }
            _ => return,
        };

        // Keep the selection inside the fetched list
        let still_listed = self
            .selected
            .as_ref()
            .map(|id| list.contains(id))
            .unwrap_or(false);
        if !still_listed {
            self.selected = list.first().cloned();
            self.page = 0;
        }

        if let Some(patient) = self.selected.clone() {
            let history = self
                .queries
                .fetch_history(
                    self.api.as_ref(),
                    Some(&credential),
                    &patient,
                    self.page,
                    self.page_size,
                )
                .await;

            if history.is_unauthorized() {
                self.terminate();
            }
        }
    }

    /// Forced logout after the backend rejected the credential
    fn terminate(&mut self) {
        if !self.terminated {
            tracing::warn!("Credential rejected; ending session");
        }
        self.terminated = true;
        self.session.logout();
        self.queries.clear();
    }

    fn patients(&self) -> Option<Arc<Vec<PatientId>>> {
        let key = PatientsKey {
            credential: self.credential(),
        };
        self.queries.patients().get(&key)?.data().cloned()
    }

    fn history_key(&self) -> Option<HistoryKey> {
        Some(HistoryKey {
            credential: self.credential(),
            patient: self.selected.clone()?,
            page: self.page,
            page_size: self.page_size,
        })
    }

    /// Current page of samples, if loaded
    pub fn current_page(&self) -> Option<Arc<VitalsPage>> {
        let key = self.history_key()?;
        self.queries.history().get(&key)?.data().cloned()
    }

    /// Derive the state from the cache entries of the current key
    pub fn state(&self) -> DashboardState {
        if self.terminated {
            return DashboardState::Terminated;
        }

        let patients_key = PatientsKey {
            credential: self.credential(),
        };
        let list = match self.queries.patients().get(&patients_key) {
            None | Some(QueryState::Pending) => return DashboardState::LoadingPatients,
            Some(QueryState::Error(e)) => return error_state(&e),
            Some(QueryState::Success(list)) => list,
        };

        if list.is_empty() {
            return DashboardState::Empty;
        }

        let patient = match &self.selected {
            Some(id) => id.clone(),
            None => return DashboardState::LoadingPatients,
        };

        let history = match self.history_key().and_then(|k| self.queries.history().get(&k)) {
            None | Some(QueryState::Pending) => HistoryPhase::Loading,
            Some(QueryState::Error(e)) if e.is_unauthorized() => return DashboardState::Terminated,
            Some(QueryState::Error(e)) => HistoryPhase::Error(e.to_string()),
            Some(QueryState::Success(page)) => HistoryPhase::Ready(page),
        };

        DashboardState::Ready { patient, history }
    }

    fn ensure_ready(&self) -> Result<Arc<Vec<PatientId>>, DashboardError> {
        if self.terminated {
            return Err(DashboardError::Terminated);
        }
        self.patients().ok_or(DashboardError::NotReady)
    }

    /// Switch patient; always resets to the first page
    pub async fn select_patient(&mut self, patient: &PatientId) -> Result<DashboardState, DashboardError> {
        let list = self.ensure_ready()?;
        if !list.contains(patient) {
            return Err(DashboardError::UnknownPatient(patient.clone()));
        }

        self.selected = Some(patient.clone());
        self.page = 0;
        Ok(self.load().await)
    }

    /// Advance one page; only allowed after a full page
    pub async fn next_page(&mut self) -> Result<DashboardState, DashboardError> {
        self.ensure_ready()?;
        let has_next = self.current_page().map(|p| p.has_next()).unwrap_or(false);
        if !has_next {
            return Err(DashboardError::NoNextPage);
        }

        self.page += 1;
        Ok(self.load().await)
    }

    pub async fn previous_page(&mut self) -> Result<DashboardState, DashboardError> {
        self.ensure_ready()?;
        if self.page == 0 {
            return Err(DashboardError::AtFirstPage);
        }

        self.page -= 1;
        Ok(self.load().await)
    }

    /// CSV of the loaded page
    pub fn export_csv(&self) -> Option<Result<String, csv::Error>> {
        self.current_page().map(|page| vitals::export_csv(&page.samples))
    }

    /// Build the view model for the current state and role
    pub fn render(&self) -> DashboardView {
        let role = self.session.role();
        let admin_link = role == Some(Role::Admin);

        match self.state() {
            DashboardState::Terminated => DashboardView::Terminated {
                message: TERMINATED_MESSAGE.to_string(),
            },
            DashboardState::LoadingPatients => DashboardView::Loading,
            DashboardState::Error(detail) => DashboardView::Error {
                message: format!("{} ({})", ERROR_MESSAGE, detail),
            },
            DashboardState::Empty => DashboardView::Empty {
                message: EMPTY_MESSAGE.to_string(),
                admin_link,
            },
            DashboardState::Ready { patient, history } => {
                let role = match role {
                    Some(role) => role,
                    None => {
                        return DashboardView::Terminated {
                            message: TERMINATED_MESSAGE.to_string(),
                        }
                    }
                };
                DashboardView::Ready(self.ready_view(role, admin_link, patient, history))
            }
        }
    }

    fn ready_view(&self, role: Role, admin_link: bool, patient: PatientId, history: HistoryPhase) -> ReadyView {
        let full_controls = role != Role::Nurse;

        let patient_selector = if full_controls {
            self.patients().map(|list| PatientSelector {
                options: list.as_ref().clone(),
                selected: patient.clone(),
            })
        } else {
            None
        };

        let (previous_enabled, next_enabled) = match &history {
            HistoryPhase::Ready(page) => (page.has_previous(), page.has_next()),
            _ => (self.page > 0, false),
        };
        let pagination = full_controls.then_some(Pagination {
            page: self.page,
            previous_enabled,
            next_enabled,
        });

        let (cards, history) = match history {
            HistoryPhase::Loading => (Vec::new(), HistoryView::Loading),
            HistoryPhase::Error(detail) => (
                Vec::new(),
                HistoryView::Error {
                    message: format!("{} ({})", ERROR_MESSAGE, detail),
                },
            ),
            HistoryPhase::Ready(page) => {
                let cards = page
                    .latest()
                    .map(|latest| {
                        vitals::vital_cards(latest, &self.thresholds)
                            .iter()
                            .map(|card| CardView {
                                label: card.label,
                                value: card.value,
                                unit: card.unit,
                                threshold: card.threshold,
                                state: card.state(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                let rows = page
                    .samples
                    .iter()
                    .map(|s| SampleRow {
                        time: s.time(),
                        heart_rate: s.heart_rate,
                        temperature: s.temperature,
                        spo2: s.spo2,
                    })
                    .collect();

                (cards, HistoryView::Loaded { rows })
            }
        };

        ReadyView {
            role,
            admin_link,
            patient,
            patient_selector,
            pagination,
            cards,
            history,
        }
    }
}

fn error_state(e: &ApiError) -> DashboardState {
    if e.is_unauthorized() {
        DashboardState::Terminated
    } else {
        DashboardState::Error(e.to_string())
    }
}
