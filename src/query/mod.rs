//! Data Queries
//!
//! Read-only, idempotent fetches cached by composite key.
//!
//! - **Patients**: keyed by credential
//! - **History**: keyed by credential, patient, page and page size
//! - **Users**: keyed by credential (admin panel)
//!
//! Mutations never touch cached data directly; they invalidate a cache
//! and the next read fetches again.

mod cache;

pub use cache::{QueryCache, QueryState, QueryTicket};

use crate::api::{ApiError, UserAccount, VitalsApi};
use crate::session::Credential;
use crate::vitals::{PatientId, VitalsPage};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatientsKey {
    pub credential: Option<Credential>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub credential: Option<Credential>,
    pub patient: PatientId,
    pub page: u32,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UsersKey {
    pub credential: Option<Credential>,
}

/// All query caches shared by the views of one client
pub struct QueryClient {
    patients: QueryCache<PatientsKey, Vec<PatientId>>,
    history: QueryCache<HistoryKey, VitalsPage>,
    users: QueryCache<UsersKey, Vec<UserAccount>>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryClient {
    pub fn new() -> Self {
        Self {
            patients: QueryCache::new("patients"),
            history: QueryCache::new("history"),
            users: QueryCache::new("users"),
        }
    }

    /// Patient identifiers visible to the credential
    pub async fn list_patients(
        &self,
        api: &dyn VitalsApi,
        credential: Option<&Credential>,
    ) -> QueryState<Vec<PatientId>> {
        let key = PatientsKey {
            credential: credential.cloned(),
        };
        self.patients
            .fetch(key, || api.list_patients(credential))
            .await
    }

    /// One page of samples for a patient
    pub async fn fetch_history(
        &self,
        api: &dyn VitalsApi,
        credential: Option<&Credential>,
        patient: &PatientId,
        page: u32,
        page_size: usize,
    ) -> QueryState<VitalsPage> {
        let key = HistoryKey {
            credential: credential.cloned(),
            patient: patient.clone(),
            page,
            page_size,
        };
        self.history
            .fetch(key, || async move {
                let samples = api.fetch_history(credential, patient, page, page_size).await?;
                Ok::<_, ApiError>(VitalsPage {
                    patient: patient.clone(),
                    page,
                    page_size,
                    samples,
                })
            })
            .await
    }

    /// Accounts listed for the admin panel
    pub async fn list_users(
        &self,
        api: &dyn VitalsApi,
        credential: Option<&Credential>,
    ) -> QueryState<Vec<UserAccount>> {
        let key = UsersKey {
            credential: credential.cloned(),
        };
        self.users.fetch(key, || api.list_users(credential)).await
    }

    pub fn patients(&self) -> &QueryCache<PatientsKey, Vec<PatientId>> {
        &self.patients
    }

    pub fn history(&self) -> &QueryCache<HistoryKey, VitalsPage> {
        &self.history
    }

    pub fn users(&self) -> &QueryCache<UsersKey, Vec<UserAccount>> {
        &self.users
    }

    pub fn invalidate_patients(&self) {
        self.patients.invalidate_all();
    }

    pub fn invalidate_history(&self) {
        self.history.invalidate_all();
    }

    pub fn invalidate_users(&self) {
        self.users.invalidate_all();
    }

    /// Forget everything, e.g. after logout
    pub fn clear(&self) {
        let dropped = self.patients.clear() + self.history.clear() + self.users.clear();
        tracing::debug!(dropped, "Cleared query caches");
    }
}
