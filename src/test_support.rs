//! Shared test fixtures: an axum mock backend and a scripted VitalsApi

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::api::{
    ApiError, ApiResult, DatasetUpload, InsertedResponse, LoginResponse, NewUser, UserAccount,
    VitalsApi,
};
use crate::session::{Credential, Role};
use crate::vitals::{PatientId, VitalsSample};

/// Serve `router` on an ephemeral port and return its base URL
pub async fn spawn_backend(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// `n` normal readings, one per second, oldest first
pub fn samples(n: usize) -> Vec<VitalsSample> {
    (0..n)
        .map(|i| VitalsSample {
            heart_rate: 70.0 + i as f64,
            temperature: 36.6,
            spo2: 98.0,
            timestamp: format!("2024-03-01T10:00:{:02}Z", i % 60),
        })
        .collect()
}

/// How a scripted call should fail
#[derive(Debug, Clone)]
pub enum Failure {
    Unauthorized,
    Status(u16, &'static str),
}

impl Failure {
    fn to_error(&self) -> ApiError {
        match self {
            Failure::Unauthorized => ApiError::Unauthorized,
            Failure::Status(status, message) => ApiError::Status {
                status: *status,
                message: (!message.is_empty()).then(|| message.to_string()),
                reason: message.to_string(),
            },
        }
    }
}

#[derive(Default)]
struct FakeState {
    patients: Vec<PatientId>,
    history: HashMap<PatientId, Vec<VitalsSample>>,
    users: Vec<UserAccount>,
    accounts: HashMap<String, (String, Role)>,
    failures: HashMap<&'static str, Failure>,
    calls: Vec<(&'static str, Option<Credential>)>,
    uploads: Vec<DatasetUpload>,
}

/// In-memory backend with scripted data and failures
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patients(self, ids: &[&str]) -> Self {
        self.state.lock().unwrap().patients = ids.iter().map(|id| PatientId::from(*id)).collect();
        self
    }

    pub fn with_history(self, patient: &str, samples: Vec<VitalsSample>) -> Self {
        self.state
            .lock()
            .unwrap()
            .history
            .insert(PatientId::from(patient), samples);
        self
    }

    pub fn with_users(self, users: Vec<UserAccount>) -> Self {
        self.state.lock().unwrap().users = users;
        self
    }

    pub fn with_account(self, username: &str, password: &str, role: Role) -> Self {
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(username.to_string(), (password.to_string(), role));
        self
    }

    /// Make every call of `op` fail
    pub fn failing(self, op: &'static str, failure: Failure) -> Self {
        self.fail(op, failure);
        self
    }

    pub fn fail(&self, op: &'static str, failure: Failure) {
        self.state.lock().unwrap().failures.insert(op, failure);
    }

    pub fn recover(&self, op: &'static str) {
        self.state.lock().unwrap().failures.remove(op);
    }

    pub fn set_patients(&self, ids: &[&str]) {
        self.state.lock().unwrap().patients = ids.iter().map(|id| PatientId::from(*id)).collect();
    }

    pub fn set_history(&self, patient: &str, samples: Vec<VitalsSample>) {
        self.state
            .lock()
            .unwrap()
            .history
            .insert(PatientId::from(patient), samples);
    }

    /// Number of calls made to `op`
    pub fn calls(&self, op: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(name, _)| *name == op)
            .count()
    }

    /// Credential sent with the most recent call to `op`
    pub fn last_credential(&self, op: &str) -> Option<Credential> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .rev()
            .find(|(name, _)| *name == op)
            .and_then(|(_, cred)| cred.clone())
    }

    pub fn users(&self) -> Vec<UserAccount> {
        self.state.lock().unwrap().users.clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .uploads
            .iter()
            .map(|u| u.file_name.clone())
            .collect()
    }

    fn record(&self, op: &'static str, credential: Option<&Credential>) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((op, credential.cloned()));
        match state.failures.get(op) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl VitalsApi for FakeApi {
    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        self.record("login", None)?;
        let state = self.state.lock().unwrap();
        match state.accounts.get(username) {
            Some((expected, role)) if expected == password => Ok(LoginResponse {
                access_token: format!("token-{}", username),
                role: *role,
            }),
            _ => Err(ApiError::Unauthorized),
        }
    }

    async fn register(&self, username: &str, password: &str) -> ApiResult<()> {
        self.record("register", None)?;
        let mut state = self.state.lock().unwrap();
        if state.accounts.contains_key(username) {
            return Err(ApiError::Status {
                status: 409,
                message: Some("User already exists".to_string()),
                reason: r#"{"msg": "User already exists"}"#.to_string(),
            });
        }
        state
            .accounts
            .insert(username.to_string(), (password.to_string(), Role::Doctor));
        Ok(())
    }

    async fn list_patients(&self, credential: Option<&Credential>) -> ApiResult<Vec<PatientId>> {
        self.record("patients", credential)?;
        Ok(self.state.lock().unwrap().patients.clone())
    }

    async fn fetch_history(
        &self,
        credential: Option<&Credential>,
        patient: &PatientId,
        page: u32,
        limit: usize,
    ) -> ApiResult<Vec<VitalsSample>> {
        self.record("history", credential)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .history
            .get(patient)
            .map(|all| {
                all.iter()
                    .skip(page as usize * limit)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_users(&self, credential: Option<&Credential>) -> ApiResult<Vec<UserAccount>> {
        self.record("users", credential)?;
        Ok(self.state.lock().unwrap().users.clone())
    }

    async fn create_user(&self, credential: Option<&Credential>, user: &NewUser) -> ApiResult<()> {
        self.record("create_user", credential)?;
        let mut state = self.state.lock().unwrap();
        let id = state.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        state.users.push(UserAccount {
            id,
            username: user.username.clone(),
            role: user.role,
        });
        Ok(())
    }

    async fn delete_user(&self, credential: Option<&Credential>, id: i64) -> ApiResult<()> {
        self.record("delete_user", credential)?;
        self.state.lock().unwrap().users.retain(|u| u.id != id);
        Ok(())
    }

    async fn upload_dataset(
        &self,
        credential: Option<&Credential>,
        upload: DatasetUpload,
    ) -> ApiResult<InsertedResponse> {
        self.record("upload", credential)?;
        let rows = upload.bytes.iter().filter(|b| **b == b'\n').count().saturating_sub(1);
        self.state.lock().unwrap().uploads.push(upload);
        Ok(InsertedResponse {
            inserted: rows as u64,
        })
    }

    async fn reset_data(&self, credential: Option<&Credential>) -> ApiResult<()> {
        self.record("reset", credential)?;
        self.state.lock().unwrap().history.clear();
        Ok(())
    }

    async fn seed_sample(&self, credential: Option<&Credential>) -> ApiResult<InsertedResponse> {
        self.record("seed", credential)?;
        let mut state = self.state.lock().unwrap();
        let seeded = samples(20);
        for id in ["P001", "P002"] {
            let id = PatientId::from(id);
            if !state.patients.contains(&id) {
                state.patients.push(id.clone());
            }
            state.history.insert(id, seeded.clone());
        }
        Ok(InsertedResponse { inserted: 40 })
    }
}
