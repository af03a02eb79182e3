//! Backend API Client
//!
//! HTTP access to the vitals backend, built with reqwest.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /login` - Exchange username/password for a credential and role
//! - `POST /register` - Create an account
//!
//! ## Vitals
//! - `GET /patients` - List patient identifiers
//! - `GET /history?id=&page=&limit=` - One page of samples
//!
//! ## Admin
//! - `GET /users`, `POST /users`, `DELETE /users/{id}` - Account management
//! - `POST /admin/upload` - Multipart CSV upload (field `file`)
//! - `POST /admin/reset-data` - Clear all vitals
//! - `POST /admin/seed-sample` - Insert sample vitals
//!
//! Views talk to the backend through the [`VitalsApi`] trait so tests can
//! swap in a scripted fake.

pub mod client;
pub mod dto;
pub mod error;

pub use client::{ApiClient, ApiClientConfig};
pub use dto::{DatasetUpload, InsertedResponse, LoginResponse, NewUser, UserAccount};
pub use error::{ApiError, ApiResult};

use async_trait::async_trait;

use crate::session::Credential;
use crate::vitals::{PatientId, VitalsSample};

/// Operations the backend offers.
///
/// Authenticated calls take the credential to attach; `None` sends the
/// request without an `Authorization` header.
#[async_trait]
pub trait VitalsApi: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse>;

    async fn register(&self, username: &str, password: &str) -> ApiResult<()>;

    async fn list_patients(&self, credential: Option<&Credential>) -> ApiResult<Vec<PatientId>>;

    async fn fetch_history(
        &self,
        credential: Option<&Credential>,
        patient: &PatientId,
        page: u32,
        limit: usize,
    ) -> ApiResult<Vec<VitalsSample>>;

    async fn list_users(&self, credential: Option<&Credential>) -> ApiResult<Vec<UserAccount>>;

    async fn create_user(&self, credential: Option<&Credential>, user: &NewUser) -> ApiResult<()>;

    async fn delete_user(&self, credential: Option<&Credential>, id: i64) -> ApiResult<()>;

    async fn upload_dataset(
        &self,
        credential: Option<&Credential>,
        upload: DatasetUpload,
    ) -> ApiResult<InsertedResponse>;

    async fn reset_data(&self, credential: Option<&Credential>) -> ApiResult<()>;

    async fn seed_sample(&self, credential: Option<&Credential>) -> ApiResult<InsertedResponse>;
}
