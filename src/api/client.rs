//! Backend REST API client
//!
//! No retries, no request deduplication. Every call goes straight to the
//! network and any failure is handed back to the caller.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::dto::{CredentialsRequest, HistoryParams};
use super::{
    ApiError, ApiResult, DatasetUpload, InsertedResponse, LoginResponse, NewUser, UserAccount,
    VitalsApi,
};
use crate::session::Credential;
use crate::vitals::{PatientId, VitalsSample};

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the backend (e.g., "http://localhost:5000")
    pub base_url: String,
    /// Request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: None,
        }
    }
}

impl From<&crate::config::ApiConfig> for ApiClientConfig {
    fn from(config: &crate::config::ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: config.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// reqwest-backed [`VitalsApi`]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client with the given configuration
    pub fn new(config: ApiClientConfig) -> ApiResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, credential: Option<&Credential>) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));

        match credential {
            Some(credential) => builder.bearer_auth(credential.as_str()),
            None => builder,
        }
    }

    /// Send a request and map non-2xx statuses to errors
    async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> ApiResult<Response> {
        let request_id = uuid::Uuid::new_v4();

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    error = %e,
                    "API request failed"
                );
                return Err(ApiError::Transport(e));
            }
        };

        let status = response.status();
        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            "API request"
        );

        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> ApiResult<T> {
        let response = self.send(method, path, builder).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl VitalsApi for ApiClient {
    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = CredentialsRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let builder = self.request(Method::POST, "/login", None).json(&body);
        self.send_json(Method::POST, "/login", builder).await
    }

    async fn register(&self, username: &str, password: &str) -> ApiResult<()> {
        let body = CredentialsRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let builder = self.request(Method::POST, "/register", None).json(&body);
        self.send(Method::POST, "/register", builder).await?;
        Ok(())
    }

    async fn list_patients(&self, credential: Option<&Credential>) -> ApiResult<Vec<PatientId>> {
        let builder = self.request(Method::GET, "/patients", credential);
        self.send_json(Method::GET, "/patients", builder).await
    }

    async fn fetch_history(
        &self,
        credential: Option<&Credential>,
        patient: &PatientId,
        page: u32,
        limit: usize,
    ) -> ApiResult<Vec<VitalsSample>> {
        let params = HistoryParams {
            id: patient.as_str().to_string(),
            page,
            limit,
        };
        let builder = self.request(Method::GET, "/history", credential).query(&params);
        self.send_json(Method::GET, "/history", builder).await
    }

    async fn list_users(&self, credential: Option<&Credential>) -> ApiResult<Vec<UserAccount>> {
        let builder = self.request(Method::GET, "/users", credential);
        self.send_json(Method::GET, "/users", builder).await
    }

    async fn create_user(&self, credential: Option<&Credential>, user: &NewUser) -> ApiResult<()> {
        let builder = self.request(Method::POST, "/users", credential).json(user);
        self.send(Method::POST, "/users", builder).await?;
        Ok(())
    }

    async fn delete_user(&self, credential: Option<&Credential>, id: i64) -> ApiResult<()> {
        let path = format!("/users/{}", id);
        let builder = self.request(Method::DELETE, &path, credential);
        self.send(Method::DELETE, &path, builder).await?;
        Ok(())
    }

    async fn upload_dataset(
        &self,
        credential: Option<&Credential>,
        upload: DatasetUpload,
    ) -> ApiResult<InsertedResponse> {
        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str("text/csv")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let builder = self
            .request(Method::POST, "/admin/upload", credential)
            .multipart(form);
        self.send_json(Method::POST, "/admin/upload", builder).await
    }

    async fn reset_data(&self, credential: Option<&Credential>) -> ApiResult<()> {
        let builder = self.request(Method::POST, "/admin/reset-data", credential);
        self.send(Method::POST, "/admin/reset-data", builder).await?;
        Ok(())
    }

    async fn seed_sample(&self, credential: Option<&Credential>) -> ApiResult<InsertedResponse> {
        let builder = self.request(Method::POST, "/admin/seed-sample", credential);
        self.send_json(Method::POST, "/admin/seed-sample", builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use crate::test_support::spawn_backend;
    use axum::{
        extract::{Multipart, Path, Query},
        http::{HeaderMap, StatusCode},
        routing::{delete, get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    }

    async fn client_for(router: Router) -> ApiClient {
        let base_url = spawn_backend(router).await;
        ApiClient::new(ApiClientConfig {
            base_url: format!("{}/", base_url),
            timeout: None,
        })
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ApiClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert!(config.timeout.is_none());
    }

    #[tokio::test]
    async fn test_bearer_attached_when_present() {
        let router = Router::new().route(
            "/patients",
            get(|headers: HeaderMap| async move {
                match bearer(&headers).as_deref() {
                    Some("Bearer tok123") => Ok(Json(json!(["p1", "p2"]))),
                    _ => Err(StatusCode::UNAUTHORIZED),
                }
            }),
        );
        let client = client_for(router).await;

        let patients = client
            .list_patients(Some(&Credential::new("tok123")))
            .await
            .unwrap();
        assert_eq!(patients, vec![PatientId::from("p1"), PatientId::from("p2")]);

        let err = client.list_patients(None).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_history_query_params() {
        let router = Router::new().route(
            "/history",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q.get("id").map(String::as_str), Some("patient 7"));
                assert_eq!(q.get("page").map(String::as_str), Some("3"));
                assert_eq!(q.get("limit").map(String::as_str), Some("10"));
                Json(json!([
                    {"heart_rate": 72, "temperature": 36.6, "spo2": 98, "timestamp": "2024-03-01T10:00:00Z"}
                ]))
            }),
        );
        let client = client_for(router).await;

        let samples = client
            .fetch_history(Some(&Credential::new("t")), &PatientId::from("patient 7"), 3, 10)
            .await
            .unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].heart_rate, 72.0);
    }

    #[tokio::test]
    async fn test_login_and_register() {
        let router = Router::new()
            .route(
                "/login",
                post(|Json(body): Json<serde_json::Value>| async move {
                    if body["username"] == "nina" && body["password"] == "pw" {
                        Ok(Json(json!({"access_token": "jwt-1", "role": "nurse"})))
                    } else {
                        Err((StatusCode::UNAUTHORIZED, Json(json!({"msg": "Bad credentials"}))))
                    }
                }),
            )
            .route(
                "/register",
                post(|| async { (StatusCode::CONFLICT, Json(json!({"msg": "User already exists"}))) }),
            );
        let client = client_for(router).await;

        let resp = client.login("nina", "pw").await.unwrap();
        assert_eq!(resp.access_token, "jwt-1");
        assert_eq!(resp.role, Role::Nurse);

        assert!(client.login("nina", "nope").await.unwrap_err().is_unauthorized());

        let err = client.register("nina", "pw").await.unwrap_err();
        assert_eq!(err.server_message(), Some("User already exists"));
    }

    #[tokio::test]
    async fn test_user_crud() {
        let router = Router::new()
            .route(
                "/users",
                get(|| async { Json(json!([{"id": 1, "username": "admin", "role": "admin"}])) })
                    .post(|Json(body): Json<serde_json::Value>| async move {
                        assert_eq!(body["role"], "doctor");
                        StatusCode::CREATED
                    }),
            )
            .route(
                "/users/:id",
                delete(|Path(id): Path<i64>| async move {
                    if id == 5 {
                        StatusCode::OK
                    } else {
                        StatusCode::NOT_FOUND
                    }
                }),
            );
        let client = client_for(router).await;
        let cred = Credential::new("t");

        let users = client.list_users(Some(&cred)).await.unwrap();
        assert!(users[0].is_protected());

        let new_user = NewUser {
            username: "dana".to_string(),
            password: "pw".to_string(),
            role: Role::Doctor,
        };
        client.create_user(Some(&cred), &new_user).await.unwrap();

        client.delete_user(Some(&cred), 5).await.unwrap();
        let err = client.delete_user(Some(&cred), 9).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_multipart_upload_and_bulk_ops() {
        let router = Router::new()
            .route(
                "/admin/upload",
                post(|mut multipart: Multipart| async move {
                    let field = multipart.next_field().await.unwrap().unwrap();
                    assert_eq!(field.name(), Some("file"));
                    assert_eq!(field.file_name(), Some("vitals.csv"));
                    let data = field.bytes().await.unwrap();
                    let rows = data.iter().filter(|b| **b == b'\n').count();
                    Json(json!({"inserted": rows}))
                }),
            )
            .route("/admin/reset-data", post(|| async { Json(json!({"status": "ok"})) }))
            .route("/admin/seed-sample", post(|| async { Json(json!({"inserted": 50})) }));
        let client = client_for(router).await;
        let cred = Credential::new("t");

        let upload = DatasetUpload::new("vitals.csv", b"a,b\n1,2\n3,4\n".to_vec());
        let resp = client.upload_dataset(Some(&cred), upload).await.unwrap();
        assert_eq!(resp.inserted, 3);

        client.reset_data(Some(&cred)).await.unwrap();
        assert_eq!(client.seed_sample(Some(&cred)).await.unwrap().inserted, 50);
    }

    #[tokio::test]
    async fn test_decode_error_on_bad_shape() {
        let router = Router::new().route("/patients", get(|| async { Json(json!({"oops": true})) }));
        let client = client_for(router).await;

        let err = client.list_patients(None).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_transport_error_when_unreachable() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(ApiClientConfig {
            base_url: format!("http://{}", addr),
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap();

        let err = client.list_patients(None).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
