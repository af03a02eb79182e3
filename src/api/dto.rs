//! Data Transfer Objects
//!
//! Request and response bodies exchanged with the backend.

use serde::{Deserialize, Serialize};

use crate::session::Role;

// ============================================
// AUTH DTOs
// ============================================

/// Body of `POST /login` and `POST /register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Server-issued credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "token")]
    pub access_token: String,
    pub role: Role,
}

// ============================================
// HISTORY DTOs
// ============================================

/// Query string of `GET /history`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryParams {
    pub id: String,
    pub page: u32,
    pub limit: usize,
}

// ============================================
// USER DTOs
// ============================================

/// Account as listed by `GET /users`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl UserAccount {
    /// The bootstrap admin account cannot be deleted from the UI
    pub fn is_protected(&self) -> bool {
        self.id == 1 && self.role == Role::Admin
    }
}

/// Body of `POST /users`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
}

// ============================================
// DATASET DTOs
// ============================================

/// A CSV file to send to `POST /admin/upload`
#[derive(Debug, Clone)]
pub struct DatasetUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl DatasetUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a dataset from disk
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "dataset.csv".to_string());
        Ok(Self { file_name, bytes })
    }
}

/// Row count reported by upload and seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertedResponse {
    #[serde(default)]
    pub inserted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_accepts_token_alias() {
        let resp: LoginResponse = serde_json::from_str(r#"{"token": "t", "role": "nurse"}"#).unwrap();
        assert_eq!(resp.access_token, "t");
        assert_eq!(resp.role, Role::Nurse);
    }

    #[test]
    fn test_protected_account() {
        let admin = UserAccount {
            id: 1,
            username: "admin".to_string(),
            role: Role::Admin,
        };
        assert!(admin.is_protected());

        let other_admin = UserAccount { id: 2, ..admin.clone() };
        assert!(!other_admin.is_protected());

        let doctor_one = UserAccount {
            role: Role::Doctor,
            ..admin
        };
        assert!(!doctor_one.is_protected());
    }

    #[test]
    fn test_history_params_query_string_shape() {
        let params = HistoryParams {
            id: "p-7".to_string(),
            page: 2,
            limit: 10,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["id"], "p-7");
        assert_eq!(json["page"], 2);
        assert_eq!(json["limit"], 10);
    }
}
