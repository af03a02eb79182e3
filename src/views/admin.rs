//! Admin Panel
//!
//! User management and dataset maintenance. Every mutation reports its
//! outcome through the [`Notifier`] and invalidates the caches it touched.

use serde::Serialize;
use std::sync::Arc;

use crate::api::{ApiError, DatasetUpload, NewUser, UserAccount, VitalsApi};
use crate::query::{QueryClient, QueryState};
use crate::session::{Credential, Role, SessionStore};

use super::{Confirm, Notifier};

pub const RESET_PROMPT: &str = "Are you sure? This will clear all vitals.";

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Cancelled")]
    Cancelled,

    #[error("User {0} is protected and cannot be deleted")]
    Protected(i64),

    #[error("No user with id {0}")]
    UnknownUser(i64),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Error loading users: {0}")]
    Load(Arc<ApiError>),

    #[error("Session ended")]
    Terminated,
}

/// New-user form fields
#[derive(Debug, Clone)]
pub struct UserForm {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl Default for UserForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            role: Role::Doctor,
        }
    }
}

/// One line of the user table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub delete_action: bool,
}

impl From<&UserAccount> for UserRow {
    fn from(user: &UserAccount) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            delete_action: !user.is_protected(),
        }
    }
}

pub struct AdminPanel {
    api: Arc<dyn VitalsApi>,
    session: Arc<SessionStore>,
    queries: Arc<QueryClient>,
    notifier: Arc<Notifier>,
    pub form: UserForm,
    selected_file: Option<DatasetUpload>,
    uploading: bool,
    terminated: bool,
}

impl AdminPanel {
    pub fn new(
        api: Arc<dyn VitalsApi>,
        session: Arc<SessionStore>,
        queries: Arc<QueryClient>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            api,
            session,
            queries,
            notifier,
            form: UserForm::default(),
            selected_file: None,
            uploading: false,
            terminated: false,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn selected_file(&self) -> Option<&DatasetUpload> {
        self.selected_file.as_ref()
    }

    pub fn select_file(&mut self, upload: DatasetUpload) {
        self.selected_file = Some(upload);
    }

    fn credential(&mut self) -> Result<Credential, AdminError> {
        if self.terminated {
            return Err(AdminError::Terminated);
        }
        match self.session.credential() {
            Some(credential) => Ok(credential),
            None => Err(self.terminate()),
        }
    }

    fn terminate(&mut self) -> AdminError {
        tracing::warn!("Credential rejected; ending session");
        self.terminated = true;
        self.session.logout();
        self.queries.clear();
        AdminError::Terminated
    }

    /// 401 ends the session; anything else is reported with `failure`
    fn fail(&mut self, error: ApiError, failure: &str) -> AdminError {
        if error.is_unauthorized() {
            return self.terminate();
        }
        self.notifier.error(failure);
        AdminError::Api(error)
    }

    /// User list through the users cache
    pub async fn users(&mut self) -> Result<Arc<Vec<UserAccount>>, AdminError> {
        let credential = self.credential()?;
        match self
            .queries
            .list_users(self.api.as_ref(), Some(&credential))
            .await
        {
            QueryState::Success(users) => Ok(users),
            QueryState::Error(e) if e.is_unauthorized() => Err(self.terminate()),
            QueryState::Error(e) => Err(AdminError::Load(e)),
            QueryState::Pending => Ok(Arc::new(Vec::new())),
        }
    }

    /// Rows for the user table
    pub async fn rows(&mut self) -> Result<Vec<UserRow>, AdminError> {
        let users = self.users().await?;
        Ok(users.iter().map(UserRow::from).collect())
    }

    pub async fn create_user(&mut self) -> Result<(), AdminError> {
        if self.form.username.trim().is_empty() {
            return Err(AdminError::Validation("Username is required"));
        }
        if self.form.password.is_empty() {
            return Err(AdminError::Validation("Password is required"));
        }
        let credential = self.credential()?;

        let user = NewUser {
            username: self.form.username.trim().to_string(),
            password: self.form.password.clone(),
            role: self.form.role,
        };

        match self.api.create_user(Some(&credential), &user).await {
            Ok(()) => {
                tracing::info!(username = %user.username, role = %user.role, "Created user");
                self.form.username.clear();
                self.form.password.clear();
                self.queries.invalidate_users();
                self.notifier.success("User created");
                Ok(())
            }
            Err(e) => Err(self.fail(e, "Failed to create user")),
        }
    }

    pub async fn delete_user(&mut self, id: i64, confirm: &dyn Confirm) -> Result<(), AdminError> {
        let users = self.users().await?;
        let user = users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(AdminError::UnknownUser(id))?;

        if user.is_protected() {
            return Err(AdminError::Protected(id));
        }
        let prompt = format!("Are you sure you want to delete user \"{}\"?", user.username);
        if !confirm.confirm(&prompt) {
            return Err(AdminError::Cancelled);
        }
        let credential = self.credential()?;

        match self.api.delete_user(Some(&credential), id).await {
            Ok(()) => {
                tracing::info!(id, username = %user.username, "Deleted user");
                self.queries.invalidate_users();
                self.notifier.success("User deleted");
                Ok(())
            }
            Err(e) => Err(self.fail(e, "Failed to delete user")),
        }
    }

    /// Send the selected file; returns the inserted row count
    pub async fn upload_dataset(&mut self) -> Result<u64, AdminError> {
        let upload = match self.selected_file.clone() {
            Some(upload) => upload,
            None => {
                self.notifier.error("Pick a CSV file first");
                return Err(AdminError::Validation("Pick a CSV file first"));
            }
        };
        let credential = self.credential()?;

        self.uploading = true;
        let file_name = upload.file_name.clone();
        let result = self.api.upload_dataset(Some(&credential), upload).await;
        self.uploading = false;

        match result {
            Ok(resp) => {
                tracing::info!(file = %file_name, inserted = resp.inserted, "Uploaded dataset");
                self.selected_file = None;
                self.invalidate_vitals();
                self.notifier.success(format!("Uploaded {} rows", resp.inserted));
                Ok(resp.inserted)
            }
            Err(e) => Err(self.fail(e, "Upload failed")),
        }
    }

    pub async fn reset_data(&mut self, confirm: &dyn Confirm) -> Result<(), AdminError> {
        if !confirm.confirm(RESET_PROMPT) {
            return Err(AdminError::Cancelled);
        }
        let credential = self.credential()?;

        match self.api.reset_data(Some(&credential)).await {
            Ok(()) => {
                tracing::info!("Cleared all vitals");
                self.invalidate_vitals();
                self.notifier.success("Vitals cleared");
                Ok(())
            }
            Err(e) => Err(self.fail(e, "Reset failed")),
        }
    }

    pub async fn seed_sample(&mut self) -> Result<u64, AdminError> {
        let credential = self.credential()?;

        match self.api.seed_sample(Some(&credential)).await {
            Ok(resp) => {
                tracing::info!(inserted = resp.inserted, "Seeded sample data");
                self.invalidate_vitals();
                self.notifier.success(format!("Seeded {} rows", resp.inserted));
                Ok(resp.inserted)
            }
            Err(e) => Err(self.fail(e, "Seeding failed")),
        }
    }

    /// Dataset changes can add or remove patients as well as samples
    fn invalidate_vitals(&self) {
        self.queries.invalidate_history();
        self.queries.invalidate_patients();
    }
}
