//! Dashboard accounts: password registration, login and bearer tokens.

use std::time::Duration;

use db::{
    DBService,
    models::user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use utils::auth::{Claims, encode_claims};

use super::validation::{Checks, ValidationError};

const BCRYPT_COST: u32 = 10;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("User already exists")]
    EmailTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    Token(String),
}

/// Token and admin settings read from the environment at startup.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// Lowercased addresses promoted to admin on login.
    pub admin_emails: Vec<String>,
}

impl AuthSettings {
    fn is_admin_email(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.admin_emails.iter().any(|a| *a == email)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checks = Checks::new();
        checks
            .email("email", self.email.trim())
            .len_between("password", &self.password, 8, 128)
            .len_between("name", self.name.trim(), 1, 100);
        if let Some(phone) = self.phone.as_deref() {
            checks.phone("phone", phone);
        }
        checks.finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Checks::new()
            .require(!self.email.trim().is_empty(), "email is required")
            .require(!self.password.is_empty(), "password is required")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Filter for the admin user listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
pub enum UserFilter {
    #[default]
    AllUsers,
    Admin,
    Clients,
}

impl UserFilter {
    fn is_admin(self) -> Option<bool> {
        match self {
            UserFilter::AllUsers => None,
            UserFilter::Admin => Some(true),
            UserFilter::Clients => Some(false),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub status: UserFilter,
}

#[derive(Clone)]
pub struct AuthService {
    db: DBService,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(db: DBService, settings: AuthSettings) -> Self {
        Self { db, settings }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, AuthError> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();
        if User::find_by_email(&self.db.pool, &email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(request.password.clone()).await?;
        let user = User::create(
            &self.db.pool,
            &CreateUser {
                is_admin: self.settings.is_admin_email(&email),
                email,
                name: request.name.trim().to_string(),
                phone: request.phone.clone(),
                password_hash: Some(password_hash),
            },
        )
        .await?;

        info!(user_id = user.id, is_admin = user.is_admin, "Registered dashboard user");
        let token = self.issue_token(&user)?;
        Ok(AuthResponse { user, token })
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, AuthError> {
        request.validate()?;
        let email = request.email.trim();
        let credentials = User::find_credentials(&self.db.pool, email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        // Accounts created by signup have no password until one is set.
        let hash = credentials
            .password_hash
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(request.password.clone(), hash).await? {
            warn!(user_id = credentials.id, "Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        let user = self.load_user(credentials.id).await?;
        let token = self.issue_token(&user)?;
        Ok(AuthResponse { user, token })
    }

    /// The user behind a verified token, promoted first if their address is on
    /// the admin list.
    pub async fn current_user(&self, claims: &Claims) -> Result<User, AuthError> {
        let id = claims.user_id().ok_or(AuthError::UserNotFound)?;
        self.load_user(id).await
    }

    pub async fn users(&self, filter: UserFilter) -> Result<Vec<User>, AuthError> {
        Ok(User::list(&self.db.pool, filter.is_admin()).await?)
    }

    async fn load_user(&self, id: i64) -> Result<User, AuthError> {
        let user = User::find_by_id(&self.db.pool, id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if user.is_admin || !self.settings.is_admin_email(&user.email) {
            return Ok(user);
        }
        info!(user_id = user.id, "Promoting listed address to admin");
        User::promote_to_admin(&self.db.pool, user.id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let claims = Claims::new(user.id, &user.email, user.is_admin, self.settings.token_ttl);
        encode_claims(&claims, &self.settings.jwt_secret).map_err(|e| AuthError::Token(e.to_string()))
    }
}

async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: "secret".into(),
            token_ttl: Duration::from_secs(24 * 3600),
            admin_emails: vec!["owner@thatsmartsite.com".into()],
        }
    }

    #[test]
    fn test_admin_list_ignores_case() {
        let settings = settings();
        assert!(settings.is_admin_email("Owner@ThatSmartSite.com"));
        assert!(!settings.is_admin_email("someone@else.com"));
    }

    #[test]
    fn test_register_validation() {
        let request = RegisterRequest {
            email: "not-an-email".into(),
            password: "short".into(),
            name: " ".into(),
            phone: Some("123".into()),
        };
        assert_eq!(request.validate().unwrap_err().messages().len(), 4);

        let request = RegisterRequest {
            email: "owner@example.com".into(),
            password: "correct horse".into(),
            name: "Owner".into(),
            phone: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_login_needs_both_fields() {
        let request = LoginRequest {
            email: "".into(),
            password: "".into(),
        };
        assert_eq!(request.validate().unwrap_err().messages().len(), 2);
    }

    #[test]
    fn test_user_filter_wire_names() {
        let filter: UserFilter = serde_json::from_str("\"all-users\"").unwrap();
        assert_eq!(filter, UserFilter::AllUsers);
        let query: ListUsersQuery = serde_json::from_str(r#"{"status":"clients"}"#).unwrap();
        assert_eq!(query.status, UserFilter::Clients);
        let query: ListUsersQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.status, UserFilter::AllUsers);
        assert_eq!(UserFilter::Clients.is_admin(), Some(false));
        assert_eq!(UserFilter::Admin.is_admin(), Some(true));
    }

    #[tokio::test]
    async fn test_password_hash_verifies_only_the_same_password() {
        let hash = hash_password("correct horse".into()).await.unwrap();
        assert!(verify_password("correct horse".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong horse".into(), hash).await.unwrap());
    }
}
