//! Authentication service: login, token issuance, user management

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::rngs::OsRng;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Verify credentials and issue a JWT
    pub async fn login(&self, login: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_login(login)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Authentication("Invalid credentials".to_string()))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::Authentication("Invalid credentials".to_string()))?;

        let now = Utc::now();
        let claims = UserClaims {
            sub: user.login.clone(),
            user_id: user.id,
            account_type: user.account_type,
            permissions: user.account_type.permissions(),
            exp: (now + chrono::Duration::hours(self.config.jwt_expiration_hours as i64))
                .timestamp(),
            iat: now.timestamp(),
        };

        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok((token, user))
    }

    /// Current user for the given claims
    pub async fn me(&self, user_id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(user_id).await
    }

    /// Create a user with a hashed password (admin operation)
    pub async fn create_user(&self, request: CreateUser) -> AppResult<User> {
        request.validate()?;

        if self.repository.users.login_exists(&request.login).await? {
            return Err(AppError::Conflict(format!(
                "Login {} already exists",
                request.login
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(request.password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?
            .to_string();

        self.repository
            .users
            .create(
                &request.login,
                &password_hash,
                request.firstname.as_deref(),
                request.lastname.as_deref(),
                request.email.as_deref(),
                request.account_type.unwrap_or_default(),
            )
            .await
    }
}
