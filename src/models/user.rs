//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// Account type slug (string identifier)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountTypeSlug {
    Reader,
    Librarian,
    Admin,
}

impl AccountTypeSlug {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountTypeSlug::Reader => "reader",
            AccountTypeSlug::Librarian => "librarian",
            AccountTypeSlug::Admin => "admin",
        }
    }

    /// Permission set granted to this account type
    pub fn permissions(&self) -> UserPermissions {
        match self {
            AccountTypeSlug::Reader => UserPermissions {
                can_mark_returned: false,
                manage_catalog: false,
            },
            AccountTypeSlug::Librarian | AccountTypeSlug::Admin => UserPermissions {
                can_mark_returned: true,
                manage_catalog: true,
            },
        }
    }
}

impl Default for AccountTypeSlug {
    fn default() -> Self {
        AccountTypeSlug::Reader
    }
}

impl std::fmt::Display for AccountTypeSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AccountTypeSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reader" => Ok(AccountTypeSlug::Reader),
            "librarian" => Ok(AccountTypeSlug::Librarian),
            "admin" => Ok(AccountTypeSlug::Admin),
            _ => Err(format!("Invalid account type slug: {}", s)),
        }
    }
}

// SQLx conversion for AccountTypeSlug
impl sqlx::Type<Postgres> for AccountTypeSlug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for AccountTypeSlug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for AccountTypeSlug {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub login: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub account_type: AccountTypeSlug,
    pub created_at: Option<DateTime<Utc>>,
}

/// Create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    /// Login (username), unique, used for authentication
    #[validate(length(min = 3, message = "Login must be at least 3 characters"))]
    pub login: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub account_type: Option<AccountTypeSlug>,
}

/// Permissions carried in the JWT claims.
///
/// `can_mark_returned` keeps its historical name from the original
/// permission even though it gates renewal rather than return.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct UserPermissions {
    pub can_mark_returned: bool,
    pub manage_catalog: bool,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub account_type: AccountTypeSlug,
    pub permissions: UserPermissions,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    // Authorization checks

    pub fn require_mark_returned(&self) -> Result<(), AppError> {
        if self.permissions.can_mark_returned {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Insufficient rights to renew loans".to_string(),
            ))
        }
    }

    pub fn require_manage_catalog(&self) -> Result<(), AppError> {
        if self.permissions.manage_catalog {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Insufficient rights to manage the catalog".to_string(),
            ))
        }
    }

    /// Check if user is admin (account_type = "admin")
    pub fn is_admin(&self) -> bool {
        self.account_type == AccountTypeSlug::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Administrator privileges required".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_for(account_type: AccountTypeSlug) -> UserClaims {
        UserClaims {
            sub: "test".to_string(),
            user_id: 7,
            account_type,
            permissions: account_type.permissions(),
            exp: 4_000_000_000,
            iat: 0,
        }
    }

    #[test]
    fn token_round_trip() {
        let claims = claims_for(AccountTypeSlug::Librarian);
        let token = claims.create_token("secret").unwrap();
        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, 7);
        assert_eq!(parsed.account_type, AccountTypeSlug::Librarian);
        assert!(parsed.permissions.can_mark_returned);
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let claims = claims_for(AccountTypeSlug::Reader);
        let token = claims.create_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn reader_cannot_renew_or_manage() {
        let claims = claims_for(AccountTypeSlug::Reader);
        assert!(claims.require_mark_returned().is_err());
        assert!(claims.require_manage_catalog().is_err());
    }

    #[test]
    fn librarian_holds_both_permissions() {
        let claims = claims_for(AccountTypeSlug::Librarian);
        assert!(claims.require_mark_returned().is_ok());
        assert!(claims.require_manage_catalog().is_ok());
    }
}
