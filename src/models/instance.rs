//! Book instance (physical copy) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Loan status of a physical copy.
///
/// Stored as the single-character code. There is no enforced transition
/// graph: any writer with catalog rights may set any of the four states,
/// matching the permissive behavior of the original system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[serde(rename = "m")]
    Maintenance,
    #[serde(rename = "o")]
    OnLoan,
    #[serde(rename = "a")]
    Available,
    #[serde(rename = "r")]
    Reserved,
}

impl LoanStatus {
    /// Return the single-character code for this status
    pub fn as_code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }
}

impl Default for LoanStatus {
    fn default() -> Self {
        LoanStatus::Maintenance
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    /// Codes outside {m, o, a, r} are invalid input, not a fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status code: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus (stored as CHAR(1))
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.trim().parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_code().to_string(), buf)
    }
}

/// A specific physical copy of a book, individually tracked.
///
/// The id is a random UUID, unique across the whole library. A copy is
/// owned by exactly one book for its lifetime (the book cannot be deleted
/// while copies exist); the borrower reference is cleared if the user is
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: i32,
    /// Publisher/edition information for this copy
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
    // Populated when queried with a join, None otherwise
    #[sqlx(default)]
    #[serde(default)]
    pub book_title: Option<String>,
}

impl BookInstance {
    /// A copy is overdue iff it has a due date strictly in the past.
    /// Copies without a due date are never overdue.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_back {
            Some(due) => due < today,
            None => false,
        }
    }
}

/// Instance query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct InstanceQuery {
    /// Filter by status code (m, o, a, r)
    pub status: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create instance request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInstance {
    pub book_id: i32,
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1-200 characters"))]
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    /// Defaults to maintenance when omitted
    pub status: Option<LoanStatus>,
}

/// Update instance request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateInstance {
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1-200 characters"))]
    pub imprint: Option<String>,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub status: Option<LoanStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn instance(due_back: Option<NaiveDate>) -> BookInstance {
        BookInstance {
            id: Uuid::new_v4(),
            book_id: 1,
            imprint: "Third edition".to_string(),
            due_back,
            borrower_id: None,
            status: LoanStatus::OnLoan,
            book_title: None,
        }
    }

    #[test]
    fn overdue_iff_due_date_strictly_past() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

        let yesterday = today.pred_opt().unwrap();
        assert!(instance(Some(yesterday)).is_overdue(today));

        let long_past = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(instance(Some(long_past)).is_overdue(today));

        assert!(!instance(Some(today)).is_overdue(today));

        let tomorrow = today.succ_opt().unwrap();
        assert!(!instance(Some(tomorrow)).is_overdue(today));
    }

    #[test]
    fn no_due_date_is_never_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert!(!instance(None).is_overdue(today));
    }

    #[test]
    fn status_codes_round_trip() {
        for (code, status) in [
            ("m", LoanStatus::Maintenance),
            ("o", LoanStatus::OnLoan),
            ("a", LoanStatus::Available),
            ("r", LoanStatus::Reserved),
        ] {
            assert_eq!(code.parse::<LoanStatus>().unwrap(), status);
            assert_eq!(status.as_code(), code);
        }
    }

    #[test]
    fn unknown_status_code_is_rejected() {
        assert!("x".parse::<LoanStatus>().is_err());
        assert!("".parse::<LoanStatus>().is_err());
        assert!("ma".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn default_status_is_maintenance() {
        assert_eq!(LoanStatus::default(), LoanStatus::Maintenance);
    }
}
