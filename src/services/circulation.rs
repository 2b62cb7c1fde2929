//! Borrowing workflow: overdue listings and loan renewal.
//!
//! Renewal is the one place in the system with a real business rule: a
//! proposed due date must lie between today and four weeks from today
//! (inclusive). The default proposal offered to librarians is three
//! weeks out.

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::instance::BookInstance,
    repository::Repository,
};

/// Default renewal proposal offered on the form
pub const RENEWAL_PROPOSAL_WEEKS: i64 = 3;
/// Upper bound of the allowed renewal window (inclusive)
pub const RENEWAL_WINDOW_WEEKS: i64 = 4;

/// The date pre-filled on an unsubmitted renewal form: three weeks out.
pub fn default_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(RENEWAL_PROPOSAL_WEEKS)
}

/// Validate a proposed renewal date against the allowed window.
///
/// Rejections are field-level errors on `due_back`: the date must not be
/// in the past and must not be more than four weeks ahead (the bound
/// itself, today + 28 days, is allowed).
pub fn validate_renewal_date(proposed: NaiveDate, today: NaiveDate) -> AppResult<()> {
    if proposed < today {
        return Err(AppError::field(
            "due_back",
            "Invalid date - renewal in past",
        ));
    }
    if proposed > today + Duration::weeks(RENEWAL_WINDOW_WEEKS) {
        return Err(AppError::field(
            "due_back",
            "Invalid date - renewal more than 4 weeks ahead",
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
}

impl CirculationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Instance state plus the default proposal for the renewal form
    pub async fn renewal_proposal(
        &self,
        instance_id: Uuid,
        today: NaiveDate,
    ) -> AppResult<(BookInstance, NaiveDate)> {
        let instance = self.repository.instances.get_by_id(instance_id).await?;
        Ok((instance, default_renewal_date(today)))
    }

    /// Renew a loan: validate the proposed date and persist it.
    /// Nothing is written when validation fails.
    pub async fn renew(
        &self,
        instance_id: Uuid,
        proposed: NaiveDate,
        today: NaiveDate,
    ) -> AppResult<BookInstance> {
        // Look up first so a missing instance surfaces as not-found
        // rather than a validation error.
        let instance = self.repository.instances.get_by_id(instance_id).await?;

        validate_renewal_date(proposed, today)?;

        self.repository
            .instances
            .set_due_back(instance.id, proposed)
            .await?;

        self.repository.instances.get_by_id(instance_id).await
    }

    /// Copies currently on loan to a user, due soonest first
    pub async fn borrowed_by(
        &self,
        user_id: i32,
        page: i64,
        per_page: i64,
    ) -> AppResult<(Vec<BookInstance>, i64)> {
        self.repository
            .instances
            .borrowed_by(user_id, page, per_page)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn renewal_in_past_is_rejected() {
        let yesterday = today().pred_opt().unwrap();
        let err = validate_renewal_date(yesterday, today()).unwrap_err();
        match err {
            AppError::FieldValidation { field, .. } => assert_eq!(field, "due_back"),
            other => panic!("expected field validation error, got {:?}", other),
        }
    }

    #[test]
    fn renewal_today_is_accepted() {
        assert!(validate_renewal_date(today(), today()).is_ok());
    }

    #[test]
    fn renewal_at_window_bound_is_accepted() {
        let bound = today() + Duration::days(28);
        assert!(validate_renewal_date(bound, today()).is_ok());
    }

    #[test]
    fn renewal_past_window_bound_is_rejected() {
        let past_bound = today() + Duration::days(29);
        let err = validate_renewal_date(past_bound, today()).unwrap_err();
        match err {
            AppError::FieldValidation { field, .. } => assert_eq!(field, "due_back"),
            other => panic!("expected field validation error, got {:?}", other),
        }
    }

    #[test]
    fn default_proposal_is_three_weeks_out() {
        assert_eq!(
            default_renewal_date(today()),
            today() + Duration::days(21)
        );
    }

    #[test]
    fn default_proposal_is_inside_the_window() {
        assert!(validate_renewal_date(default_renewal_date(today()), today()).is_ok());
    }
}
